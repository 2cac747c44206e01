use anyhow::{Context, Result, anyhow};
use clap::Parser;
use dotenv::dotenv;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use application::{
    AlarmMonitor, ControlListener, OutputBank, PollScheduler, RelayAutomation, SnapshotPersister,
    StateStore,
};
use domain::{
    BusTransport, CHANNEL_COUNT, OutputChannel, OutputPins, OutputState, SnapshotRepository,
};
use gateway::{AppState, create_router};
use infrastructure::bus::{Bus, ModbusRtuLink, SimulatorLink};
use infrastructure::config::GatewayConfig;
use infrastructure::drivers::DriverFactory;
use infrastructure::gpio::MemoryPins;
use infrastructure::{JsonFileRepository, MqttAlarmPublisher, MqttClient, MqttSnapshotPublisher};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to config directory
    #[arg(long, default_value = "config")]
    config_dir: String,

    /// Override HTTP bind address
    #[arg(long)]
    bind: Option<String>,

    /// Answer from the built-in device simulator instead of the serial bus
    #[arg(long)]
    simulate: bool,

    /// Override polling period
    #[arg(long)]
    interval_secs: Option<u64>,
}

fn output_states(config: &GatewayConfig) -> Result<[OutputState; CHANNEL_COUNT]> {
    let states = config
        .outputs
        .iter()
        .enumerate()
        .map(|(i, output)| {
            OutputChannel::new(i).map(|channel| OutputState::new(channel, output.pin, output.name.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    states
        .try_into()
        .map_err(|v: Vec<_>| anyhow!("expected {} outputs, found {}", CHANNEL_COUNT, v.len()))
}

fn open_bus(config: &GatewayConfig) -> Result<Arc<dyn BusTransport>> {
    if config.bus.simulate {
        let devices = config.devices.iter().map(|d| (d.address(), d.kind()));
        info!("🧪 Using simulated bus");
        return Ok(Arc::new(Bus::new(SimulatorLink::new(devices))));
    }

    let link = ModbusRtuLink::new(config.bus.clone()).context("Invalid serial bus settings")?;
    info!(port = %config.bus.port, baud = config.bus.baud_rate, "🔌 Using Modbus RTU bus");
    Ok(Arc::new(Bus::new(link)))
}

#[cfg(feature = "rpi")]
fn open_pins(config: &GatewayConfig) -> Result<Box<dyn OutputPins>> {
    if config.bus.simulate {
        return Ok(Box::new(MemoryPins::new()));
    }
    let pins = infrastructure::gpio::RppalPins::new()?;
    Ok(Box::new(pins))
}

#[cfg(not(feature = "rpi"))]
fn open_pins(_config: &GatewayConfig) -> Result<Box<dyn OutputPins>> {
    warn!("Built without GPIO support, relay states are kept in memory only");
    Ok(Box::new(MemoryPins::new()))
}

async fn run() -> Result<()> {
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,gateway=debug,application=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("📡 Field Gateway Starting...");
    info!("🆔 Process ID: {}", std::process::id());

    let args = Args::parse();

    // 1. Load Configuration
    info!(dir = %args.config_dir, "Loading configuration...");
    let mut config = GatewayConfig::load(&args.config_dir)?;

    if let Some(bind) = args.bind {
        config.http.bind = bind;
    }
    if args.simulate {
        config.bus.simulate = true;
    }
    if let Some(secs) = args.interval_secs {
        config.polling.interval_secs = secs;
    }
    config.validate()?;
    info!(
        gateway = %config.gateway_name,
        devices = config.devices.len(),
        interval_secs = config.polling.interval_secs,
        "✅ Configuration loaded"
    );

    // 2. State & persistence
    let store = Arc::new(StateStore::new(
        config.devices.iter().map(|d| (d.kind(), d.address())),
        output_states(&config)?,
    ));
    let repository = Arc::new(JsonFileRepository::new(&config.persistence.path));
    match repository.load().await {
        Ok(Some(saved)) => {
            info!(cycle = saved.cycle, path = %config.persistence.path, "💾 Restored saved state");
            store.restore(saved);
        }
        Ok(None) => {}
        Err(e) => warn!(error = %e, "Ignoring unreadable saved state, starting fresh"),
    }
    let persister = Arc::new(SnapshotPersister::new(store.clone(), repository));

    // 3. Outputs
    let mut active_low = [false; CHANNEL_COUNT];
    for (flag, output) in active_low.iter_mut().zip(&config.outputs) {
        *flag = output.active_low;
    }
    let outputs = Arc::new(OutputBank::new(
        persister.clone(),
        open_pins(&config)?,
        active_low,
    ));
    if let Err(e) = outputs.sync_pins() {
        warn!(error = %e, "Some outputs could not be restored");
    }

    // 4. Broker
    let cancel = CancellationToken::new();
    let mut alarms = AlarmMonitor::new(config.alarms.clone());
    let mut mqtt = None;

    if config.mqtt.enabled {
        info!(host = %config.mqtt.host, port = %config.mqtt.port, "Connecting to MQTT Broker...");
        let client_id = format!("gateway-{}", config.gateway_name);
        let status_topic = format!("{}/status", config.mqtt.topic);

        // Last Will
        let last_will = rumqttc::LastWill::new(
            &status_topic,
            "offline",
            rumqttc::QoS::AtLeastOnce,
            true,
        );
        let mqtt_client = MqttClient::new(&config.mqtt, &client_id, Some(last_will)).await?;
        if let Err(e) = mqtt_client.publish(&status_topic, "online", true).await {
            warn!("Failed to publish online status: {}", e);
        }
        alarms = alarms.with_publisher(Arc::new(MqttAlarmPublisher::new(
            mqtt_client.clone(),
            &config.mqtt.topic,
        )));

        let control = ControlListener::new(mqtt_client.clone(), &config.mqtt.topic, outputs.clone());
        let control_cancel = cancel.clone();
        tokio::spawn(async move { control.run(control_cancel).await });

        mqtt = Some(mqtt_client);
    }

    // 5. Bus, drivers and observers
    let bus = open_bus(&config)?;
    let drivers = DriverFactory::create_drivers(&config.devices, config.bus_timeout());
    let alarms = Arc::new(alarms);

    let mut scheduler = PollScheduler::new(drivers, bus, persister.clone(), config.poll_interval())
        .with_observer(alarms.clone());

    if !config.automation.is_empty() {
        scheduler = scheduler.with_observer(Arc::new(RelayAutomation::new(
            config.automation.clone(),
            outputs.clone(),
        )));
    }
    if let Some(mqtt_client) = mqtt {
        scheduler = scheduler.with_observer(Arc::new(MqttSnapshotPublisher::new(
            mqtt_client,
            config.mqtt.topic.clone(),
        )));
    }

    let scheduler = Arc::new(scheduler);

    let scheduler_handle = {
        let scheduler = scheduler.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { scheduler.run(cancel).await })
    };

    // 6. HTTP
    let app_state = Arc::new(AppState {
        settings: config.redacted(),
        store,
        persister,
        outputs,
        alarms,
        scheduler: scheduler.handle(),
    });
    let app = create_router(app_state);
    let listener = tokio::net::TcpListener::bind(&config.http.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.http.bind))?;
    info!("🚀 HTTP listening on {}", config.http.bind);

    let server_cancel = cancel.clone();
    let server_handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { server_cancel.cancelled().await })
            .await
    });

    // 7. Shutdown Signal
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("🛑 Shutting down..."),
        Err(err) => warn!(error = %err, "Unable to listen for shutdown signal"),
    }
    cancel.cancel();

    scheduler_handle.await?;
    server_handle.await??;

    info!("👋 Good bye!");
    Ok(())
}

fn main() {
    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("❌ Failed to start runtime: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = rt.block_on(run()) {
        eprintln!("\n❌ CRITICAL ERROR: {:?}", e);
        std::process::exit(1);
    }
}
