use application::{AlarmMonitor, OutputBank, PollScheduler, SnapshotPersister, StateStore};
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use domain::{
    AlarmThresholds, CHANNEL_COUNT, DeviceKind, DomainError, OutputChannel, OutputState,
    SnapshotRepository,
};
use gateway::{AppState, create_router};
use infrastructure::bus::{Bus, SimulatorLink};
use infrastructure::config::{DeviceConfig, GatewayConfig};
use infrastructure::drivers::DriverFactory;
use infrastructure::{JsonFileRepository, MemoryPins};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

struct TestGateway {
    state: Arc<AppState>,
    scheduler: PollScheduler,
    pins: MemoryPins,
    repository: Arc<JsonFileRepository>,
}

fn gateway() -> TestGateway {
    let devices = vec![
        DeviceConfig::Light {
            address: 1,
            dark_below_lux: 100,
            timeout_ms: None,
        },
        DeviceConfig::default_for(DeviceKind::Motion),
    ];
    let outputs: [OutputState; CHANNEL_COUNT] = std::array::from_fn(|i| {
        OutputState::new(OutputChannel::new(i).unwrap(), 5 + i as u32, None)
    });
    let store = Arc::new(StateStore::new(
        devices.iter().map(|d| (d.kind(), d.address())),
        outputs,
    ));

    let path = std::env::temp_dir().join(format!("gateway-api-{}.json", uuid::Uuid::new_v4()));
    let repository = Arc::new(JsonFileRepository::new(path));
    let persister = Arc::new(SnapshotPersister::new(store.clone(), repository.clone()));

    let pins = MemoryPins::new();
    let bank = Arc::new(OutputBank::new(
        persister.clone(),
        Box::new(pins.clone()),
        [false; CHANNEL_COUNT],
    ));

    let bus = Bus::new(SimulatorLink::new(
        devices.iter().map(|d| (d.address(), d.kind())),
    ));
    let alarms = Arc::new(AlarmMonitor::new(AlarmThresholds::default()));
    let scheduler = PollScheduler::new(
        DriverFactory::create_drivers(&devices, Duration::from_secs(1)),
        Arc::new(bus),
        persister.clone(),
        Duration::from_secs(10),
    )
    .with_observer(alarms.clone());

    let mut settings = GatewayConfig::default();
    settings.gateway_name = "test-gateway".to_string();
    settings.mqtt.password = Some("secret".to_string());

    let state = Arc::new(AppState {
        settings: settings.redacted(),
        store,
        persister,
        outputs: bank,
        alarms,
        scheduler: scheduler.handle(),
    });

    TestGateway {
        state,
        scheduler,
        pins,
        repository,
    }
}

async fn call(
    state: &Arc<AppState>,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            request = request.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = create_router(state.clone())
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

#[tokio::test]
async fn toggle_returns_new_state_and_drives_pin() {
    let gw = gateway();

    let (status, body) = call(&gw.state, "POST", "/relay/3/toggle", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "channel": 3, "state": true }));
    assert_eq!(gw.pins.level(8), Some(true));

    let (_, relays) = call(&gw.state, "GET", "/relays", None).await;
    let energized: Vec<bool> = relays
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["energized"].as_bool().unwrap())
        .collect();
    assert_eq!(energized, vec![false, false, false, true, false, false, false, false]);

    // Written through before the response
    let persisted = gw.repository.load().await.unwrap().unwrap();
    assert!(persisted.outputs[3].energized);
}

#[tokio::test]
async fn set_relay_with_json_body() {
    let gw = gateway();

    let (status, body) = call(&gw.state, "POST", "/relay/6", Some(json!({ "state": true }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["channel"], 6);
    assert_eq!(body["energized"], true);
}

#[tokio::test]
async fn invalid_channel_is_a_bad_request_and_changes_nothing() {
    let gw = gateway();
    let before = gw.state.store.read_snapshot();

    let (status, body) = call(&gw.state, "POST", "/relay/8/toggle", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], DomainError::InvalidChannel(8).to_string());

    let (status, _) = call(&gw.state, "POST", "/relay/42", Some(json!({ "state": true }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(gw.state.store.read_snapshot(), before);
}

#[tokio::test]
async fn pin_failure_is_a_server_error() {
    let gw = gateway();
    gw.pins.fail_pin(5);

    let (status, body) = call(&gw.state, "POST", "/relay/0/toggle", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("pin 5"));
    assert!(!gw.state.outputs.get(0).unwrap());
}

#[tokio::test]
async fn sensors_and_devices_reflect_the_last_commit() {
    let gw = gateway();
    gw.scheduler.run_cycle().await;

    let (status, sensors) = call(&gw.state, "GET", "/sensors", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(sensors["ldr_lux"].is_u64());
    assert!(sensors["motion_detected"].is_boolean());

    let (_, devices) = call(&gw.state, "GET", "/devices", None).await;
    let devices = devices.as_array().unwrap();
    assert_eq!(devices.len(), 2);
    assert!(devices.iter().all(|d| d["health"] == "online"));

    let (_, snapshot) = call(&gw.state, "GET", "/snapshot", None).await;
    assert_eq!(snapshot["cycle"], 1);
}

#[tokio::test]
async fn health_reports_scheduler_progress() {
    let gw = gateway();
    gw.scheduler.run_cycle().await;

    let (status, health) = call(&gw.state, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["gateway"], "test-gateway");
    assert_eq!(health["phase"], "idle");
    assert_eq!(health["stats"]["cycles"], 1);
    assert_eq!(health["devices_online"], 2);
    assert_eq!(health["persistence_failures"], 0);
}

#[tokio::test]
async fn alarm_endpoints() {
    let gw = gateway();

    let (status, active) = call(&gw.state, "GET", "/alarms", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(active, json!([]));

    let (_, history) = call(&gw.state, "GET", "/alarms/history?limit=5", None).await;
    assert_eq!(history, json!([]));

    let (status, cleared) = call(&gw.state, "POST", "/alarms/clear?sensor=co2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cleared["cleared"], 0);
}

#[tokio::test]
async fn settings_show_effective_configuration_without_secrets() {
    let gw = gateway();

    let (status, settings) = call(&gw.state, "GET", "/settings", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(settings["gateway_name"], "test-gateway");
    assert_eq!(settings["polling"]["interval_secs"], 10);
    assert_eq!(settings["outputs"].as_array().unwrap().len(), CHANNEL_COUNT);
    assert_eq!(settings["mqtt"]["password"], "********");
}
