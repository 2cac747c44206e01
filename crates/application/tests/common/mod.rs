#![allow(dead_code)]

use application::{OutputBank, PollScheduler, SnapshotPersister, StateStore};
use async_trait::async_trait;
use domain::{
    CHANNEL_COUNT, DomainError, GatewaySnapshot, OutputChannel, OutputPins, OutputState,
    ReadRequest, SnapshotObserver, SnapshotRepository,
};
use infrastructure::bus::{Bus, RegisterLink};
use infrastructure::config::DeviceConfig;
use infrastructure::drivers::DriverFactory;
use std::collections::HashMap;
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};
use std::time::Duration;

pub const BUS_TIMEOUT: Duration = Duration::from_secs(2);

// --- Scripted bus link ---

#[derive(Clone, Debug)]
pub enum Script {
    Respond(Vec<u16>),
    /// Answer after a delay
    Slow(Duration, Vec<u16>),
    /// Never answer
    Hang,
}

/// Register link whose answers are keyed by (address, start register) and
/// can be changed between cycles through a cloned handle.
#[derive(Clone, Default)]
pub struct ScriptedLink {
    scripts: Arc<Mutex<HashMap<(u8, u16), Script>>>,
}

impl ScriptedLink {
    pub fn script(&self, address: u8, start: u16, script: Script) {
        self.scripts.lock().unwrap().insert((address, start), script);
    }
}

#[async_trait]
impl RegisterLink for ScriptedLink {
    async fn read(&mut self, address: u8, request: &ReadRequest) -> Result<Vec<u16>, DomainError> {
        let script = self
            .scripts
            .lock()
            .unwrap()
            .get(&(address, request.start))
            .cloned();

        match script {
            Some(Script::Respond(words)) => Ok(words),
            Some(Script::Slow(delay, words)) => {
                tokio::time::sleep(delay).await;
                Ok(words)
            }
            Some(Script::Hang) => std::future::pending().await,
            None => Err(DomainError::Transport(format!("no device at {}", address))),
        }
    }

    fn reset(&mut self) {}

    fn describe(&self) -> String {
        "scripted".to_string()
    }
}

// --- Repository fake ---

#[derive(Default)]
pub struct MemoryRepository {
    pub saved: Mutex<Vec<GatewaySnapshot>>,
    pub fail: AtomicBool,
}

#[async_trait]
impl SnapshotRepository for MemoryRepository {
    async fn load(&self) -> Result<Option<GatewaySnapshot>, DomainError> {
        Ok(self.saved.lock().unwrap().last().cloned())
    }

    async fn save(&self, snapshot: &GatewaySnapshot) -> Result<(), DomainError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(DomainError::PersistenceFailure("disk full".into()));
        }
        self.saved.lock().unwrap().push(snapshot.clone());
        Ok(())
    }
}

// --- Observer fake ---

#[derive(Default)]
pub struct RecordingObserver {
    pub cycles: Mutex<Vec<u64>>,
}

#[async_trait]
impl SnapshotObserver for RecordingObserver {
    fn name(&self) -> &str {
        "recorder"
    }

    async fn on_commit(
        &self,
        snapshot: &GatewaySnapshot,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.cycles.lock().unwrap().push(snapshot.cycle);
        Ok(())
    }
}

// --- Pins fake ---

#[derive(Clone, Default)]
pub struct RecordingPins {
    pub levels: Arc<Mutex<HashMap<u32, bool>>>,
}

impl OutputPins for RecordingPins {
    fn drive(&mut self, pin: u32, high: bool) -> Result<(), DomainError> {
        self.levels.lock().unwrap().insert(pin, high);
        Ok(())
    }
}

pub fn outputs() -> [OutputState; CHANNEL_COUNT] {
    std::array::from_fn(|i| OutputState::new(OutputChannel::new(i).unwrap(), 10 + i as u32, None))
}

pub fn light_config(dark_below_lux: u32) -> DeviceConfig {
    DeviceConfig::Light {
        address: 1,
        dark_below_lux,
        timeout_ms: None,
    }
}

/// Registers word pair for a lux value
pub fn lux_words(lux: u32) -> Vec<u16> {
    vec![(lux >> 16) as u16, lux as u16]
}

pub struct Harness {
    pub link: ScriptedLink,
    pub store: Arc<StateStore>,
    pub repository: Arc<MemoryRepository>,
    pub persister: Arc<SnapshotPersister>,
    pub pins: RecordingPins,
    pub outputs: Arc<OutputBank>,
}

impl Harness {
    pub fn new(devices: &[DeviceConfig]) -> Self {
        let store = Arc::new(StateStore::new(
            devices.iter().map(|d| (d.kind(), d.address())),
            outputs(),
        ));
        let repository = Arc::new(MemoryRepository::default());
        let persister = Arc::new(SnapshotPersister::new(store.clone(), repository.clone()));
        let pins = RecordingPins::default();
        let outputs = Arc::new(OutputBank::new(
            persister.clone(),
            Box::new(pins.clone()),
            [false; CHANNEL_COUNT],
        ));
        Self {
            link: ScriptedLink::default(),
            store,
            repository,
            persister,
            pins,
            outputs,
        }
    }

    pub fn scheduler(&self, devices: &[DeviceConfig], period: Duration) -> PollScheduler {
        PollScheduler::new(
            DriverFactory::create_drivers(devices, BUS_TIMEOUT),
            Arc::new(Bus::new(self.link.clone())),
            self.persister.clone(),
            period,
        )
    }
}
