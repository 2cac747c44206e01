use std::sync::Arc;

use application::{AlarmMonitor, OutputBank, SchedulerHandle, SnapshotPersister, StateStore};
use infrastructure::config::GatewayConfig;

/// Shared handles the HTTP handlers work with
pub struct AppState {
    /// Effective configuration with secrets removed
    pub settings: GatewayConfig,
    pub store: Arc<StateStore>,
    pub persister: Arc<SnapshotPersister>,
    pub outputs: Arc<OutputBank>,
    pub alarms: Arc<AlarmMonitor>,
    pub scheduler: SchedulerHandle,
}
