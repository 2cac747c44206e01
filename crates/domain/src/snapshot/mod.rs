mod observer;
mod projection;
mod repository;

pub use observer::SnapshotObserver;
pub use repository::SnapshotRepository;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::output::{CHANNEL_COUNT, OutputChannel, OutputState};
use crate::reading::{DeviceKind, Reading};
use crate::status::DeviceStatus;

/// Point-in-time, copy-consistent view of the gateway.
///
/// Every field reflects the same commit: readers never see readings from two
/// different poll cycles side by side. This is also the unit persisted to
/// durable storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewaySnapshot {
    /// Number of poll cycles committed since startup
    pub cycle: u64,
    pub taken_at: DateTime<Utc>,
    /// One entry per registered device
    pub devices: BTreeMap<DeviceKind, DeviceStatus>,
    pub outputs: [OutputState; CHANNEL_COUNT],
}

impl GatewaySnapshot {
    /// Latest known reading of a device (carried forward across failed polls)
    pub fn reading(&self, kind: DeviceKind) -> Option<&Reading> {
        self.devices
            .get(&kind)
            .and_then(|status| status.last_reading.as_ref())
    }

    pub fn readings(&self) -> impl Iterator<Item = (DeviceKind, &Reading)> {
        self.devices
            .iter()
            .filter_map(|(kind, status)| status.last_reading.as_ref().map(|r| (*kind, r)))
    }

    pub fn status(&self, kind: DeviceKind) -> Option<&DeviceStatus> {
        self.devices.get(&kind)
    }

    pub fn output(&self, channel: OutputChannel) -> &OutputState {
        &self.outputs[channel.index()]
    }

    /// Flat field map in the shape the dashboard consumes
    pub fn sensor_fields(&self) -> serde_json::Map<String, serde_json::Value> {
        projection::sensor_fields(self)
    }
}
