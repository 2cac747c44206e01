use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use domain::{
    CHANNEL_COUNT, DeviceKind, DeviceStatus, DomainError, GatewaySnapshot, OutputChannel,
    OutputState, Reading,
};
use tracing::{debug, warn};

/// Authoritative in-memory state of the gateway.
///
/// Holds one [`GatewaySnapshot`] behind a single lock. Writers replace whole
/// cycles or single outputs atomically; readers get a clone and never wait on
/// bus I/O, only on the (short) commit itself.
pub struct StateStore {
    state: RwLock<GatewaySnapshot>,
}

impl StateStore {
    /// `devices` are the registered kinds with their bus addresses; readings
    /// for any other kind are rejected at commit.
    pub fn new(
        devices: impl IntoIterator<Item = (DeviceKind, u8)>,
        outputs: [OutputState; CHANNEL_COUNT],
    ) -> Self {
        let devices: BTreeMap<_, _> = devices
            .into_iter()
            .map(|(kind, address)| (kind, DeviceStatus::new(kind, address)))
            .collect();

        Self {
            state: RwLock::new(GatewaySnapshot {
                cycle: 0,
                taken_at: Utc::now(),
                devices,
                outputs,
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, GatewaySnapshot> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, GatewaySnapshot> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Consistent copy of the current state
    pub fn read_snapshot(&self) -> GatewaySnapshot {
        self.read().clone()
    }

    pub fn is_registered(&self, kind: DeviceKind) -> bool {
        self.read().devices.contains_key(&kind)
    }

    /// Commit the outcome of one poll cycle and return the committed snapshot.
    ///
    /// Successful devices get their reading replaced; failed devices keep
    /// their last reading and have their failure counter bumped by one.
    /// Devices absent from both maps are left as they were.
    pub fn apply_readings(
        &self,
        readings: HashMap<DeviceKind, Reading>,
        errors: HashMap<DeviceKind, DomainError>,
    ) -> GatewaySnapshot {
        let now = Utc::now();
        let mut state = self.write();

        for (kind, reading) in readings {
            match state.devices.get_mut(&kind) {
                Some(status) => status.record_success(reading),
                None => warn!(device = %kind, "Dropping reading from unregistered device"),
            }
        }
        for (kind, error) in errors {
            match state.devices.get_mut(&kind) {
                Some(status) => status.record_failure(&error, now),
                None => warn!(device = %kind, error = %error, "Dropping error from unregistered device"),
            }
        }

        state.cycle += 1;
        state.taken_at = now;
        debug!(cycle = state.cycle, "Cycle committed");
        state.clone()
    }

    /// Record an output state without touching the hardware
    pub fn apply_output(
        &self,
        channel: OutputChannel,
        energized: bool,
    ) -> Result<OutputState, DomainError> {
        self.update_output(channel, |_| Ok(energized))
    }

    /// Compute and record a new output state under the write lock.
    ///
    /// `change` sees the current state and returns the new `energized`
    /// value; it may perform the hardware side effect. If it fails nothing
    /// is recorded.
    pub fn update_output<F>(
        &self,
        channel: OutputChannel,
        change: F,
    ) -> Result<OutputState, DomainError>
    where
        F: FnOnce(&OutputState) -> Result<bool, DomainError>,
    {
        let mut state = self.write();
        let output = &mut state.outputs[channel.index()];
        output.energized = change(output)?;
        Ok(output.clone())
    }

    /// Seed state from a persisted snapshot.
    ///
    /// Only statuses of currently registered kinds are taken over (addresses
    /// come from the current configuration); output pins and names also stay
    /// as configured, only the energized flags are restored.
    pub fn restore(&self, saved: GatewaySnapshot) {
        let mut state = self.write();

        for (kind, saved_status) in saved.devices {
            match state.devices.get_mut(&kind) {
                Some(status) => {
                    let address = status.address;
                    *status = DeviceStatus {
                        address,
                        ..saved_status
                    };
                }
                None => debug!(device = %kind, "Ignoring saved status of unregistered device"),
            }
        }
        for (output, saved_output) in state.outputs.iter_mut().zip(saved.outputs) {
            output.energized = saved_output.energized;
        }
        state.cycle = saved.cycle;
        state.taken_at = saved.taken_at;
    }
}
