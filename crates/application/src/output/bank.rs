use std::sync::{Arc, Mutex, PoisonError};

use domain::{CHANNEL_COUNT, DomainError, OutputChannel, OutputPins, OutputState};
use tracing::{error, info};

use crate::state::{SnapshotPersister, StateStore};

/// The eight relay outputs.
///
/// Every mutation drives the pin and records the new state inside the state
/// store's write lock, so a reader never observes a recorded state that the
/// hardware does not have yet. When the pin cannot be driven the recorded
/// state stays as it was. Accepted changes are flushed to durable storage
/// before the call returns; a failed flush is logged but does not undo them.
pub struct OutputBank {
    store: Arc<StateStore>,
    persister: Arc<SnapshotPersister>,
    pins: Mutex<Box<dyn OutputPins>>,
    active_low: [bool; CHANNEL_COUNT],
}

impl OutputBank {
    pub fn new(
        persister: Arc<SnapshotPersister>,
        pins: Box<dyn OutputPins>,
        active_low: [bool; CHANNEL_COUNT],
    ) -> Self {
        Self {
            store: persister.store().clone(),
            persister,
            pins: Mutex::new(pins),
            active_low,
        }
    }

    pub fn get(&self, index: usize) -> Result<bool, DomainError> {
        let channel = OutputChannel::new(index)?;
        Ok(self.store.read_snapshot().output(channel).energized)
    }

    pub fn states(&self) -> Vec<OutputState> {
        self.store.read_snapshot().outputs.to_vec()
    }

    /// Setting the current value still drives the pin
    pub async fn set(&self, index: usize, energized: bool) -> Result<OutputState, DomainError> {
        let channel = OutputChannel::new(index)?;
        let state = self
            .store
            .update_output(channel, |current| {
                self.drive(current, energized)?;
                Ok(energized)
            })
            .inspect_err(|e| error!(channel = index, error = %e, "Failed to set output"))?;

        info!(channel = index, name = ?state.name, energized, "Output set");
        self.flush().await;
        Ok(state)
    }

    /// Invert the channel and return its new state
    pub async fn toggle(&self, index: usize) -> Result<bool, DomainError> {
        let channel = OutputChannel::new(index)?;
        let state = self
            .store
            .update_output(channel, |current| {
                let energized = !current.energized;
                self.drive(current, energized)?;
                Ok(energized)
            })
            .inspect_err(|e| error!(channel = index, error = %e, "Failed to toggle output"))?;

        info!(channel = index, name = ?state.name, energized = state.energized, "Output toggled");
        self.flush().await;
        Ok(state.energized)
    }

    // Already logged and counted by the persister
    async fn flush(&self) {
        let _ = self.persister.flush().await;
    }

    /// Drive every pin to its recorded state, e.g. after a restore.
    ///
    /// All channels are attempted; the first failure is returned.
    pub fn sync_pins(&self) -> Result<(), DomainError> {
        let mut first_error = None;
        for channel in OutputChannel::all() {
            let result = self.store.update_output(channel, |current| {
                self.drive(current, current.energized)?;
                Ok(current.energized)
            });
            if let Err(e) = result {
                error!(channel = channel.index(), error = %e, "Failed to sync output pin");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn drive(&self, output: &OutputState, energized: bool) -> Result<(), DomainError> {
        let high = energized != self.active_low[output.channel.index()];
        self.pins
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drive(output.pin, high)
    }
}
