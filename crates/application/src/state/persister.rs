use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use domain::{DomainError, GatewaySnapshot, SnapshotRepository};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::StateStore;

/// Flushes the state store to durable storage.
///
/// Poll commits and output commands both flush through here. Saves are
/// serialised and each one writes the snapshot current when it gets its
/// turn, so an older snapshot never overwrites a newer one.
pub struct SnapshotPersister {
    store: Arc<StateStore>,
    repository: Arc<dyn SnapshotRepository>,
    gate: Mutex<()>,
    failures: AtomicU64,
}

impl SnapshotPersister {
    pub fn new(store: Arc<StateStore>, repository: Arc<dyn SnapshotRepository>) -> Self {
        Self {
            store,
            repository,
            gate: Mutex::new(()),
            failures: AtomicU64::new(0),
        }
    }

    pub fn store(&self) -> &Arc<StateStore> {
        &self.store
    }

    /// Save the current snapshot and return what was written.
    ///
    /// Failures are logged and counted; the in-memory state is never rolled back.
    pub async fn flush(&self) -> Result<GatewaySnapshot, DomainError> {
        let _turn = self.gate.lock().await;
        let snapshot = self.store.read_snapshot();

        match self.repository.save(&snapshot).await {
            Ok(()) => {
                debug!(cycle = snapshot.cycle, "Snapshot persisted");
                Ok(snapshot)
            }
            Err(e) => {
                warn!(cycle = snapshot.cycle, error = %e, "Failed to persist snapshot");
                self.failures.fetch_add(1, Ordering::Relaxed);
                Err(e)
            }
        }
    }

    /// Failed saves since startup, from any caller
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }
}
