use async_trait::async_trait;

use super::GatewaySnapshot;

/// Notified after every poll commit, once the snapshot has been persisted.
#[async_trait]
pub trait SnapshotObserver: Send + Sync {
    fn name(&self) -> &str;

    async fn on_commit(
        &self,
        snapshot: &GatewaySnapshot,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}
