use async_trait::async_trait;

use super::GatewaySnapshot;
use crate::error::DomainError;

/// Durable storage for gateway snapshots.
///
/// `load` returns `Ok(None)` when nothing has been saved yet. `save` must
/// either fully replace the stored snapshot or leave the previous one intact.
#[async_trait]
pub trait SnapshotRepository: Send + Sync {
    async fn load(&self) -> Result<Option<GatewaySnapshot>, DomainError>;
    async fn save(&self, snapshot: &GatewaySnapshot) -> Result<(), DomainError>;
}
