use std::time::Duration;

use async_trait::async_trait;

use super::ReadRequest;
use crate::error::DomainError;

/// The shared, half-duplex field bus.
///
/// Implementations must allow only one exchange in flight at a time and must
/// treat `timeout` as a hard deadline, returning [`DomainError::Timeout`]
/// without retrying when it expires.
#[async_trait]
pub trait BusTransport: Send + Sync {
    /// Send `request` to the device at `address` and return the raw register words.
    async fn exchange(
        &self,
        address: u8,
        request: &ReadRequest,
        timeout: Duration,
    ) -> Result<Vec<u16>, DomainError>;
}
