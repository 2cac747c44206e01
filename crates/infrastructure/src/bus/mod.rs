//! The shared serial bus.
//!
//! [`Bus`] owns a [`RegisterLink`] behind an async mutex so that exactly one
//! request/response exchange is on the wire at any time, and enforces the
//! per-exchange deadline. Links only move registers; they never interpret them.

mod modbus;
mod simulator;

pub use modbus::ModbusRtuLink;
pub use simulator::SimulatorLink;

use std::time::Duration;

use async_trait::async_trait;
use domain::{BusTransport, DomainError, ReadRequest};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Raw access to a physical or simulated medium
#[async_trait]
pub trait RegisterLink: Send {
    async fn read(&mut self, address: u8, request: &ReadRequest) -> Result<Vec<u16>, DomainError>;

    /// Discard any partially completed exchange, e.g. after a deadline expired
    fn reset(&mut self);

    fn describe(&self) -> String;
}

pub struct Bus<L> {
    link: Mutex<L>,
}

impl<L: RegisterLink> Bus<L> {
    pub fn new(link: L) -> Self {
        Self {
            link: Mutex::new(link),
        }
    }
}

#[async_trait]
impl<L: RegisterLink> BusTransport for Bus<L> {
    async fn exchange(
        &self,
        address: u8,
        request: &ReadRequest,
        timeout: Duration,
    ) -> Result<Vec<u16>, DomainError> {
        // Held for the whole exchange: the medium is half-duplex.
        let mut link = self.link.lock().await;

        debug!(
            address,
            bank = request.bank.as_str(),
            start = request.start,
            count = request.count,
            link = %link.describe(),
            "Bus exchange"
        );

        let outcome = tokio::time::timeout(timeout, link.read(address, request)).await;
        match outcome {
            Ok(result) => {
                if let Err(DomainError::Transport(_)) = &result {
                    link.reset();
                }
                result
            }
            Err(_) => {
                warn!(address, timeout_ms = %timeout.as_millis(), "Bus exchange timed out");
                link.reset();
                Err(DomainError::Timeout {
                    address,
                    timeout_ms: timeout.as_millis() as u64,
                })
            }
        }
    }
}
