use std::time::Duration;

use domain::{BusTransport, DomainError, MotionValues, ReadRequest};

use super::registers::expect_len;

/// PIR presence detector
#[derive(Debug, Clone)]
pub struct MotionDriver {
    address: u8,
    timeout: Duration,
}

impl MotionDriver {
    pub const REQUEST: ReadRequest = ReadRequest::holding(0x0006, 1);

    pub fn new(address: u8, timeout: Duration) -> Self {
        Self { address, timeout }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub async fn poll(&self, bus: &dyn BusTransport) -> Result<MotionValues, DomainError> {
        let words = bus
            .exchange(self.address, &Self::REQUEST, self.timeout)
            .await?;
        self.decode(&words)
    }

    pub fn decode(&self, words: &[u16]) -> Result<MotionValues, DomainError> {
        expect_len(words, 1, "motion")?;
        let motion_detected = match words[0] {
            0 => false,
            1 => true,
            other => {
                return Err(DomainError::Decode(format!(
                    "motion: unexpected register value {}",
                    other
                )));
            }
        };
        Ok(MotionValues { motion_detected })
    }
}
