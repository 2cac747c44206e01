use std::time::Duration;

use domain::{BusTransport, DomainError, LightValues, ReadRequest};

use super::registers::{expect_len, u32_be};

/// Photoresistor module: illuminance as a 32-bit lux value in two holding registers
#[derive(Debug, Clone)]
pub struct LightDriver {
    address: u8,
    dark_below_lux: u32,
    timeout: Duration,
}

impl LightDriver {
    pub const REQUEST: ReadRequest = ReadRequest::holding(0x0000, 2);

    pub fn new(address: u8, dark_below_lux: u32, timeout: Duration) -> Self {
        Self {
            address,
            dark_below_lux,
            timeout,
        }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub async fn poll(&self, bus: &dyn BusTransport) -> Result<LightValues, DomainError> {
        let words = bus
            .exchange(self.address, &Self::REQUEST, self.timeout)
            .await?;
        self.decode(&words)
    }

    pub fn decode(&self, words: &[u16]) -> Result<LightValues, DomainError> {
        expect_len(words, 2, "light")?;
        let illuminance = u32_be(words[0], words[1]);
        Ok(LightValues {
            illuminance,
            is_dark: illuminance < self.dark_below_lux,
        })
    }
}
