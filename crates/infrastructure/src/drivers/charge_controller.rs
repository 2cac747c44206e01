use std::time::Duration;

use domain::reading::round2;
use domain::{BusTransport, DomainError, PowerValues, ReadRequest};

use super::registers::{centi, expect_len};

/// MPPT solar charge controller, PV side
#[derive(Debug, Clone)]
pub struct ChargeControllerDriver {
    address: u8,
    timeout: Duration,
}

impl ChargeControllerDriver {
    pub const REQUEST: ReadRequest = ReadRequest::input(0x3000, 2);

    pub fn new(address: u8, timeout: Duration) -> Self {
        Self { address, timeout }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub async fn poll(&self, bus: &dyn BusTransport) -> Result<PowerValues, DomainError> {
        let words = bus
            .exchange(self.address, &Self::REQUEST, self.timeout)
            .await?;
        self.decode(&words)
    }

    pub fn decode(&self, words: &[u16]) -> Result<PowerValues, DomainError> {
        expect_len(words, 2, "power")?;
        let pv_voltage = centi(words[0]);
        let pv_current = centi(words[1]);
        Ok(PowerValues {
            pv_voltage,
            pv_current,
            pv_power: round2(pv_voltage * pv_current),
        })
    }
}
