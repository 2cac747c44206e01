use std::time::Duration;

use domain::reading::round2;
use domain::{BatteryValues, BusTransport, DomainError, ReadRequest};

use super::registers::{centi, expect_len};

/// Battery management system.
///
/// Electrical values and pack status live in two separate input register
/// blocks; both are read in the same poll and either failing fails the poll.
#[derive(Debug, Clone)]
pub struct BatteryDriver {
    address: u8,
    low_soc_percent: u16,
    timeout: Duration,
}

impl BatteryDriver {
    pub const ELECTRICAL: ReadRequest = ReadRequest::input(0x3004, 2);
    pub const STATUS: ReadRequest = ReadRequest::input(0x3020, 5);

    pub fn new(address: u8, low_soc_percent: u16, timeout: Duration) -> Self {
        Self {
            address,
            low_soc_percent,
            timeout,
        }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub async fn poll(&self, bus: &dyn BusTransport) -> Result<BatteryValues, DomainError> {
        let electrical = bus
            .exchange(self.address, &Self::ELECTRICAL, self.timeout)
            .await?;
        let status = bus
            .exchange(self.address, &Self::STATUS, self.timeout)
            .await?;
        self.decode(&electrical, &status)
    }

    pub fn decode(&self, electrical: &[u16], status: &[u16]) -> Result<BatteryValues, DomainError> {
        expect_len(electrical, 2, "battery electrical")?;
        expect_len(status, 5, "battery status")?;

        let voltage = centi(electrical[0]);
        let current = centi(electrical[1]);
        let state_of_charge = status[0];

        Ok(BatteryValues {
            voltage,
            current,
            power: round2(voltage * current),
            state_of_charge,
            state_of_health: status[1],
            // Signed tenths of a degree
            temperature: status[2] as i16 as f32 / 10.0,
            discharge_minutes: status[3],
            charge_minutes: status[4],
            low_power_mode: state_of_charge < self.low_soc_percent,
        })
    }
}
