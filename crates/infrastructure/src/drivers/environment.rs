use std::time::Duration;

use domain::reading::round2;
use domain::{AirQuality, BusTransport, DomainError, EnvironmentValues, ReadRequest};

use super::registers::{expect_len, f32_be, finite};

/// Multi-parameter air sensor.
///
/// Six IEEE-754 floats live in consecutive holding register pairs starting
/// at 0x0008: CO2, PM2.5, PM10, temperature, humidity, illumination. One
/// block read keeps the sample coherent.
#[derive(Debug, Clone)]
pub struct EnvironmentDriver {
    address: u8,
    timeout: Duration,
}

const FIELDS: [&str; 6] = ["co2", "pm2_5", "pm10", "temperature", "humidity", "illumination"];

impl EnvironmentDriver {
    pub const REQUEST: ReadRequest = ReadRequest::holding(0x0008, 12);

    pub fn new(address: u8, timeout: Duration) -> Self {
        Self { address, timeout }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub async fn poll(&self, bus: &dyn BusTransport) -> Result<EnvironmentValues, DomainError> {
        let words = bus
            .exchange(self.address, &Self::REQUEST, self.timeout)
            .await?;
        self.decode(&words)
    }

    pub fn decode(&self, words: &[u16]) -> Result<EnvironmentValues, DomainError> {
        expect_len(words, 12, "environment")?;

        let mut values = [0f32; 6];
        for (i, field) in FIELDS.iter().enumerate() {
            let raw = f32_be(words[i * 2], words[i * 2 + 1]);
            values[i] = finite(raw, field)?;
        }
        let [co2, pm2_5, pm10, temperature, humidity, illumination] = values;

        Ok(EnvironmentValues {
            co2: round2(co2),
            temperature: round2(temperature),
            humidity: round2(humidity),
            pm2_5: round2(pm2_5),
            pm10: round2(pm10),
            illumination: round2(illumination),
            air_quality: AirQuality::classify(pm2_5, co2),
        })
    }
}
