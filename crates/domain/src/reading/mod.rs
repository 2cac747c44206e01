mod air_quality;
mod kind;
mod values;

pub use air_quality::{AirQuality, AirQualityLevel, WeatherEstimate};
pub use kind::DeviceKind;
pub use values::{
    BatteryValues, EnvironmentValues, LightValues, MotionValues, PowerValues, ReadingValues,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One acquisition from one device.
///
/// A Reading is never mutated after construction: each poll produces a new
/// value that replaces the previous one in the state store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    values: ReadingValues,
    taken_at: DateTime<Utc>,
}

impl Reading {
    /// Create a reading stamped with the current time
    pub fn new(values: ReadingValues) -> Self {
        Self::at(values, Utc::now())
    }

    pub fn at(values: ReadingValues, taken_at: DateTime<Utc>) -> Self {
        Self { values, taken_at }
    }

    pub fn kind(&self) -> DeviceKind {
        self.values.kind()
    }

    pub fn values(&self) -> &ReadingValues {
        &self.values
    }

    pub fn taken_at(&self) -> DateTime<Utc> {
        self.taken_at
    }

    pub fn as_light(&self) -> Option<&LightValues> {
        match &self.values {
            ReadingValues::Light(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_environment(&self) -> Option<&EnvironmentValues> {
        match &self.values {
            ReadingValues::Environment(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_motion(&self) -> Option<&MotionValues> {
        match &self.values {
            ReadingValues::Motion(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_power(&self) -> Option<&PowerValues> {
        match &self.values {
            ReadingValues::Power(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_battery(&self) -> Option<&BatteryValues> {
        match &self.values {
            ReadingValues::Battery(v) => Some(v),
            _ => None,
        }
    }
}

/// Round to two decimals, the precision the dashboard works with
pub fn round2(value: f32) -> f32 {
    (value * 100.0).round() / 100.0
}
