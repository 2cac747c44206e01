use serde::{Deserialize, Serialize};

use super::{AirQuality, DeviceKind};

/// Typed payload of a reading, one variant per device kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReadingValues {
    Light(LightValues),
    Environment(EnvironmentValues),
    Motion(MotionValues),
    Power(PowerValues),
    Battery(BatteryValues),
}

impl ReadingValues {
    pub fn kind(&self) -> DeviceKind {
        match self {
            Self::Light(_) => DeviceKind::Light,
            Self::Environment(_) => DeviceKind::Environment,
            Self::Motion(_) => DeviceKind::Motion,
            Self::Power(_) => DeviceKind::Power,
            Self::Battery(_) => DeviceKind::Battery,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightValues {
    /// Illuminance in lux
    pub illuminance: u32,
    pub is_dark: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentValues {
    /// ppm
    pub co2: f32,
    /// °C
    pub temperature: f32,
    /// %RH
    pub humidity: f32,
    /// µg/m³
    pub pm2_5: f32,
    /// µg/m³
    pub pm10: f32,
    /// lux, from the sensor's own photodiode
    pub illumination: f32,
    pub air_quality: AirQuality,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionValues {
    pub motion_detected: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerValues {
    pub pv_voltage: f32,
    pub pv_current: f32,
    pub pv_power: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatteryValues {
    pub voltage: f32,
    pub current: f32,
    pub power: f32,
    /// Percent
    pub state_of_charge: u16,
    /// Percent
    pub state_of_health: u16,
    /// °C
    pub temperature: f32,
    pub discharge_minutes: u16,
    pub charge_minutes: u16,
    pub low_power_mode: bool,
}
