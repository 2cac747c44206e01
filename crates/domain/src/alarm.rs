use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::reading::DeviceKind;
use crate::snapshot::GatewaySnapshot;

/// Alarm severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlarmLevel {
    Info,
    Warning,
    Critical,
}

impl AlarmLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }
}

/// A threshold violation observed in a committed snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alarm {
    pub level: AlarmLevel,
    /// Field that crossed its threshold, e.g. `temperature`
    pub sensor: String,
    pub message: String,
    pub value: f64,
    pub threshold: f64,
    pub raised_at: DateTime<Utc>,
}

impl Alarm {
    fn new(level: AlarmLevel, sensor: &str, message: String, value: f64, threshold: f64) -> Self {
        Self {
            level,
            sensor: sensor.to_string(),
            message,
            value,
            threshold,
            raised_at: Utc::now(),
        }
    }
}

/// Forwards raised alarms to an external channel
#[async_trait]
pub trait AlarmPublisher: Send + Sync {
    async fn publish_alarm(
        &self,
        alarm: &Alarm,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Alarm limits. Only readings acquired in the latest cycle are checked, so a
/// device that stopped answering does not keep re-raising stale alarms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlarmThresholds {
    pub enabled: bool,
    pub temperature_high: f32,
    pub temperature_low: f32,
    pub humidity_high: f32,
    pub co2_high: f32,
    pub pm2_5_high: f32,
    pub battery_soc_low: u16,
}

impl Default for AlarmThresholds {
    fn default() -> Self {
        Self {
            enabled: true,
            temperature_high: 35.0,
            temperature_low: 5.0,
            humidity_high: 85.0,
            co2_high: 2000.0,
            pm2_5_high: 55.0,
            battery_soc_low: 20,
        }
    }
}

impl AlarmThresholds {
    pub fn evaluate(&self, snapshot: &GatewaySnapshot) -> Vec<Alarm> {
        let mut alarms = Vec::new();
        if !self.enabled {
            return alarms;
        }

        let fresh = |kind: DeviceKind| {
            snapshot
                .status(kind)
                .filter(|s| s.is_fresh())
                .and_then(|s| s.last_reading.as_ref())
        };

        if let Some(env) = fresh(DeviceKind::Environment).and_then(|r| r.as_environment()) {
            if env.temperature > self.temperature_high {
                alarms.push(Alarm::new(
                    AlarmLevel::Warning,
                    "temperature",
                    format!(
                        "High temperature: {}°C (limit {}°C)",
                        env.temperature, self.temperature_high
                    ),
                    env.temperature as f64,
                    self.temperature_high as f64,
                ));
            } else if env.temperature < self.temperature_low {
                alarms.push(Alarm::new(
                    AlarmLevel::Warning,
                    "temperature",
                    format!(
                        "Low temperature: {}°C (limit {}°C)",
                        env.temperature, self.temperature_low
                    ),
                    env.temperature as f64,
                    self.temperature_low as f64,
                ));
            }

            if env.humidity > self.humidity_high {
                alarms.push(Alarm::new(
                    AlarmLevel::Warning,
                    "humidity",
                    format!(
                        "High humidity: {}% (limit {}%)",
                        env.humidity, self.humidity_high
                    ),
                    env.humidity as f64,
                    self.humidity_high as f64,
                ));
            }

            if env.co2 > self.co2_high {
                alarms.push(Alarm::new(
                    AlarmLevel::Critical,
                    "co2",
                    format!("High CO2 level: {} ppm (limit {} ppm)", env.co2, self.co2_high),
                    env.co2 as f64,
                    self.co2_high as f64,
                ));
            }

            if env.pm2_5 > self.pm2_5_high {
                alarms.push(Alarm::new(
                    AlarmLevel::Warning,
                    "pm2_5",
                    format!("High particulate level (PM2.5): {} µg/m³", env.pm2_5),
                    env.pm2_5 as f64,
                    self.pm2_5_high as f64,
                ));
            }
        }

        if let Some(battery) = fresh(DeviceKind::Battery).and_then(|r| r.as_battery()) {
            if battery.state_of_charge < self.battery_soc_low {
                alarms.push(Alarm::new(
                    AlarmLevel::Critical,
                    "battery_soc",
                    format!(
                        "Low battery: {}% (limit {}%)",
                        battery.state_of_charge, self.battery_soc_low
                    ),
                    battery.state_of_charge as f64,
                    self.battery_soc_low as f64,
                ));
            }
        }

        alarms
    }
}
