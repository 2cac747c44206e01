use std::collections::HashSet;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use domain::automation::RelayRule;
use domain::output::CHANNEL_COUNT;
use domain::{AlarmThresholds, DeviceKind, DomainError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct BusConfig {
    #[serde(default = "default_port")]
    pub port: String,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    #[serde(default = "default_data_bits")]
    pub data_bits: u8,
    #[serde(default = "default_parity")]
    pub parity: String,
    #[serde(default = "default_stop_bits")]
    pub stop_bits: u8,
    /// Per-exchange deadline
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Answer from the built-in device simulator instead of a serial port
    #[serde(default)]
    pub simulate: bool,
}

fn default_port() -> String {
    "/dev/ttyUSB0".to_string()
}
fn default_baud_rate() -> u32 {
    9600
}
fn default_data_bits() -> u8 {
    8
}
fn default_parity() -> String {
    "N".to_string()
}
fn default_stop_bits() -> u8 {
    1
}
fn default_timeout_ms() -> u64 {
    2000
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            baud_rate: default_baud_rate(),
            data_bits: default_data_bits(),
            parity: default_parity(),
            stop_bits: default_stop_bits(),
            timeout_ms: default_timeout_ms(),
            simulate: false,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PollingConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

fn default_interval_secs() -> u64 {
    10
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
        }
    }
}

/// One device on the bus. The list order is the polling order.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeviceConfig {
    Light {
        #[serde(default = "default_light_address")]
        address: u8,
        /// Illuminance below which the light sensor reports darkness
        #[serde(default = "default_dark_below_lux")]
        dark_below_lux: u32,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },
    Environment {
        #[serde(default = "default_environment_address")]
        address: u8,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },
    Motion {
        #[serde(default = "default_motion_address")]
        address: u8,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },
    Power {
        #[serde(default = "default_power_address")]
        address: u8,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },
    Battery {
        #[serde(default = "default_battery_address")]
        address: u8,
        /// State of charge (percent) below which the battery is in low-power mode
        #[serde(default = "default_low_soc_percent")]
        low_soc_percent: u16,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },
}

fn default_light_address() -> u8 {
    1
}
fn default_motion_address() -> u8 {
    2
}
fn default_power_address() -> u8 {
    3
}
fn default_battery_address() -> u8 {
    4
}
fn default_environment_address() -> u8 {
    123
}
fn default_dark_below_lux() -> u32 {
    20_000
}
fn default_low_soc_percent() -> u16 {
    30
}

impl DeviceConfig {
    pub fn kind(&self) -> DeviceKind {
        match self {
            Self::Light { .. } => DeviceKind::Light,
            Self::Environment { .. } => DeviceKind::Environment,
            Self::Motion { .. } => DeviceKind::Motion,
            Self::Power { .. } => DeviceKind::Power,
            Self::Battery { .. } => DeviceKind::Battery,
        }
    }

    pub fn address(&self) -> u8 {
        match self {
            Self::Light { address, .. }
            | Self::Environment { address, .. }
            | Self::Motion { address, .. }
            | Self::Power { address, .. }
            | Self::Battery { address, .. } => *address,
        }
    }

    pub fn timeout_ms(&self) -> Option<u64> {
        match self {
            Self::Light { timeout_ms, .. }
            | Self::Environment { timeout_ms, .. }
            | Self::Motion { timeout_ms, .. }
            | Self::Power { timeout_ms, .. }
            | Self::Battery { timeout_ms, .. } => *timeout_ms,
        }
    }

    /// Default configuration of a device kind at its factory address
    pub fn default_for(kind: DeviceKind) -> Self {
        match kind {
            DeviceKind::Light => Self::Light {
                address: default_light_address(),
                dark_below_lux: default_dark_below_lux(),
                timeout_ms: None,
            },
            DeviceKind::Environment => Self::Environment {
                address: default_environment_address(),
                timeout_ms: None,
            },
            DeviceKind::Motion => Self::Motion {
                address: default_motion_address(),
                timeout_ms: None,
            },
            DeviceKind::Power => Self::Power {
                address: default_power_address(),
                timeout_ms: None,
            },
            DeviceKind::Battery => Self::Battery {
                address: default_battery_address(),
                low_soc_percent: default_low_soc_percent(),
                timeout_ms: None,
            },
        }
    }
}

fn default_devices() -> Vec<DeviceConfig> {
    DeviceKind::ALL
        .iter()
        .map(|kind| DeviceConfig::default_for(*kind))
        .collect()
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct OutputConfig {
    pub pin: u32,
    #[serde(default)]
    pub name: Option<String>,
    /// The relay energizes when the pin is driven low
    #[serde(default)]
    pub active_low: bool,
}

fn default_outputs() -> Vec<OutputConfig> {
    const PINS: [(u32, &str); CHANNEL_COUNT] = [
        (5, "led_light"),
        (6, "display"),
        (13, "load1"),
        (19, "load2"),
        (26, "aux1"),
        (16, "aux2"),
        (20, "aux3"),
        (21, "aux4"),
    ];
    PINS.iter()
        .map(|(pin, name)| OutputConfig {
            pin: *pin,
            name: Some(name.to_string()),
            active_low: false,
        })
        .collect()
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PersistenceConfig {
    #[serde(default = "default_state_path")]
    pub path: String,
}

fn default_state_path() -> String {
    "data/gateway_state.json".to_string()
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            path: default_state_path(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct MqttConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_mqtt_host")]
    pub host: String,
    #[serde(default = "default_mqtt_port")]
    pub port: u16,
    #[serde(default = "default_mqtt_topic")]
    pub topic: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

fn default_mqtt_host() -> String {
    "localhost".to_string()
}
fn default_mqtt_port() -> u16 {
    1883
}
fn default_mqtt_topic() -> String {
    "gateway/sensors".to_string()
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: default_mqtt_host(),
            port: default_mqtt_port(),
            topic: default_mqtt_topic(),
            username: None,
            password: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct HttpConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "0.0.0.0:5000".to_string()
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct GatewayConfig {
    #[serde(default = "default_gateway_name")]
    pub gateway_name: String,
    #[serde(default)]
    pub bus: BusConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default = "default_devices")]
    pub devices: Vec<DeviceConfig>,
    #[serde(default = "default_outputs")]
    pub outputs: Vec<OutputConfig>,
    #[serde(default)]
    pub persistence: PersistenceConfig,
    #[serde(default)]
    pub mqtt: MqttConfig,
    #[serde(default)]
    pub alarms: AlarmThresholds,
    #[serde(default)]
    pub automation: Vec<RelayRule>,
    #[serde(default)]
    pub http: HttpConfig,
}

fn default_gateway_name() -> String {
    "field-gateway".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            gateway_name: default_gateway_name(),
            bus: BusConfig::default(),
            polling: PollingConfig::default(),
            devices: default_devices(),
            outputs: default_outputs(),
            persistence: PersistenceConfig::default(),
            mqtt: MqttConfig::default(),
            alarms: AlarmThresholds::default(),
            automation: Vec::new(),
            http: HttpConfig::default(),
        }
    }
}

impl GatewayConfig {
    pub fn load(config_dir: &str) -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            // Site configuration, e.g. config/default.toml
            .add_source(File::with_name(&format!("{}/default", config_dir)).required(false))
            // Mode specific overrides
            .add_source(File::with_name(&format!("{}/{}", config_dir, run_mode)).required(false))
            // Environment variables (e.g. GATEWAY__BUS__PORT=/dev/ttyAMA0)
            .add_source(Environment::with_prefix("GATEWAY").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.polling.interval_secs)
    }

    pub fn bus_timeout(&self) -> Duration {
        Duration::from_millis(self.bus.timeout_ms)
    }

    /// Copy safe to show to API clients
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if config.mqtt.password.is_some() {
            config.mqtt.password = Some("********".to_string());
        }
        config
    }

    /// Structural checks that serde cannot express
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.polling.interval_secs == 0 {
            return Err(DomainError::InvalidConfiguration(
                "polling.interval_secs must be greater than zero".into(),
            ));
        }
        if self.bus.timeout_ms == 0 {
            return Err(DomainError::InvalidConfiguration(
                "bus.timeout_ms must be greater than zero".into(),
            ));
        }

        let mut kinds = HashSet::new();
        let mut addresses = HashSet::new();
        for device in &self.devices {
            if !kinds.insert(device.kind()) {
                return Err(DomainError::InvalidConfiguration(format!(
                    "device kind '{}' is configured more than once",
                    device.kind()
                )));
            }
            if !addresses.insert(device.address()) {
                return Err(DomainError::InvalidConfiguration(format!(
                    "bus address {} is used by more than one device",
                    device.address()
                )));
            }
        }

        if self.outputs.len() != CHANNEL_COUNT {
            return Err(DomainError::InvalidConfiguration(format!(
                "expected {} outputs, found {}",
                CHANNEL_COUNT,
                self.outputs.len()
            )));
        }
        let mut pins = HashSet::new();
        for output in &self.outputs {
            if !pins.insert(output.pin) {
                return Err(DomainError::InvalidConfiguration(format!(
                    "pin {} is assigned to more than one output",
                    output.pin
                )));
            }
        }

        Ok(())
    }
}
