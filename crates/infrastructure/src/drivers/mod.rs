//! Device drivers: one per device kind, each translating a bus register
//! image into a typed reading.

mod battery;
mod charge_controller;
mod environment;
mod light;
mod motion;
mod registers;

pub use battery::BatteryDriver;
pub use charge_controller::ChargeControllerDriver;
pub use environment::EnvironmentDriver;
pub use light::LightDriver;
pub use motion::MotionDriver;

use std::time::Duration;

use domain::{BusTransport, DeviceKind, DomainError, Reading, ReadingValues};

use crate::config::DeviceConfig;

/// The closed set of devices the gateway knows how to talk to
#[derive(Debug, Clone)]
pub enum DeviceDriver {
    Light(LightDriver),
    Environment(EnvironmentDriver),
    Motion(MotionDriver),
    Power(ChargeControllerDriver),
    Battery(BatteryDriver),
}

impl DeviceDriver {
    pub fn kind(&self) -> DeviceKind {
        match self {
            Self::Light(_) => DeviceKind::Light,
            Self::Environment(_) => DeviceKind::Environment,
            Self::Motion(_) => DeviceKind::Motion,
            Self::Power(_) => DeviceKind::Power,
            Self::Battery(_) => DeviceKind::Battery,
        }
    }

    pub fn address(&self) -> u8 {
        match self {
            Self::Light(d) => d.address(),
            Self::Environment(d) => d.address(),
            Self::Motion(d) => d.address(),
            Self::Power(d) => d.address(),
            Self::Battery(d) => d.address(),
        }
    }

    /// Read the device and decode its registers into a timestamped reading
    pub async fn poll(&self, bus: &dyn BusTransport) -> Result<Reading, DomainError> {
        let values = match self {
            Self::Light(d) => ReadingValues::Light(d.poll(bus).await?),
            Self::Environment(d) => ReadingValues::Environment(d.poll(bus).await?),
            Self::Motion(d) => ReadingValues::Motion(d.poll(bus).await?),
            Self::Power(d) => ReadingValues::Power(d.poll(bus).await?),
            Self::Battery(d) => ReadingValues::Battery(d.poll(bus).await?),
        };
        Ok(Reading::new(values))
    }
}

/// Factory for creating device drivers from configuration
pub struct DriverFactory;

impl DriverFactory {
    /// `default_timeout` applies when the device has no deadline of its own
    pub fn create_driver(config: &DeviceConfig, default_timeout: Duration) -> DeviceDriver {
        let timeout = config
            .timeout_ms()
            .map(Duration::from_millis)
            .unwrap_or(default_timeout);

        match config {
            DeviceConfig::Light {
                address,
                dark_below_lux,
                ..
            } => DeviceDriver::Light(LightDriver::new(*address, *dark_below_lux, timeout)),
            DeviceConfig::Environment { address, .. } => {
                DeviceDriver::Environment(EnvironmentDriver::new(*address, timeout))
            }
            DeviceConfig::Motion { address, .. } => {
                DeviceDriver::Motion(MotionDriver::new(*address, timeout))
            }
            DeviceConfig::Power { address, .. } => {
                DeviceDriver::Power(ChargeControllerDriver::new(*address, timeout))
            }
            DeviceConfig::Battery {
                address,
                low_soc_percent,
                ..
            } => DeviceDriver::Battery(BatteryDriver::new(*address, *low_soc_percent, timeout)),
        }
    }

    /// Drivers in configuration order, which is also the polling order
    pub fn create_drivers(configs: &[DeviceConfig], default_timeout: Duration) -> Vec<DeviceDriver> {
        configs
            .iter()
            .map(|config| Self::create_driver(config, default_timeout))
            .collect()
    }
}
