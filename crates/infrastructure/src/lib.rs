//! Infrastructure layer - Bus links, device drivers, pins, storage and broker

pub mod bus;
pub mod config;
pub mod drivers;
pub mod gpio;
pub mod messaging;
pub mod persistence;

pub use bus::{Bus, ModbusRtuLink, RegisterLink, SimulatorLink};
pub use config::GatewayConfig;
pub use drivers::{DeviceDriver, DriverFactory};
pub use gpio::MemoryPins;
pub use messaging::{MqttAlarmPublisher, MqttClient, MqttSnapshotPublisher};
pub use persistence::JsonFileRepository;
