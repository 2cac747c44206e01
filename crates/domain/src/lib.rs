//! Domain layer - Pure gateway model with no I/O
//!
//! This crate contains:
//! - Readings and device health (Reading, DeviceStatus)
//! - The output bank model (OutputChannel, OutputState)
//! - The aggregate exposed to readers and persisted (GatewaySnapshot)
//! - Alarm thresholds and relay automation rules
//! - Ports implemented by infrastructure (BusTransport, OutputPins,
//!   SnapshotRepository, SnapshotObserver, AlarmPublisher)

pub mod alarm;
pub mod automation;
pub mod bus;
pub mod error;
pub mod output;
pub mod reading;
pub mod snapshot;
pub mod status;

// Re-export commonly used types
pub use alarm::{Alarm, AlarmLevel, AlarmPublisher, AlarmThresholds};
pub use automation::{RelayRule, RuleSource};
pub use bus::{BusTransport, ReadRequest, RegisterBank};
pub use error::DomainError;
pub use output::{CHANNEL_COUNT, OutputChannel, OutputPins, OutputState};
pub use reading::{
    AirQuality, AirQualityLevel, BatteryValues, DeviceKind, EnvironmentValues, LightValues,
    MotionValues, PowerValues, Reading, ReadingValues, WeatherEstimate,
};
pub use snapshot::{GatewaySnapshot, SnapshotObserver, SnapshotRepository};
pub use status::{DeviceHealth, DeviceStatus};
