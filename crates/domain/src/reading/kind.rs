use std::fmt;

use serde::{Deserialize, Serialize};

/// The closed set of device kinds the gateway knows how to poll
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    /// Light-dependent resistor module
    Light,
    /// Combined CO2 / particulate / climate sensor
    Environment,
    /// PIR motion detector
    Motion,
    /// Solar charge controller (PV side)
    Power,
    /// Battery management unit
    Battery,
}

impl DeviceKind {
    pub const ALL: [DeviceKind; 5] = [
        Self::Light,
        Self::Environment,
        Self::Motion,
        Self::Power,
        Self::Battery,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Environment => "environment",
            Self::Motion => "motion",
            Self::Power => "power",
            Self::Battery => "battery",
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
