use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::reading::{DeviceKind, Reading};

/// Device health as seen by the poll loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceHealth {
    /// Never polled, or polled without any outcome yet
    #[default]
    Unknown,
    /// Last poll succeeded
    Online,
    /// One or more consecutive polls failed
    Failing,
}

impl DeviceHealth {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Online => "online",
            Self::Failing => "failing",
        }
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Online)
    }
}

/// Per-device polling record.
///
/// A failed poll keeps the last good reading in place (carry forward) and
/// only bumps the failure counter; a successful poll replaces the reading and
/// resets the counter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceStatus {
    pub kind: DeviceKind,
    pub address: u8,
    pub last_reading: Option<Reading>,
    pub last_error: Option<String>,
    pub consecutive_failures: u32,
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_failure_at: Option<DateTime<Utc>>,
}

impl DeviceStatus {
    pub fn new(kind: DeviceKind, address: u8) -> Self {
        Self {
            kind,
            address,
            last_reading: None,
            last_error: None,
            consecutive_failures: 0,
            last_success_at: None,
            last_failure_at: None,
        }
    }

    pub fn record_success(&mut self, reading: Reading) {
        self.last_success_at = Some(reading.taken_at());
        self.last_reading = Some(reading);
        self.last_error = None;
        self.consecutive_failures = 0;
    }

    pub fn record_failure(&mut self, error: &DomainError, at: DateTime<Utc>) {
        self.last_error = Some(error.to_string());
        self.last_failure_at = Some(at);
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
    }

    pub fn health(&self) -> DeviceHealth {
        if self.consecutive_failures > 0 {
            DeviceHealth::Failing
        } else if self.last_success_at.is_some() {
            DeviceHealth::Online
        } else {
            DeviceHealth::Unknown
        }
    }

    /// The reading was acquired in the most recent poll of this device
    pub fn is_fresh(&self) -> bool {
        self.consecutive_failures == 0 && self.last_reading.is_some()
    }
}
