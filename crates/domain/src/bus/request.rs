use serde::{Deserialize, Serialize};

/// Register bank addressed by a read request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegisterBank {
    /// Read/write holding registers (function 0x03)
    Holding,
    /// Read-only input registers (function 0x04)
    Input,
}

impl RegisterBank {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Holding => "holding",
            Self::Input => "input",
        }
    }
}

/// A register read addressed to one device on the bus.
///
/// The transport carries it verbatim; interpreting the returned words is
/// the job of the device driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReadRequest {
    pub bank: RegisterBank,
    pub start: u16,
    pub count: u16,
}

impl ReadRequest {
    pub const fn holding(start: u16, count: u16) -> Self {
        Self {
            bank: RegisterBank::Holding,
            start,
            count,
        }
    }

    pub const fn input(start: u16, count: u16) -> Self {
        Self {
            bank: RegisterBank::Input,
            start,
            count,
        }
    }
}
