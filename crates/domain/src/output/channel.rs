use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Number of digital outputs on the relay bank
pub const CHANNEL_COUNT: usize = 8;

/// A validated output index in `0..CHANNEL_COUNT`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct OutputChannel(u8);

impl OutputChannel {
    pub fn new(index: usize) -> Result<Self, DomainError> {
        if index < CHANNEL_COUNT {
            Ok(Self(index as u8))
        } else {
            Err(DomainError::InvalidChannel(index))
        }
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }

    /// Every channel of the bank, in index order
    pub fn all() -> impl Iterator<Item = OutputChannel> {
        (0..CHANNEL_COUNT as u8).map(Self)
    }
}

impl TryFrom<usize> for OutputChannel {
    type Error = DomainError;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        Self::new(index)
    }
}

impl From<OutputChannel> for usize {
    fn from(channel: OutputChannel) -> Self {
        channel.index()
    }
}

impl fmt::Display for OutputChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
