use serde::{Deserialize, Serialize};

use super::OutputChannel;

/// Recorded state of one digital output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputState {
    pub channel: OutputChannel,
    /// Physical pin driven for this channel (BCM numbering on a Raspberry Pi)
    pub pin: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub energized: bool,
}

impl OutputState {
    /// A de-energized output
    pub fn new(channel: OutputChannel, pin: u32, name: Option<String>) -> Self {
        Self {
            channel,
            pin,
            name,
            energized: false,
        }
    }
}
