use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Bus exchange with device {address} timed out after {timeout_ms}ms")]
    Timeout { address: u8, timeout_ms: u64 },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Invalid output channel {0} (expected 0..8)")]
    InvalidChannel(usize),

    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),

    #[error("Bus transport error: {0}")]
    Transport(String),

    #[error("Output pin error: {0}")]
    Pin(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl DomainError {
    /// Errors raised while talking to a device. These are recorded against the
    /// device and never abort a poll cycle.
    pub fn is_device_fault(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::Decode(_) | Self::Transport(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, DomainError>;
