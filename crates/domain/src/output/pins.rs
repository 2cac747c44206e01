use crate::error::DomainError;

/// Hardware behind the output bank.
///
/// `drive` sets the electrical level of one pin and returns only after the
/// level is applied. Polarity is handled by the caller.
pub trait OutputPins: Send {
    fn drive(&mut self, pin: u32, high: bool) -> Result<(), DomainError>;
}
