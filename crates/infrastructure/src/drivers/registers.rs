//! Helpers for turning raw register words into engineering values.

use domain::DomainError;

/// Reject responses that do not carry the number of words we asked for
pub(crate) fn expect_len(words: &[u16], expected: usize, what: &str) -> Result<(), DomainError> {
    if words.len() != expected {
        return Err(DomainError::Decode(format!(
            "{}: expected {} registers, got {}",
            what,
            expected,
            words.len()
        )));
    }
    Ok(())
}

/// High word first
pub(crate) fn u32_be(hi: u16, lo: u16) -> u32 {
    ((hi as u32) << 16) | lo as u32
}

/// IEEE-754 single precision, high word first
pub(crate) fn f32_be(hi: u16, lo: u16) -> f32 {
    f32::from_bits(u32_be(hi, lo))
}

pub(crate) fn finite(value: f32, field: &str) -> Result<f32, DomainError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(DomainError::Decode(format!("{} is not a finite number", field)))
    }
}

/// Fixed-point register with two implied decimals
pub(crate) fn centi(word: u16) -> f32 {
    word as f32 / 100.0
}
