//! Output pin backends for the relay bank.

mod memory;
#[cfg(feature = "rpi")]
mod rppal_pins;

pub use memory::MemoryPins;
#[cfg(feature = "rpi")]
pub use rppal_pins::RppalPins;
