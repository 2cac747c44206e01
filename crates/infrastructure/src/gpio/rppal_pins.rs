use std::collections::HashMap;

use domain::{DomainError, OutputPins};
use rppal::gpio::{Gpio, OutputPin};
use tracing::info;

/// Raspberry Pi GPIO header (BCM numbering)
pub struct RppalPins {
    gpio: Gpio,
    pins: HashMap<u32, OutputPin>,
}

impl RppalPins {
    pub fn new() -> Result<Self, DomainError> {
        let gpio = Gpio::new().map_err(|e| DomainError::Pin(format!("GPIO unavailable: {}", e)))?;
        info!("GPIO header opened");
        Ok(Self {
            gpio,
            pins: HashMap::new(),
        })
    }

    fn output(&mut self, pin: u32) -> Result<&mut OutputPin, DomainError> {
        if !self.pins.contains_key(&pin) {
            let bcm = u8::try_from(pin)
                .map_err(|_| DomainError::Pin(format!("pin {} out of range", pin)))?;
            let mut output = self
                .gpio
                .get(bcm)
                .map_err(|e| DomainError::Pin(format!("pin {}: {}", pin, e)))?
                .into_output();
            // Relays keep their state if the process exits.
            output.set_reset_on_drop(false);
            self.pins.insert(pin, output);
        }
        self.pins
            .get_mut(&pin)
            .ok_or_else(|| DomainError::Pin(format!("pin {} not claimed", pin)))
    }
}

impl OutputPins for RppalPins {
    fn drive(&mut self, pin: u32, high: bool) -> Result<(), DomainError> {
        let output = self.output(pin)?;
        if high {
            output.set_high();
        } else {
            output.set_low();
        }
        Ok(())
    }
}
