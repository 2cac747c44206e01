use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

use domain::{DomainError, OutputPins};
use tracing::debug;

/// Pin levels kept in memory.
///
/// Used when no GPIO header is present (simulation, development hosts) and
/// in tests. Clones share the same levels so a test can keep a handle and
/// inspect what the output bank drove.
#[derive(Debug, Clone, Default)]
pub struct MemoryPins {
    levels: Arc<Mutex<BTreeMap<u32, bool>>>,
    failing: Arc<Mutex<HashSet<u32>>>,
}

impl MemoryPins {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last level driven on `pin`, `None` if never driven
    pub fn level(&self, pin: u32) -> Option<bool> {
        self.levels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&pin)
            .copied()
    }

    /// Make every subsequent drive of `pin` fail
    pub fn fail_pin(&self, pin: u32) {
        self.failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(pin);
    }

    pub fn heal_pin(&self, pin: u32) {
        self.failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&pin);
    }
}

impl OutputPins for MemoryPins {
    fn drive(&mut self, pin: u32, high: bool) -> Result<(), DomainError> {
        if self
            .failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&pin)
        {
            return Err(DomainError::Pin(format!("pin {} is not writable", pin)));
        }

        debug!(pin, high, "Driving pin");
        self.levels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(pin, high);
        Ok(())
    }
}
