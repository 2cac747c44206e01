mod relay_automation;

pub use relay_automation::RelayAutomation;
