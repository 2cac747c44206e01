mod monitor;

pub use monitor::AlarmMonitor;
