//! Application layer - Polling, state, output and remote control use cases

pub mod alarm;
pub mod automation;
pub mod messaging;
pub mod output;
pub mod poll;
pub mod state;

pub use alarm::AlarmMonitor;
pub use automation::RelayAutomation;
pub use messaging::ControlListener;
pub use output::OutputBank;
pub use poll::{PollScheduler, SchedulerHandle, SchedulerPhase, SchedulerStats};
pub use state::{SnapshotPersister, StateStore};
