mod scheduler;

pub use scheduler::{PollScheduler, SchedulerHandle, SchedulerPhase, SchedulerStats};
