pub mod report;
pub mod scheduler;

pub use report::CycleReport;
pub use scheduler::{Scheduler, SchedulerConfig};
