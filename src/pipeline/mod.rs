// file: src/pipeline/mod.rs
// description: cycle execution, scheduling and progress exports
// reference: pipeline orchestration

mod orchestrator;
mod progress;
mod scheduler;

pub use orchestrator::{CycleReport, CycleRunner};
pub use progress::{CycleStats, ProgressTracker};
pub use scheduler::{CycleScheduler, SchedulerHandle};
