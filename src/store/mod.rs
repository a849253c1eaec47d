// file: src/store/mod.rs
// description: durable json stores for history, change feed and cycle log
// reference: internal module structure

pub mod atomic;
pub mod change_log;
pub mod cycle_log;
pub mod history;

pub use change_log::ChangeLogStore;
pub use cycle_log::{CycleLogStats, CycleLogStore, CycleRecord};
pub use history::HistoryStore;
