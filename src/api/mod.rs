// file: src/api/mod.rs
// description: json query and trigger surface over the monitor's persisted state
// reference: internal module structure

pub mod handlers;
pub mod report;
pub mod server;

pub use handlers::{ApiError, AppState};
pub use report::{ChangeReport, anomaly_report, change_report, records_from_rows};
pub use server::{bind, build_router, serve};
