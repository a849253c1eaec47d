// file: src/exporter/mod.rs
// description: sink adapters for inventory tables, object storage and json reports
// reference: internal module structure

pub mod inventory;
pub mod json;
pub mod object_store;

pub use inventory::{InventoryRow, InventorySink};
pub use json::{ExportManifest, JsonExporter};
pub use object_store::{ObjectStoreUploader, RetryPolicy};
