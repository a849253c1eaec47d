// file: src/error.rs
// description: Custom error types and result type aliases
// reference: https://docs.rs/thiserror

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, MonitorError>;

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// A remote or durable collaborator (listing adapter, history store) cannot be used.
    /// Aborts the current cycle and leaves the committed state untouched.
    #[error("{collaborator} unavailable: {message}")]
    CollaboratorUnavailable {
        collaborator: &'static str,
        message: String,
    },

    /// A single file could not be normalized or read. Never aborts a cycle.
    #[error("Failed to process file {name}: {message}")]
    PerFile { name: String, message: String },

    #[error("File operation failed for {path}: {source}")]
    FileOperation {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Object store error: {0}")]
    ObjectStore(String),

    #[error("A reconciliation cycle is already running")]
    CycleInProgress,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl MonitorError {
    pub fn per_file(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PerFile {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn unavailable(collaborator: &'static str, message: impl Into<String>) -> Self {
        Self::CollaboratorUnavailable {
            collaborator,
            message: message.into(),
        }
    }

    /// Errors that end a cycle early; the scheduler retries on the next tick.
    pub fn is_cycle_abort(&self) -> bool {
        !matches!(self, Self::PerFile { .. })
    }
}
