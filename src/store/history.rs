// file: src/store/history.rs
// description: durable per-file fingerprint history, replaced wholesale every cycle
// reference: json snapshot with atomic replace

use super::atomic::{read_json_or_default, write_json_atomic};
use crate::error::Result;
use crate::models::History;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const COLLABORATOR: &str = "history store";

#[derive(Debug, Clone)]
pub struct HistoryStore {
    storage_path: PathBuf,
}

impl HistoryStore {
    pub fn new(storage_path: impl Into<PathBuf>) -> Self {
        Self {
            storage_path: storage_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.storage_path
    }

    /// Loads the last committed snapshot. A missing file is a first run and
    /// yields an empty history; a corrupt file is an error.
    pub async fn load(&self) -> Result<History> {
        if !self.storage_path.exists() {
            debug!("No history snapshot found at {:?}", self.storage_path);
        }

        let history: History = read_json_or_default(&self.storage_path, COLLABORATOR).await?;
        info!("Loaded history with {} entries", history.len());
        Ok(history)
    }

    /// Replaces the stored snapshot with `history`.
    pub async fn save(&self, history: &History) -> Result<()> {
        write_json_atomic(&self.storage_path, history).await?;
        debug!("Saved history with {} entries", history.len());
        Ok(())
    }
}
