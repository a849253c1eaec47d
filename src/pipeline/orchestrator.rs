// file: src/pipeline/orchestrator.rs
// description: runs one reconciliation cycle from listing to persisted outputs
// reference: orchestrates the asynchronous monitoring workflow

use crate::config::{Config, FingerprintConfig};
use crate::detection::fingerprint::requires_content;
use crate::detection::{
    CandidateFile, FileNormalizer, FingerprintOutcome, ObservedFile, Reconciler, Reconciliation,
};
use crate::error::{MonitorError, Result};
use crate::exporter::inventory::to_csv_bytes;
use crate::exporter::{InventoryRow, InventorySink, ObjectStoreUploader};
use crate::models::{ChangeRecord, FileRecord, History, RawFileDescriptor};
use crate::pipeline::progress::{CycleStats, ProgressTracker};
use crate::repository::{FileClassifier, FileSource, build_source};
use crate::store::{ChangeLogStore, CycleLogStore, CycleRecord, HistoryStore};
use crate::utils::OperationTimer;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

/// What one completed cycle produced.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub cycle_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub stats: CycleStats,
    pub inventory: Vec<FileRecord>,
    pub changes: Vec<ChangeRecord>,
    pub inventory_path: PathBuf,
    pub object_key: Option<String>,
}

pub struct CycleRunner {
    source: Arc<dyn FileSource>,
    folder: String,
    reconciler: Reconciler,
    fingerprint: FingerprintConfig,
    history: HistoryStore,
    change_log: ChangeLogStore,
    cycle_log: CycleLogStore,
    inventory: InventorySink,
    uploader: Option<ObjectStoreUploader>,
    cycle_lock: Mutex<()>,
    show_progress: bool,
}

impl CycleRunner {
    pub fn new(config: &Config, source: Arc<dyn FileSource>) -> Self {
        let normalizer = FileNormalizer::new(
            config.source.resolved_link_base(),
            FileClassifier::from_config(&config.classification),
        );

        Self {
            source,
            folder: config.source.folder.clone(),
            reconciler: Reconciler::new(normalizer),
            fingerprint: config.fingerprint.clone(),
            history: HistoryStore::new(config.storage.history_path.clone()),
            change_log: ChangeLogStore::new(config.storage.change_log_path.clone()),
            cycle_log: CycleLogStore::new(
                config.storage.cycle_log_path.clone(),
                config.storage.max_cycle_records,
            ),
            inventory: InventorySink::new(config.storage.inventory_path.clone()),
            uploader: ObjectStoreUploader::from_config(&config.object_store),
            cycle_lock: Mutex::new(()),
            show_progress: false,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let source = build_source(&config.source)?;
        Ok(Self::new(config, source))
    }

    /// Draws a progress bar while fingerprinting content.
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn source(&self) -> &Arc<dyn FileSource> {
        &self.source
    }

    pub fn history_store(&self) -> &HistoryStore {
        &self.history
    }

    pub fn change_log(&self) -> &ChangeLogStore {
        &self.change_log
    }

    pub fn cycle_log(&self) -> &CycleLogStore {
        &self.cycle_log
    }

    pub fn inventory_sink(&self) -> &InventorySink {
        &self.inventory
    }

    pub fn is_running(&self) -> bool {
        self.cycle_lock.try_lock().is_err()
    }

    /// Runs a cycle, waiting for any cycle already in flight to finish first.
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        let _guard = self.cycle_lock.lock().await;
        self.execute().await
    }

    /// Runs a cycle unless one is already in flight.
    pub async fn try_run_cycle(&self) -> Result<CycleReport> {
        let _guard = self
            .cycle_lock
            .try_lock()
            .map_err(|_| MonitorError::CycleInProgress)?;
        self.execute().await
    }

    async fn execute(&self) -> Result<CycleReport> {
        let timer = OperationTimer::new("reconciliation cycle");
        let cycle_id = Uuid::new_v4().to_string();
        let started_at = Utc::now();
        info!("Starting cycle {} against {}", cycle_id, self.source.describe());

        let listing = self.source.list_files(&self.folder).await?;
        let history = self.history.load().await?;
        // both logs must be readable before anything is written
        self.change_log.load().await?;
        self.cycle_log.load().await?;
        timer.checkpoint(&format!("listed {} files", listing.len()));

        let reconciliation = self.reconcile(&listing, &history).await;

        let inventory_path = self.inventory.write_records(&reconciliation.inventory).await?;

        // history goes after the change log so a failed append re-detects the same changes
        let finished_at = Utc::now();
        self.change_log
            .append(&cycle_id, finished_at, &reconciliation.changes)
            .await?;
        self.history.save(&reconciliation.new_history).await?;

        let object_key = self.upload(&reconciliation.inventory, finished_at).await;

        let stats = CycleStats::from_reconciliation(&reconciliation, listing.len(), timer.elapsed());
        self.cycle_log
            .append(CycleRecord {
                cycle_id: cycle_id.clone(),
                started_at,
                finished_at,
                total_files: reconciliation.inventory.len(),
                stats: stats.clone(),
                changes: reconciliation.changes.clone(),
                inventory_path: inventory_path.display().to_string(),
                object_key: object_key.clone(),
            })
            .await?;

        log_cycle_stats(&cycle_id, &stats);
        timer.finish_with_count(listing.len());

        Ok(CycleReport {
            cycle_id,
            started_at,
            finished_at,
            stats,
            inventory: reconciliation.inventory,
            changes: reconciliation.changes,
            inventory_path,
            object_key,
        })
    }

    async fn reconcile(
        &self,
        listing: &[RawFileDescriptor],
        history: &History,
    ) -> Reconciliation {
        if !requires_content(self.fingerprint.mode) {
            return self.reconciler.reconcile_listing(listing, history);
        }

        let (candidates, skipped) = self.reconciler.normalizer().normalize_all(listing);
        let observed = self.fingerprint_content(candidates).await;

        let mut reconciliation = self.reconciler.reconcile(observed, history);
        reconciliation.skipped = skipped;
        reconciliation
    }

    /// Downloads and hashes candidates with bounded parallelism, keeping listing order.
    async fn fingerprint_content(&self, candidates: Vec<CandidateFile>) -> Vec<ObservedFile> {
        let timer = OperationTimer::new("content fingerprinting");
        let progress = if self.show_progress {
            ProgressTracker::new(candidates.len())
        } else {
            ProgressTracker::hidden(candidates.len())
        };
        let progress = &progress;
        let read_timeout = self.fingerprint.read_timeout();

        info!(
            "Fingerprinting {} files with {} workers",
            candidates.len(),
            self.fingerprint.workers
        );

        let tasks = candidates.into_iter().map(|candidate| {
            let source = self.source.clone();
            async move {
                let descriptor = RawFileDescriptor {
                    name: candidate.name.clone(),
                    server_path: candidate.path.clone(),
                    ..RawFileDescriptor::default()
                };

                let outcome =
                    match tokio::time::timeout(read_timeout, source.read_bytes(&descriptor)).await {
                        Ok(Ok(bytes)) => FingerprintOutcome::from_content(&bytes),
                        Ok(Err(e)) => FingerprintOutcome::Failed(e.to_string()),
                        Err(_) => FingerprintOutcome::Failed(format!(
                            "read timed out after {}s",
                            read_timeout.as_secs()
                        )),
                    };

                if outcome.is_failed() {
                    progress.inc_failed();
                } else {
                    progress.inc_fingerprinted();
                }
                ObservedFile::new(candidate, outcome)
            }
        });

        let observed: Vec<ObservedFile> = stream::iter(tasks)
            .buffered(self.fingerprint.workers.max(1))
            .collect()
            .await;

        progress.finish();
        timer.finish();
        observed
    }

    async fn upload(&self, inventory: &[FileRecord], at: DateTime<Utc>) -> Option<String> {
        let uploader = self.uploader.as_ref()?;

        let rows: Vec<InventoryRow> = inventory.iter().map(InventoryRow::from).collect();
        let result = match to_csv_bytes(&rows) {
            Ok(bytes) => uploader.upload_inventory(bytes, at).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(key) => Some(key),
            Err(e) => {
                warn!("Inventory upload skipped for this cycle: {}", e);
                None
            }
        }
    }
}

fn log_cycle_stats(cycle_id: &str, stats: &CycleStats) {
    info!("=== Cycle {} Summary ===", cycle_id);
    info!("Files listed: {}", stats.files_listed);
    info!("Files skipped: {}", stats.files_skipped);
    info!(
        "New: {} | Modified: {} | Valid: {} | Errors: {}",
        stats.new_files, stats.modified_files, stats.valid_files, stats.error_files
    );
    info!("Changes detected: {}", stats.changes_detected);
    info!("Success rate: {:.2}%", stats.success_rate());
    info!("Processing speed: {:.2} files/sec", stats.files_per_second());
    info!("=================================");
}
