// file: src/pipeline/progress.rs
// description: progress tracking and statistics reporting for reconciliation cycles
// reference: uses indicatif for progress bars and tracks processing metrics

use crate::detection::Reconciliation;
use crate::models::FileState;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CycleStats {
    pub files_listed: usize,
    pub files_skipped: usize,
    pub new_files: usize,
    pub modified_files: usize,
    pub valid_files: usize,
    pub error_files: usize,
    pub changes_detected: usize,
    pub duration_ms: u64,
}

impl CycleStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_reconciliation(
        reconciliation: &Reconciliation,
        files_listed: usize,
        duration: Duration,
    ) -> Self {
        Self {
            files_listed,
            files_skipped: reconciliation.skipped,
            new_files: reconciliation.count(FileState::New),
            modified_files: reconciliation.count(FileState::Modified),
            valid_files: reconciliation.count(FileState::Valid),
            error_files: reconciliation.count(FileState::Error),
            changes_detected: reconciliation.changes.len(),
            duration_ms: duration.as_millis() as u64,
        }
    }

    pub fn files_in_inventory(&self) -> usize {
        self.new_files + self.modified_files + self.valid_files + self.error_files
    }

    pub fn files_per_second(&self) -> f64 {
        if self.duration_ms == 0 {
            return 0.0;
        }
        self.files_listed as f64 / (self.duration_ms as f64 / 1000.0)
    }

    /// Share of listed files that were fingerprinted without error.
    pub fn success_rate(&self) -> f64 {
        if self.files_listed == 0 {
            return 0.0;
        }
        let healthy = self.files_in_inventory() - self.error_files;
        (healthy as f64 / self.files_listed as f64) * 100.0
    }
}

pub struct ProgressTracker {
    main_bar: ProgressBar,
    detail_bar: ProgressBar,
    files_fingerprinted: Arc<AtomicUsize>,
    files_failed: Arc<AtomicUsize>,
}

impl ProgressTracker {
    pub fn new(total_files: usize) -> Self {
        Self::with_color(total_files, true)
    }

    /// Tracker that counts without drawing, for unattended cycles.
    pub fn hidden(total_files: usize) -> Self {
        let tracker = Self::with_color(total_files, false);
        tracker.main_bar.set_draw_target(ProgressDrawTarget::hidden());
        tracker.detail_bar.set_draw_target(ProgressDrawTarget::hidden());
        tracker
    }

    pub fn with_color(total_files: usize, colored: bool) -> Self {
        let multi_progress = MultiProgress::new();

        let main_bar = create_progress_bar(&multi_progress, total_files as u64, colored);
        let detail_bar = create_detail_bar(&multi_progress);

        Self {
            main_bar,
            detail_bar,
            files_fingerprinted: Arc::new(AtomicUsize::new(0)),
            files_failed: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn inc_fingerprinted(&self) {
        self.files_fingerprinted.fetch_add(1, Ordering::SeqCst);
        self.main_bar.inc(1);
        self.update_detail_bar();
    }

    pub fn inc_failed(&self) {
        self.files_failed.fetch_add(1, Ordering::SeqCst);
        self.main_bar.inc(1);
        self.update_detail_bar();
    }

    pub fn set_message(&self, message: String) {
        self.detail_bar.set_message(message);
    }

    pub fn fingerprinted(&self) -> usize {
        self.files_fingerprinted.load(Ordering::SeqCst)
    }

    pub fn failed(&self) -> usize {
        self.files_failed.load(Ordering::SeqCst)
    }

    pub fn finish(&self) {
        self.main_bar.finish_with_message("Fingerprinting complete");
        self.detail_bar.finish_and_clear();
    }

    fn update_detail_bar(&self) {
        let message = format!(
            "Fingerprinted: {} | Unreadable: {}",
            self.fingerprinted(),
            self.failed()
        );

        self.detail_bar.set_message(message);
    }
}

impl Drop for ProgressTracker {
    fn drop(&mut self) {
        self.finish();
    }
}

fn create_progress_bar(multi_progress: &MultiProgress, total: u64, colored: bool) -> ProgressBar {
    let bar = multi_progress.add(ProgressBar::new(total));
    let (template, chars) = if colored {
        (
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
            "█▓▒░",
        )
    } else {
        (
            "{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({eta}) {msg}",
            "=>-",
        )
    };

    if let Ok(style) = ProgressStyle::default_bar().template(template) {
        bar.set_style(style.progress_chars(chars));
    }
    bar
}

fn create_detail_bar(multi_progress: &MultiProgress) -> ProgressBar {
    let bar = multi_progress.add(ProgressBar::new(0));
    if let Ok(style) = ProgressStyle::default_bar().template("{msg}") {
        bar.set_style(style);
    }
    bar
}
