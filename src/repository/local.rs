// file: src/repository/local.rs
// description: directory-backed file source for offline runs
// reference: https://docs.rs/walkdir

use super::source::FileSource;
use crate::config::SourceConfig;
use crate::error::{MonitorError, Result};
use crate::models::RawFileDescriptor;
use crate::utils::Validator;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info};
use walkdir::WalkDir;

const COLLABORATOR: &str = "local folder";

#[derive(Debug, Clone)]
pub struct LocalFolderSource {
    root: PathBuf,
    skip_patterns: Vec<String>,
}

impl LocalFolderSource {
    pub fn new(root: impl Into<PathBuf>, skip_patterns: Vec<String>) -> Self {
        Self {
            root: root.into(),
            skip_patterns,
        }
    }

    pub fn from_config(config: &SourceConfig) -> Self {
        Self::new(config.local_root.clone(), config.skip_patterns.clone())
    }

    fn resolve(&self, server_path: &str) -> PathBuf {
        let relative = server_path.trim_start_matches('/');
        if relative.is_empty() {
            self.root.clone()
        } else {
            self.root.join(relative)
        }
    }

    fn scan_directory(&self, folder: &Path) -> Result<Vec<RawFileDescriptor>> {
        Validator::validate_directory(folder)
            .map_err(|e| MonitorError::unavailable(COLLABORATOR, e.to_string()))?;

        info!("Scanning directory: {}", folder.display());
        let mut files = Vec::new();

        for entry in WalkDir::new(folder)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if self.should_skip(path) {
                debug!("Skipping file: {}", path.display());
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(e) => {
                    debug!("Cannot stat {}: {}", path.display(), e);
                    continue;
                }
            };

            let relative_path = path
                .strip_prefix(&self.root)
                .unwrap_or(path)
                .to_string_lossy()
                .replace('\\', "/");

            files.push(RawFileDescriptor {
                name: entry.file_name().to_string_lossy().to_string(),
                server_path: format!("/{}", relative_path.trim_start_matches('/')),
                created_at: metadata.created().ok().map(to_rfc3339),
                modified_at: metadata.modified().ok().map(to_rfc3339),
                length_bytes: i64::try_from(metadata.len()).ok(),
            });
        }

        info!("Found {} files", files.len());
        Ok(files)
    }

    fn should_skip(&self, path: &Path) -> bool {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();
        let path_str = path.to_string_lossy();

        self.skip_patterns.iter().any(|pattern| {
            if let Some(suffix) = pattern.strip_prefix('*') {
                file_name.ends_with(suffix)
            } else if let Some(prefix) = pattern.strip_suffix('*') {
                file_name.starts_with(prefix)
            } else {
                path_str.contains(pattern.as_str())
            }
        })
    }
}

fn to_rfc3339(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).to_rfc3339()
}

#[async_trait]
impl FileSource for LocalFolderSource {
    async fn list_files(&self, folder: &str) -> Result<Vec<RawFileDescriptor>> {
        let source = self.clone();
        let folder = self.resolve(folder);

        tokio::task::spawn_blocking(move || source.scan_directory(&folder))
            .await
            .map_err(|e| MonitorError::unavailable(COLLABORATOR, format!("scan task failed: {}", e)))?
    }

    async fn read_bytes(&self, descriptor: &RawFileDescriptor) -> Result<Vec<u8>> {
        let path = self.resolve(&descriptor.server_path);
        Validator::validate_within_base_dir(&path, &self.root)
            .map_err(|e| MonitorError::per_file(&descriptor.name, e.to_string()))?;

        tokio::fs::read(&path)
            .await
            .map_err(|e| MonitorError::per_file(&descriptor.name, format!("read failed: {}", e)))
    }

    async fn ping(&self) -> Result<()> {
        Validator::validate_directory(&self.root)
            .map_err(|e| MonitorError::unavailable(COLLABORATOR, e.to_string()))
    }

    fn describe(&self) -> String {
        format!("local folder {}", self.root.display())
    }
}
