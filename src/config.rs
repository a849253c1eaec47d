// file: src/config.rs
// description: application configuration management with toml support
// reference: https://docs.rs/config

use crate::error::{MonitorError, Result};
use crate::utils::Validator;
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub fingerprint: FingerprintConfig,
    #[serde(default)]
    pub classification: ClassificationConfig,
    #[serde(default)]
    pub anomaly: AnomalyConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub object_store: ObjectStoreConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Sharepoint,
    Local,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SourceConfig {
    pub kind: SourceKind,
    pub site_url: String,
    pub folder: String,
    /// Pre-issued bearer token for the SharePoint REST API.
    pub access_token: Option<String>,
    pub local_root: PathBuf,
    pub skip_patterns: Vec<String>,
    /// Overrides the origin used to build file links.
    pub link_base: Option<String>,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    pub history_path: PathBuf,
    pub change_log_path: PathBuf,
    pub cycle_log_path: PathBuf,
    pub inventory_path: PathBuf,
    pub max_cycle_records: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub interval_secs: u64,
    pub run_on_start: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FingerprintMode {
    /// Digest over `name|modified_at|size_kb`.
    Metadata,
    /// Digest over the downloaded file bytes.
    Content,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FingerprintConfig {
    pub mode: FingerprintMode,
    pub workers: usize,
    pub read_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClassificationConfig {
    pub default_category: String,
    pub categories: Vec<CategoryRule>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CategoryRule {
    pub keywords: Vec<String>,
    pub category: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AnomalyConfig {
    pub version_suffix_patterns: Vec<String>,
    pub case_insensitive: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObjectStoreConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub bucket: String,
    pub prefix: String,
    pub bearer_token: Option<String>,
    pub max_attempts: usize,
    pub base_backoff_ms: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::Sharepoint,
            site_url: String::new(),
            folder: String::new(),
            access_token: None,
            local_root: PathBuf::from("./documents"),
            skip_patterns: vec!["~$*".to_string(), ".DS_Store".to_string()],
            link_base: None,
            request_timeout_secs: 60,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            history_path: PathBuf::from("data/history/historial_archivos.json"),
            change_log_path: PathBuf::from("data/history/novedades.json"),
            cycle_log_path: PathBuf::from("data/history/historial_completo.json"),
            inventory_path: PathBuf::from("output/Documentos_SharePoint.csv"),
            max_cycle_records: 500,
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_secs: 300,
            run_on_start: true,
        }
    }
}

impl Default for FingerprintConfig {
    fn default() -> Self {
        Self {
            mode: FingerprintMode::Metadata,
            workers: 20,
            read_timeout_secs: 30,
        }
    }
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            default_category: "Documentos compartidos".to_string(),
            categories: vec![],
        }
    }
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            version_suffix_patterns: vec![r"\s*\(\d+\)".to_string()],
            case_insensitive: false,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8300,
        }
    }
}

impl Default for ObjectStoreConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: String::new(),
            bucket: String::new(),
            prefix: "documentos".to_string(),
            bearer_token: None,
            max_attempts: 4,
            base_backoff_ms: 120,
        }
    }
}

impl SourceConfig {
    /// Origin prepended to server paths when building file links.
    pub fn resolved_link_base(&self) -> String {
        if let Some(base) = &self.link_base {
            return base.trim_end_matches('/').to_string();
        }

        match self.kind {
            SourceKind::Local => "file://".to_string(),
            SourceKind::Sharepoint => reqwest::Url::parse(&self.site_url)
                .map(|url| url.origin().ascii_serialization())
                .unwrap_or_else(|_| self.site_url.trim_end_matches('/').to_string()),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl SchedulerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl FingerprintConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }
}

impl ApiConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv().ok();

        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        } else {
            builder = builder.add_source(
                config::File::from(Path::new("config/default.toml")).required(false),
            );
        }

        builder = builder.add_source(
            config::Environment::with_prefix("SP_MONITOR")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .map_err(|e| MonitorError::Config(e.to_string()))?;

        let config: Config = settings
            .try_deserialize()
            .map_err(|e| MonitorError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self {
            source: SourceConfig::default(),
            storage: StorageConfig::default(),
            scheduler: SchedulerConfig::default(),
            fingerprint: FingerprintConfig::default(),
            classification: ClassificationConfig::default(),
            anomaly: AnomalyConfig::default(),
            api: ApiConfig::default(),
            object_store: ObjectStoreConfig::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.fingerprint.workers == 0 {
            return Err(MonitorError::Config(
                "fingerprint.workers must be greater than 0".to_string(),
            ));
        }

        if self.fingerprint.read_timeout_secs == 0 {
            return Err(MonitorError::Config(
                "fingerprint.read_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.scheduler.interval_secs == 0 {
            return Err(MonitorError::Config(
                "scheduler.interval_secs must be greater than 0".to_string(),
            ));
        }

        if self.storage.max_cycle_records == 0 {
            return Err(MonitorError::Config(
                "storage.max_cycle_records must be greater than 0".to_string(),
            ));
        }

        if self.source.kind == SourceKind::Sharepoint {
            Validator::validate_url(&self.source.site_url)
                .map_err(|e| MonitorError::Config(format!("source.site_url: {}", e)))?;
            if self.source.folder.trim().is_empty() {
                return Err(MonitorError::Config(
                    "source.folder is required for the sharepoint source".to_string(),
                ));
            }
        }

        if self.object_store.enabled {
            Validator::validate_url(&self.object_store.endpoint)
                .map_err(|e| MonitorError::Config(format!("object_store.endpoint: {}", e)))?;
            if self.object_store.bucket.trim().is_empty() {
                return Err(MonitorError::Config(
                    "object_store.bucket is required when uploads are enabled".to_string(),
                ));
            }
        }

        Validator::validate_port(self.api.port)
            .map_err(|e| MonitorError::Config(format!("api.port: {}", e)))?;

        for pattern in &self.anomaly.version_suffix_patterns {
            regex::Regex::new(pattern).map_err(|e| {
                MonitorError::Config(format!("invalid version suffix pattern {:?}: {}", pattern, e))
            })?;
        }

        Ok(())
    }
}
