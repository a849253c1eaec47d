// file: src/exporter/object_store.rs
// description: uploads inventory snapshots to an s3-like object store over http
// reference: https://docs.rs/reqwest

use crate::config::ObjectStoreConfig;
use crate::error::{MonitorError, Result};
use crate::utils::Validator;
use chrono::{DateTime, Utc};
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_backoff_ms: 120,
        }
    }
}

impl RetryPolicy {
    /// Linear backoff before retry number `attempt` (1-based).
    pub fn backoff(&self, attempt: usize) -> Duration {
        Duration::from_millis(self.base_backoff_ms.saturating_mul(attempt as u64))
    }
}

pub struct ObjectStoreUploader {
    client: Client,
    endpoint: String,
    bucket: String,
    prefix: String,
    bearer_token: Option<String>,
    retry: RetryPolicy,
}

impl ObjectStoreUploader {
    pub fn new(endpoint: &str, bucket: &str, prefix: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            bucket: bucket.trim_matches('/').to_string(),
            prefix: prefix.trim_matches('/').to_string(),
            bearer_token: None,
            retry: RetryPolicy::default(),
        }
    }

    /// Returns `None` when uploads are disabled.
    pub fn from_config(config: &ObjectStoreConfig) -> Option<Self> {
        if !config.enabled {
            return None;
        }

        Some(
            Self::new(&config.endpoint, &config.bucket, &config.prefix)
                .with_bearer_token(config.bearer_token.clone())
                .with_retry(RetryPolicy {
                    max_attempts: config.max_attempts.max(1),
                    base_backoff_ms: config.base_backoff_ms,
                }),
        )
    }

    pub fn with_bearer_token(mut self, token: Option<String>) -> Self {
        self.bearer_token = token;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Object key for an inventory snapshot taken at `at`.
    pub fn inventory_key(&self, at: DateTime<Utc>) -> String {
        let file_name = format!("Documentos_SharePoint_{}.csv", at.format("%Y%m%d_%H%M%S"));
        if self.prefix.is_empty() {
            file_name
        } else {
            format!("{}/{}", self.prefix, file_name)
        }
    }

    fn object_url(&self, key: &str) -> String {
        format!(
            "{}/{}/{}",
            self.endpoint,
            self.bucket,
            key.trim_start_matches('/')
        )
    }

    /// PUTs `body` under `key`, retrying transient failures.
    pub async fn put(&self, key: &str, body: Vec<u8>) -> Result<()> {
        let url = self.object_url(key);
        let mut attempt = 0usize;

        loop {
            attempt += 1;
            let mut request = self
                .client
                .put(&url)
                .header(CONTENT_TYPE, "text/csv; charset=utf-8")
                .body(body.clone());
            if let Some(token) = &self.bearer_token {
                request = request.bearer_auth(token);
            }

            let failure = match request.send().await {
                Ok(response) if response.status().is_success() => {
                    debug!("Uploaded {} bytes to {}", body.len(), url);
                    return Ok(());
                }
                Ok(response) => {
                    let status = response.status();
                    let error_text = response.text().await.unwrap_or_default();
                    if status.is_client_error() {
                        return Err(MonitorError::ObjectStore(format!(
                            "upload of {} rejected with status {}: {}",
                            key,
                            status,
                            Validator::truncate_text(&error_text, 200)
                        )));
                    }
                    format!("status {}", status)
                }
                Err(e) => e.to_string(),
            };

            if attempt >= self.retry.max_attempts {
                return Err(MonitorError::ObjectStore(format!(
                    "upload of {} failed after {} attempts: {}",
                    key, attempt, failure
                )));
            }

            warn!(
                "Upload attempt {}/{} for {} failed: {}",
                attempt, self.retry.max_attempts, key, failure
            );
            tokio::time::sleep(self.retry.backoff(attempt)).await;
        }
    }

    /// Uploads an inventory snapshot and returns its key.
    pub async fn upload_inventory(&self, csv: Vec<u8>, at: DateTime<Utc>) -> Result<String> {
        let key = self.inventory_key(at);
        self.put(&key, csv).await?;
        info!("Inventory uploaded to {}/{}", self.bucket, key);
        Ok(key)
    }
}
