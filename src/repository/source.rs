// file: src/repository/source.rs
// description: listing adapter seam shared by the sharepoint and local sources
// reference: https://docs.rs/async-trait

use crate::config::{SourceConfig, SourceKind};
use crate::error::Result;
use crate::models::RawFileDescriptor;
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait FileSource: Send + Sync {
    /// Lists the files directly under `folder`.
    async fn list_files(&self, folder: &str) -> Result<Vec<RawFileDescriptor>>;

    /// Downloads the bytes of one listed file.
    async fn read_bytes(&self, descriptor: &RawFileDescriptor) -> Result<Vec<u8>>;

    /// Checks that the source can be reached at all.
    async fn ping(&self) -> Result<()>;

    fn describe(&self) -> String;
}

/// Builds the source selected by `source.kind`.
pub fn build_source(config: &SourceConfig) -> Result<Arc<dyn FileSource>> {
    match config.kind {
        SourceKind::Sharepoint => Ok(Arc::new(super::SharePointSource::from_config(config)?)),
        SourceKind::Local => Ok(Arc::new(super::LocalFolderSource::from_config(config))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_local_source() {
        let config = SourceConfig {
            kind: SourceKind::Local,
            local_root: "/tmp/docs".into(),
            ..SourceConfig::default()
        };

        let source = build_source(&config).unwrap();
        assert!(source.describe().contains("/tmp/docs"));
    }

    #[test]
    fn test_build_sharepoint_source() {
        let config = SourceConfig {
            kind: SourceKind::Sharepoint,
            site_url: "https://contoso.sharepoint.com/sites/team".to_string(),
            folder: "/sites/team/Shared Documents".to_string(),
            ..SourceConfig::default()
        };

        let source = build_source(&config).unwrap();
        assert!(source.describe().contains("contoso.sharepoint.com"));
    }
}
