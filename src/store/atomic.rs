// file: src/store/atomic.rs
// description: write-to-temp-then-rename helpers shared by the json stores

use crate::error::{MonitorError, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("snapshot");
    path.with_file_name(format!(".{}.{}.tmp", file_name, Uuid::new_v4().simple()))
}

async fn write_temp(tmp: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(tmp).await?;
    file.write_all(bytes).await?;
    file.sync_all().await
}

/// Replaces `path` with `bytes` so readers observe either the old or the new file.
/// Every call stages its own temp file, so concurrent writers to one path never share it.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|source| MonitorError::FileOperation {
                path: parent.to_path_buf(),
                source,
            })?;
    }

    let tmp = temp_path_for(path);

    if let Err(source) = write_temp(&tmp, bytes).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(MonitorError::FileOperation { path: tmp, source });
    }

    if let Err(source) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(MonitorError::FileOperation {
            path: path.to_path_buf(),
            source,
        });
    }

    Ok(())
}

pub async fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let contents = serde_json::to_vec_pretty(value)
        .map_err(|e| MonitorError::Serialization(format!("{}: {}", path.display(), e)))?;
    write_atomic(path, &contents).await
}

/// Reads a json document, returning `T::default()` when the file does not exist.
pub async fn read_json_or_default<T>(path: &Path, collaborator: &'static str) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    let contents = match fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(T::default()),
        Err(e) => {
            return Err(MonitorError::unavailable(
                collaborator,
                format!("failed to read {}: {}", path.display(), e),
            ));
        }
    };

    serde_json::from_str(&contents).map_err(|e| {
        MonitorError::unavailable(
            collaborator,
            format!("failed to parse {}: {}", path.display(), e),
        )
    })
}
