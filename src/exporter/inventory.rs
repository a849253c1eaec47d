// file: src/exporter/inventory.rs
// description: tabular inventory sink written as csv with a single fallback path
// reference: https://docs.rs/csv

use crate::error::{MonitorError, Result};
use crate::models::{FileRecord, FileState, timestamp};
use crate::store::atomic::write_atomic;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// One row of the inventory table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryRow {
    pub name: String,
    pub path: String,
    pub url: String,
    #[serde(rename = "type")]
    pub file_type: String,
    pub created_at: String,
    pub modified_at: String,
    pub size_kb: f64,
    pub category: String,
    pub state: String,
}

impl From<&FileRecord> for InventoryRow {
    fn from(record: &FileRecord) -> Self {
        Self {
            name: record.name.clone(),
            path: record.path.clone(),
            url: record.link.clone(),
            file_type: record.file_type.clone(),
            created_at: timestamp::format_optional(record.created_at.as_ref()),
            modified_at: timestamp::format_table(&record.modified_at),
            size_kb: record.size_kb,
            category: record.category.clone(),
            state: record.state.to_string(),
        }
    }
}

impl InventoryRow {
    pub fn modified_at(&self) -> Option<DateTime<Utc>> {
        timestamp::parse(&self.modified_at)
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        timestamp::parse(&self.created_at)
    }

    pub fn state(&self) -> Option<FileState> {
        self.state.parse().ok()
    }
}

/// Field names accepted for each column, canonical name first.
const NAME_KEYS: &[&str] = &["name", "Nombre"];
const PATH_KEYS: &[&str] = &["path", "Ruta"];
const URL_KEYS: &[&str] = &["url", "URL"];
const TYPE_KEYS: &[&str] = &["type", "Tipo Archivo"];
const CREATED_KEYS: &[&str] = &["created_at", "Fecha Creación"];
const MODIFIED_KEYS: &[&str] = &["modified_at", "Fecha Modificación"];
const SIZE_KEYS: &[&str] = &["size_kb", "Tamaño (KB)"];
const CATEGORY_KEYS: &[&str] = &["category", "Categoría"];
const STATE_KEYS: &[&str] = &["state", "Estado"];

fn field<'a>(object: &'a serde_json::Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| object.get(*key))
        .find(|value| !value.is_null())
}

fn text(object: &serde_json::Map<String, Value>, keys: &[&str], default: &str) -> String {
    match field(object, keys) {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => default.to_string(),
    }
}

/// Coerces a loosely-typed json row into an inventory row, field by field.
/// Returns `None` when the row is not an object or its size is not numeric.
pub fn coerce_row(value: &Value, default_category: &str) -> Option<InventoryRow> {
    let object = value.as_object()?;

    let size_kb = match field(object, SIZE_KEYS) {
        None => 0.0,
        Some(Value::Number(n)) => n.as_f64()?,
        Some(Value::String(s)) => s.trim().parse::<f64>().ok()?,
        Some(Value::Bool(b)) => f64::from(u8::from(*b)),
        Some(_) => return None,
    };

    Some(InventoryRow {
        name: text(object, NAME_KEYS, ""),
        path: text(object, PATH_KEYS, ""),
        url: text(object, URL_KEYS, ""),
        file_type: text(object, TYPE_KEYS, timestamp::MISSING),
        created_at: text(object, CREATED_KEYS, timestamp::MISSING),
        modified_at: text(object, MODIFIED_KEYS, timestamp::MISSING),
        size_kb,
        category: text(object, CATEGORY_KEYS, default_category),
        state: text(object, STATE_KEYS, FileState::Valid.as_str()),
    })
}

/// Coerces every row, skipping and logging the ones that cannot be used.
pub fn coerce_rows(values: &[Value], default_category: &str) -> (Vec<InventoryRow>, usize) {
    let mut rows = Vec::with_capacity(values.len());
    let mut skipped = 0;

    for (index, value) in values.iter().enumerate() {
        match coerce_row(value, default_category) {
            Some(row) => rows.push(row),
            None => {
                warn!("Skipping unusable inventory row at index {}", index);
                skipped += 1;
            }
        }
    }

    (rows, skipped)
}

pub fn to_csv_bytes(rows: &[InventoryRow]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| MonitorError::Serialization(format!("failed to flush csv: {}", e)))
}

#[derive(Debug, Clone)]
pub struct InventorySink {
    path: PathBuf,
}

impl InventorySink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Fallback target `<stem>_<unix-seconds>.csv` beside the configured path.
    pub fn fallback_path(&self, at: DateTime<Utc>) -> PathBuf {
        let stem = self
            .path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("inventory");
        self.path
            .with_file_name(format!("{}_{}.csv", stem, at.timestamp()))
    }

    pub async fn write_records(&self, records: &[FileRecord]) -> Result<PathBuf> {
        let rows: Vec<InventoryRow> = records.iter().map(InventoryRow::from).collect();
        self.write_rows(&rows).await
    }

    /// Writes the table and returns the path actually written.
    pub async fn write_rows(&self, rows: &[InventoryRow]) -> Result<PathBuf> {
        let bytes = to_csv_bytes(rows)?;

        match write_atomic(&self.path, &bytes).await {
            Ok(()) => {
                info!("Inventory with {} rows written to {:?}", rows.len(), self.path);
                Ok(self.path.clone())
            }
            Err(primary) => {
                let fallback = self.fallback_path(Utc::now());
                warn!(
                    "Inventory write to {:?} failed ({}), trying {:?}",
                    self.path, primary, fallback
                );
                write_atomic(&fallback, &bytes).await.map_err(|e| {
                    error!("Inventory fallback write failed: {}", e);
                    MonitorError::Serialization(format!(
                        "inventory could not be written to {:?} or {:?}: {}",
                        self.path, fallback, e
                    ))
                })?;
                info!("Inventory written to fallback {:?}", fallback);
                Ok(fallback)
            }
        }
    }

    /// Reads the table, skipping rows that do not parse.
    pub async fn load(&self) -> Result<Vec<InventoryRow>> {
        let contents = tokio::fs::read(&self.path)
            .await
            .map_err(|source| MonitorError::FileOperation {
                path: self.path.clone(),
                source,
            })?;

        let mut reader = csv::Reader::from_reader(contents.as_slice());
        let mut rows = Vec::new();
        for (index, result) in reader.deserialize::<InventoryRow>().enumerate() {
            match result {
                Ok(row) => rows.push(row),
                Err(e) => warn!("Skipping inventory row {}: {}", index + 1, e),
            }
        }

        Ok(rows)
    }
}
