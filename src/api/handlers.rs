// file: src/api/handlers.rs
// description: http handlers for inventory, history, change feed and cycle triggers
// reference: https://docs.rs/axum

use crate::detection::AnomalyDetector;
use crate::error::MonitorError;
use crate::exporter::inventory::coerce_rows;
use crate::pipeline::CycleRunner;
use crate::store::CycleLogStore;
use crate::utils::{HealthCheck, HealthReport, HealthStatus};
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{error, info, warn};

use super::report::{anomaly_report, change_report};

#[derive(Clone)]
pub struct AppState {
    pub runner: Arc<CycleRunner>,
    pub detector: Arc<AnomalyDetector>,
    pub default_category: String,
}

impl AppState {
    pub fn new(
        runner: Arc<CycleRunner>,
        detector: AnomalyDetector,
        default_category: impl Into<String>,
    ) -> Self {
        Self {
            runner,
            detector: Arc::new(detector),
            default_category: default_category.into(),
        }
    }
}

/// Error body `{"error": {"code", "message"}}` with an HTTP status.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "invalid_request", message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<MonitorError> for ApiError {
    fn from(err: MonitorError) -> Self {
        let (status, code) = match &err {
            MonitorError::CycleInProgress => (StatusCode::CONFLICT, "cycle_in_progress"),
            MonitorError::CollaboratorUnavailable { .. } => {
                (StatusCode::SERVICE_UNAVAILABLE, "collaborator_unavailable")
            }
            MonitorError::Validation(_) | MonitorError::PerFile { .. } => {
                (StatusCode::BAD_REQUEST, "invalid_request")
            }
            MonitorError::Serialization(_) => (StatusCode::INTERNAL_SERVER_ERROR, "write_failed"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };
        Self::new(status, code, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!("{} {}: {}", self.status, self.code, self.message);
        }
        let body = Json(json!({
            "error": {
                "code": self.code,
                "message": self.message,
            }
        }));
        (self.status, body).into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

async fn load_inventory(state: &AppState) -> ApiResult<Vec<crate::exporter::InventoryRow>> {
    let sink = state.runner.inventory_sink();
    if !sink.exists() {
        return Err(ApiError::not_found(format!(
            "no inventory found at {}",
            sink.path().display()
        )));
    }
    Ok(sink.load().await?)
}

pub async fn root_handler() -> impl IntoResponse {
    Json(json!({
        "message": "SharePoint document monitor API",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let runner = &state.runner;
    let source = runner.source();

    let mut checks = vec![
        HealthCheck::probe("source", HealthStatus::Unhealthy, source.ping()).await,
        HealthCheck::probe(
            "history store",
            HealthStatus::Unhealthy,
            runner.history_store().load(),
        )
        .await,
    ];

    if runner.inventory_sink().exists() {
        checks.push(HealthCheck::healthy("inventory", std::time::Duration::ZERO));
    } else {
        checks.push(HealthCheck::degraded(
            "inventory",
            "no inventory written yet".to_string(),
            std::time::Duration::ZERO,
        ));
    }

    let report = HealthReport::new(checks, env!("CARGO_PKG_VERSION").to_string());
    let status = if report.overall_status == HealthStatus::Unhealthy {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    (
        status,
        Json(json!({
            "health": report,
            "cycle_running": runner.is_running(),
            "source": source.describe(),
        })),
    )
}

pub async fn files_handler(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let rows = load_inventory(&state).await?;
    Ok(Json(json!({
        "status": "success",
        "timestamp": Utc::now().to_rfc3339(),
        "total_files": rows.len(),
        "files": rows,
    })))
}

pub async fn cycle_history_handler(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let records = state.runner.cycle_log().load().await?;
    let statistics = CycleLogStore::stats(&records);
    Ok(Json(json!({
        "statistics": statistics,
        "history": records,
    })))
}

pub async fn change_feed_handler(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let entries = state.runner.change_log().load().await?;
    Ok(Json(json!({
        "total": entries.len(),
        "changes": entries,
    })))
}

pub async fn changes_handler(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let rows = load_inventory(&state).await?;
    let history = state.runner.history_store().load().await?;
    let report = change_report(&rows, &history, &state.detector);
    Ok(Json(json!({
        "status": "success",
        "timestamp": Utc::now().to_rfc3339(),
        "report": report,
    })))
}

pub async fn anomalies_handler(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let rows = load_inventory(&state).await?;
    let history = state.runner.history_store().load().await?;
    let report = anomaly_report(&rows, &history, &state.detector);
    Ok(Json(json!(report)))
}

pub async fn replace_files_handler(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> ApiResult<Json<Value>> {
    let Some(values) = payload.as_array() else {
        return Err(ApiError::bad_request("expected a json array of rows"));
    };

    let (rows, skipped) = coerce_rows(values, &state.default_category);
    if skipped > 0 {
        warn!("Skipped {} unusable rows in inventory update", skipped);
    }

    let written = state.runner.inventory_sink().write_rows(&rows).await?;
    info!("Inventory replaced through the API with {} rows", rows.len());

    Ok(Json(json!({
        "status": "success",
        "message": "inventory updated",
        "timestamp": Utc::now().to_rfc3339(),
        "total_files": rows.len(),
        "skipped": skipped,
        "path": written.display().to_string(),
    })))
}

pub async fn trigger_cycle_handler(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let report = state.runner.try_run_cycle().await?;
    Ok(Json(json!({
        "status": "success",
        "cycle_id": report.cycle_id,
        "finished_at": report.finished_at.to_rfc3339(),
        "total_files": report.inventory.len(),
        "changes": report.changes,
        "stats": report.stats,
        "object_key": report.object_key,
    })))
}
