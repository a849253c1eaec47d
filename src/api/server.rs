// file: src/api/server.rs
// description: router construction and the http server lifecycle
// reference: https://docs.rs/axum

use super::handlers::{
    AppState, anomalies_handler, change_feed_handler, changes_handler, cycle_history_handler,
    files_handler, replace_files_handler, root_handler, status_handler, trigger_cycle_handler,
};
use crate::error::{MonitorError, Result};
use axum::Router;
use axum::routing::{get, post};
use std::future::Future;
use tokio::net::TcpListener;
use tracing::info;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/status", get(status_handler))
        .route("/archivos", get(files_handler))
        .route("/historial", get(cycle_history_handler))
        .route("/novedades", get(change_feed_handler))
        .route("/cambios", get(changes_handler))
        .route("/anomalias", get(anomalies_handler))
        .route("/actualizar-archivos", post(replace_files_handler))
        .route("/actualizar", post(trigger_cycle_handler))
        .with_state(state)
}

pub async fn bind(addr: &str) -> Result<TcpListener> {
    TcpListener::bind(addr)
        .await
        .map_err(|e| MonitorError::Config(format!("cannot bind {}: {}", addr, e)))
}

/// Serves the API on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    info!("API listening on http://{}", addr);

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("API server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AnomalyConfig, Config, SourceKind};
    use crate::detection::AnomalyDetector;
    use crate::pipeline::CycleRunner;
    use crate::repository::LocalFolderSource;
    use reqwest::StatusCode;
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tempfile::TempDir;

    struct TestServer {
        base: String,
        _dir: TempDir,
    }

    async fn start() -> TestServer {
        let dir = TempDir::new().unwrap();
        let docs = dir.path().join("docs");
        std::fs::create_dir_all(&docs).unwrap();
        std::fs::write(docs.join("Report.pdf"), "one").unwrap();
        std::fs::write(docs.join("Report (1).pdf"), "two!").unwrap();
        std::fs::write(docs.join("Budget.xlsx"), "three").unwrap();

        let mut config = Config::default_config();
        config.source.kind = SourceKind::Local;
        config.source.local_root = docs.clone();
        config.storage.history_path = dir.path().join("history.json");
        config.storage.change_log_path = dir.path().join("changes.json");
        config.storage.cycle_log_path = dir.path().join("cycles.json");
        config.storage.inventory_path = dir.path().join("inventory.csv");

        let runner = Arc::new(CycleRunner::new(
            &config,
            Arc::new(LocalFolderSource::new(docs, vec![])),
        ));
        let detector = AnomalyDetector::from_config(&AnomalyConfig::default()).unwrap();
        let state = AppState::new(runner, detector, "Documentos compartidos");

        let listener = bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(serve(listener, state, std::future::pending()));

        TestServer { base, _dir: dir }
    }

    async fn get_json(url: String) -> (StatusCode, Value) {
        let response = reqwest::get(url).await.unwrap();
        let status = response.status();
        (status, response.json().await.unwrap())
    }

    #[tokio::test]
    async fn test_root_and_status() {
        let server = start().await;

        let (status, body) = get_json(format!("{}/", server.base)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["message"].is_string());

        let (status, body) = get_json(format!("{}/status", server.base)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["health"]["overall_status"], "degraded");
        assert_eq!(body["cycle_running"], false);
    }

    #[tokio::test]
    async fn test_inventory_missing_is_404() {
        let server = start().await;
        let (status, body) = get_json(format!("{}/archivos", server.base)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "not_found");
    }

    #[tokio::test]
    async fn test_trigger_then_query_endpoints() {
        let server = start().await;
        let client = reqwest::Client::new();

        let response = client
            .post(format!("{}/actualizar", server.base))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["total_files"], 3);
        assert_eq!(body["changes"].as_array().unwrap().len(), 3);

        let (_, files) = get_json(format!("{}/archivos", server.base)).await;
        assert_eq!(files["total_files"], 3);

        let (_, history) = get_json(format!("{}/historial", server.base)).await;
        assert_eq!(history["statistics"]["total_records"], 1);
        assert_eq!(history["statistics"]["total_changes"], 3);

        let (_, feed) = get_json(format!("{}/novedades", server.base)).await;
        assert_eq!(feed["total"], 3);
        assert_eq!(feed["changes"][0]["kind"], "NEW");

        let (_, anomalies) = get_json(format!("{}/anomalias", server.base)).await;
        assert_eq!(anomalies["summary"]["duplicate_name_groups"], 1);
        assert_eq!(anomalies["duplicate_by_name"][0]["normalized_name"], "Report.pdf");

        let (status, changes) = get_json(format!("{}/cambios", server.base)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(changes["report"]["summary"]["total_files"], 3);
        assert_eq!(changes["report"]["duplicates"]["total"], 1);
    }

    #[tokio::test]
    async fn test_replace_files_coerces_rows() {
        let server = start().await;
        let client = reqwest::Client::new();

        let response = client
            .post(format!("{}/actualizar-archivos", server.base))
            .json(&json!([
                {"name": "a.pdf", "size_kb": 1.5, "modified_at": "2024-01-01 10:00:00"},
                {"Nombre": "b.pdf", "Tamaño (KB)": "2"},
                {"name": "c.pdf", "size_kb": "huge"}
            ]))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["total_files"], 2);
        assert_eq!(body["skipped"], 1);

        let (_, files) = get_json(format!("{}/archivos", server.base)).await;
        assert_eq!(files["files"][1]["name"], "b.pdf");
        assert_eq!(files["files"][1]["state"], "VALID");
        assert_eq!(files["files"][1]["category"], "Documentos compartidos");

        let response = client
            .post(format!("{}/actualizar-archivos", server.base))
            .json(&json!({"name": "not a list"}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
