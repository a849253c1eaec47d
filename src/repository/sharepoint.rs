// file: src/repository/sharepoint.rs
// description: SharePoint REST listing and download adapter
// reference: https://learn.microsoft.com/sharepoint/dev/sp-add-ins/working-with-folders-and-files-with-rest

use super::source::FileSource;
use crate::config::SourceConfig;
use crate::error::{MonitorError, Result};
use crate::models::RawFileDescriptor;
use crate::utils::Validator;
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

const COLLABORATOR: &str = "sharepoint";
const ODATA_JSON: &str = "application/json;odata=nometadata";

#[derive(Debug, Deserialize)]
struct FileListResponse {
    #[serde(default)]
    value: Vec<SharePointFile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SharePointFile {
    #[serde(default)]
    name: String,
    #[serde(default)]
    server_relative_url: String,
    time_created: Option<String>,
    time_last_modified: Option<String>,
    // string on most tenants, number on some
    #[serde(default)]
    length: Value,
}

impl SharePointFile {
    fn length_bytes(&self) -> Option<i64> {
        match &self.length {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        }
    }

    fn into_descriptor(self) -> RawFileDescriptor {
        let length_bytes = self.length_bytes();
        RawFileDescriptor {
            name: self.name,
            server_path: Validator::sanitize_server_path(&self.server_relative_url),
            created_at: self.time_created,
            modified_at: self.time_last_modified,
            length_bytes,
        }
    }
}

pub struct SharePointSource {
    client: Client,
    site_url: String,
    access_token: Option<String>,
}

impl SharePointSource {
    pub fn new(client: Client, site_url: &str, access_token: Option<String>) -> Self {
        Self {
            client,
            site_url: site_url.trim_end_matches('/').to_string(),
            access_token,
        }
    }

    pub fn from_config(config: &SourceConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| MonitorError::Config(format!("failed to build http client: {}", e)))?;

        Ok(Self::new(
            client,
            &config.site_url,
            config.access_token.clone(),
        ))
    }

    fn folder_files_url(&self, folder: &str) -> String {
        format!(
            "{}/_api/web/GetFolderByServerRelativeUrl('{}')/Files",
            self.site_url,
            escape_literal(folder)
        )
    }

    fn file_content_url(&self, server_path: &str) -> String {
        format!(
            "{}/_api/web/GetFileByServerRelativeUrl('{}')/$value",
            self.site_url,
            escape_literal(server_path)
        )
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        let request = self.client.get(url).header(ACCEPT, ODATA_JSON);
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl FileSource for SharePointSource {
    async fn list_files(&self, folder: &str) -> Result<Vec<RawFileDescriptor>> {
        let url = self.folder_files_url(folder);
        debug!("Listing SharePoint folder: {}", url);

        let response = self.get(&url).send().await.map_err(|e| {
            MonitorError::unavailable(COLLABORATOR, format!("listing request failed: {}", e))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(MonitorError::unavailable(
                COLLABORATOR,
                format!(
                    "listing failed with status {}: {}",
                    status,
                    Validator::truncate_text(&error_text, 300)
                ),
            ));
        }

        let listing: FileListResponse = response.json().await.map_err(|e| {
            MonitorError::unavailable(COLLABORATOR, format!("failed to parse listing: {}", e))
        })?;

        let files: Vec<RawFileDescriptor> = listing
            .value
            .into_iter()
            .map(SharePointFile::into_descriptor)
            .collect();

        info!("SharePoint returned {} files from {}", files.len(), folder);
        Ok(files)
    }

    async fn read_bytes(&self, descriptor: &RawFileDescriptor) -> Result<Vec<u8>> {
        let url = self.file_content_url(&descriptor.server_path);

        let response = self
            .get(&url)
            .send()
            .await
            .map_err(|e| MonitorError::per_file(&descriptor.name, format!("download failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(MonitorError::per_file(
                &descriptor.name,
                format!("download failed with status {}", response.status()),
            ));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| MonitorError::per_file(&descriptor.name, format!("download failed: {}", e)))?;
        Ok(bytes.to_vec())
    }

    async fn ping(&self) -> Result<()> {
        let url = format!("{}/_api/web?$select=Title", self.site_url);
        let response = self.get(&url).send().await.map_err(|e| {
            MonitorError::unavailable(COLLABORATOR, format!("site unreachable: {}", e))
        })?;

        if !response.status().is_success() {
            return Err(MonitorError::unavailable(
                COLLABORATOR,
                format!("site answered with status {}", response.status()),
            ));
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("SharePoint site {}", self.site_url)
    }
}

/// Escapes a value for use inside a quoted OData string literal in a URL path.
fn escape_literal(value: &str) -> String {
    value
        .replace('%', "%25")
        .replace('\'', "''")
        .replace('#', "%23")
        .replace('?', "%3F")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Path;
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        format!("http://{}", addr)
    }

    fn listing_app() -> Router {
        Router::new()
            .route(
                "/_api/web/*rest",
                get(|Path(rest): Path<String>, headers: HeaderMap| async move {
                    let authorized = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        == Some("Bearer token-1");
                    if !authorized {
                        return (StatusCode::UNAUTHORIZED, Json(json!({}))).into_response();
                    }
                    if rest.ends_with("/$value") {
                        return "file bytes".into_response();
                    }
                    Json(json!({
                        "value": [
                            {
                                "Name": "Plan 2024.docx",
                                "ServerRelativeUrl": "/sites/team/Docs/Plan 2024.docx",
                                "TimeCreated": "2024-01-01T08:00:00Z",
                                "TimeLastModified": "2024-03-05T10:30:00Z",
                                "Length": "2048"
                            },
                            {
                                "Name": "Budget.xlsx",
                                "ServerRelativeUrl": "/sites/team/Docs/Budget.xlsx",
                                "TimeLastModified": "2024-03-06T10:30:00Z",
                                "Length": 512
                            }
                        ]
                    }))
                    .into_response()
                }),
            )
            .route("/_api/web", get(|| async { Json(json!({"Title": "Team"})) }))
    }

    #[test]
    fn test_escape_literal_doubles_quotes() {
        assert_eq!(escape_literal("/Docs/O'Brien"), "/Docs/O''Brien");
        assert_eq!(escape_literal("/Docs/a#b?c"), "/Docs/a%23b%3Fc");
    }

    #[test]
    fn test_length_coercion() {
        let file: SharePointFile = serde_json::from_value(json!({"Length": "77"})).unwrap();
        assert_eq!(file.length_bytes(), Some(77));
        let file: SharePointFile = serde_json::from_value(json!({"Length": 12})).unwrap();
        assert_eq!(file.length_bytes(), Some(12));
        let file: SharePointFile = serde_json::from_value(json!({"Length": "x"})).unwrap();
        assert_eq!(file.length_bytes(), None);
        let file: SharePointFile = serde_json::from_value(json!({})).unwrap();
        assert_eq!(file.length_bytes(), None);
    }

    #[tokio::test]
    async fn test_list_files_against_live_listener() {
        let base = serve(listing_app()).await;
        let source = SharePointSource::new(Client::new(), &base, Some("token-1".to_string()));

        let files = source.list_files("/sites/team/Docs").await.unwrap();

        assert_eq!(files.len(), 2);
        assert_eq!(files[0].name, "Plan 2024.docx");
        assert_eq!(files[0].length_bytes, Some(2048));
        assert_eq!(files[1].created_at, None);
        assert_eq!(files[1].length_bytes, Some(512));

        let bytes = source.read_bytes(&files[0]).await.unwrap();
        assert_eq!(bytes, b"file bytes");
        source.ping().await.unwrap();
    }

    #[tokio::test]
    async fn test_rejected_listing_is_unavailable() {
        let base = serve(listing_app()).await;
        let source = SharePointSource::new(Client::new(), &base, None);

        let err = source.list_files("/sites/team/Docs").await.unwrap_err();
        assert!(err.is_cycle_abort());
    }
}
