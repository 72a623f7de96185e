//! HTTP implementation of `RemoteApi` against the data-logger's JSON routes

use super::{
    AnalysisRange, AnalysisResponse, ColumnsResponse, ControlResponse, FileSource, PlotResponse,
    RawReadings, RemoteApi, Settings, StatusResponse, VisualizationType,
};
use crate::error::ApiError;
use crate::schedule::ScheduleRequest;
use anyhow::{Context, Result};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;

/// reqwest-backed client for one service instance
#[derive(Clone)]
pub struct HttpApi {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpApi {
    /// Build a client for `base_url` with a per-request timeout
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid service URL: {}", base_url))?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(4)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Append path segments to the base URL, escaping each one
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Only cannot-be-a-base URLs (mailto: and friends) refuse segments
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ApiError> {
        let url = self.endpoint(segments);
        tracing::trace!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ApiError::Transient(format!("Request failed: {}", e)))?;
        read_json(response).await
    }

    async fn post<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        body: &Value,
    ) -> Result<T, ApiError> {
        let url = self.endpoint(segments);
        tracing::trace!("POST {}", url);
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| ApiError::Transient(format!("Request failed: {}", e)))?;
        read_json(response).await
    }

    /// POST to a route that reports failures as `{status: "error", message}`
    async fn control<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        body: &Value,
    ) -> Result<T, ApiError> {
        let value: Value = self.post(segments, body).await?;
        if value.get("status").and_then(Value::as_str) == Some("error") {
            let message = value
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("The service reported an error");
            return Err(ApiError::Rejected(message.to_string()));
        }
        serde_json::from_value(value)
            .map_err(|e| ApiError::Transient(format!("Unexpected response shape: {}", e)))
    }
}

/// Classify a response body
///
/// A JSON `error` field wins over the HTTP status: the service reports
/// validation problems as 400 + `{error}` and analysis failures as 200 + `{error}`.
async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ApiError::Transient(format!("Failed to read response: {}", e)))?;

    let value: Value = serde_json::from_str(&body).map_err(|e| {
        ApiError::Transient(format!("HTTP {}: response is not JSON ({})", status, e))
    })?;

    if let Some(message) = value.get("error").and_then(Value::as_str) {
        return Err(ApiError::Rejected(message.to_string()));
    }

    if !status.is_success() {
        return Err(ApiError::Transient(format!("HTTP {}", status)));
    }

    serde_json::from_value(value)
        .map_err(|e| ApiError::Transient(format!("Unexpected response shape: {}", e)))
}

impl RemoteApi for HttpApi {
    async fn status(&self) -> Result<StatusResponse, ApiError> {
        self.get(&["api", "schedules", "status"]).await
    }

    async fn latest(&self) -> Result<RawReadings, ApiError> {
        self.get(&["api", "latest"]).await
    }

    async fn start_default(&self) -> Result<ControlResponse, ApiError> {
        self.control(&["api", "schedules", "set"], &json!({ "mode": "default" }))
            .await
    }

    async fn stop_and_clear(&self) -> Result<ControlResponse, ApiError> {
        self.control(&["api", "schedules", "clear"], &json!({})).await
    }

    async fn schedule(&self, request: &ScheduleRequest) -> Result<(), ApiError> {
        let body = serde_json::to_value(request)
            .map_err(|e| ApiError::Transient(format!("Failed to encode schedule: {}", e)))?;
        // Default mode answers with the logger's start result
        let _: Value = self.control(&["api", "schedules", "set"], &body).await?;
        Ok(())
    }

    async fn settings(&self) -> Result<Settings, ApiError> {
        self.get(&["api", "settings"]).await
    }

    async fn list_files(&self, source: FileSource) -> Result<Vec<String>, ApiError> {
        self.get(&["api", source.as_str()]).await
    }

    async fn analyze(
        &self,
        name: &str,
        range: &AnalysisRange,
    ) -> Result<AnalysisResponse, ApiError> {
        let body = serde_json::to_value(range)
            .map_err(|e| ApiError::Transient(format!("Failed to encode range: {}", e)))?;
        self.post(&["api", "analyze", name], &body).await
    }

    async fn visualization_types(&self) -> Result<Vec<VisualizationType>, ApiError> {
        self.get(&["api", "visualization-types"]).await
    }

    async fn columns(&self, name: &str) -> Result<ColumnsResponse, ApiError> {
        self.get(&["api", "columns", name]).await
    }

    async fn visualize(
        &self,
        name: &str,
        plot_type: &str,
        columns: Option<&[String]>,
    ) -> Result<PlotResponse, ApiError> {
        match columns {
            Some(columns) => {
                self.post(
                    &["api", "visualize", "custom", name],
                    &json!({ "columns": columns }),
                )
                .await
            }
            None => self.get(&["api", "visualize", name, plot_type]).await,
        }
    }

    fn file_url(&self, source: FileSource, name: &str) -> String {
        self.endpoint(&["api", source.as_str(), name]).to_string()
    }

    fn resolve_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        self.base_url
            .join(path)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| path.to_string())
    }
}
