//! Scripted in-memory `RemoteApi` for tests
//!
//! Every call is recorded as a short key (e.g. `"visualize:a.csv:1"`) so tests
//! can assert which requests were issued. Per-key delays let navigator tests
//! stage out-of-order completions under a paused clock.

use super::{
    AnalysisRange, AnalysisResponse, ColumnsResponse, ControlResponse, FileSource, PlotResponse,
    RawReadings, RemoteApi, Settings, StatusResponse, VisualizationType,
};
use crate::error::ApiError;
use crate::schedule::ScheduleRequest;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

type Scripted<T> = Mutex<HashMap<String, Result<T, ApiError>>>;

#[derive(Default)]
pub struct FakeApi {
    statuses: Mutex<VecDeque<Result<StatusResponse, ApiError>>>,
    latest: Mutex<Option<Result<RawReadings, ApiError>>>,
    settings: Mutex<Option<Result<Settings, ApiError>>>,
    schedule_result: Mutex<Option<ApiError>>,
    files: Scripted<Vec<String>>,
    analyses: Scripted<AnalysisResponse>,
    columns: Scripted<ColumnsResponse>,
    plots: Scripted<PlotResponse>,
    viz_types: Mutex<Option<Result<Vec<VisualizationType>, ApiError>>>,
    delays: Mutex<HashMap<String, Duration>>,
    calls: Mutex<Vec<String>>,
    schedules: Mutex<Vec<ScheduleRequest>>,
}

fn not_scripted(key: &str) -> ApiError {
    ApiError::Transient(format!("nothing scripted for {}", key))
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a status result; the last queued one repeats forever
    pub fn push_status(&self, status: Result<StatusResponse, ApiError>) {
        self.statuses.lock().unwrap().push_back(status);
    }

    pub fn set_latest(&self, latest: Result<RawReadings, ApiError>) {
        *self.latest.lock().unwrap() = Some(latest);
    }

    pub fn set_settings(&self, settings: Result<Settings, ApiError>) {
        *self.settings.lock().unwrap() = Some(settings);
    }

    pub fn reject_schedules(&self, error: ApiError) {
        *self.schedule_result.lock().unwrap() = Some(error);
    }

    pub fn set_files(&self, source: FileSource, files: Result<Vec<String>, ApiError>) {
        self.files
            .lock()
            .unwrap()
            .insert(source.as_str().to_string(), files);
    }

    pub fn set_analysis(&self, name: &str, result: Result<AnalysisResponse, ApiError>) {
        self.analyses
            .lock()
            .unwrap()
            .insert(name.to_string(), result);
    }

    pub fn set_columns(&self, name: &str, result: Result<ColumnsResponse, ApiError>) {
        self.columns.lock().unwrap().insert(name.to_string(), result);
    }

    pub fn set_visualization_types(&self, types: Result<Vec<VisualizationType>, ApiError>) {
        *self.viz_types.lock().unwrap() = Some(types);
    }

    pub fn set_plot(&self, name: &str, plot_type: &str, result: Result<PlotResponse, ApiError>) {
        self.plots
            .lock()
            .unwrap()
            .insert(format!("{}:{}", name, plot_type), result);
    }

    /// Delay every call recorded under `key`
    pub fn set_delay(&self, key: &str, delay: Duration) {
        self.delays.lock().unwrap().insert(key.to_string(), delay);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, key: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.as_str() == key)
            .count()
    }

    pub fn submitted_schedules(&self) -> Vec<ScheduleRequest> {
        self.schedules.lock().unwrap().clone()
    }

    async fn record(&self, key: &str) {
        self.calls.lock().unwrap().push(key.to_string());
        let delay = self.delays.lock().unwrap().get(key).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

fn scripted<T: Clone>(map: &Scripted<T>, key: &str, call: &str) -> Result<T, ApiError> {
    map.lock()
        .unwrap()
        .get(key)
        .cloned()
        .unwrap_or_else(|| Err(not_scripted(call)))
}

impl RemoteApi for FakeApi {
    async fn status(&self) -> Result<StatusResponse, ApiError> {
        self.record("status").await;
        let mut statuses = self.statuses.lock().unwrap();
        if statuses.len() > 1 {
            return statuses.pop_front().unwrap_or_else(|| Err(not_scripted("status")));
        }
        statuses
            .front()
            .cloned()
            .unwrap_or_else(|| Err(not_scripted("status")))
    }

    async fn latest(&self) -> Result<RawReadings, ApiError> {
        self.record("latest").await;
        self.latest
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Err(not_scripted("latest")))
    }

    async fn start_default(&self) -> Result<ControlResponse, ApiError> {
        self.record("start_default").await;
        Ok(ControlResponse {
            status: "started".to_string(),
            message: None,
        })
    }

    async fn stop_and_clear(&self) -> Result<ControlResponse, ApiError> {
        self.record("stop_and_clear").await;
        Ok(ControlResponse {
            status: "cleared".to_string(),
            message: None,
        })
    }

    async fn schedule(&self, request: &ScheduleRequest) -> Result<(), ApiError> {
        self.record("schedule").await;
        if let Some(error) = self.schedule_result.lock().unwrap().clone() {
            return Err(error);
        }
        self.schedules.lock().unwrap().push(request.clone());
        Ok(())
    }

    async fn settings(&self) -> Result<Settings, ApiError> {
        self.record("settings").await;
        self.settings
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Err(not_scripted("settings")))
    }

    async fn list_files(&self, source: FileSource) -> Result<Vec<String>, ApiError> {
        let key = format!("list:{}", source.as_str());
        self.record(&key).await;
        scripted(&self.files, source.as_str(), &key)
    }

    async fn analyze(
        &self,
        name: &str,
        range: &AnalysisRange,
    ) -> Result<AnalysisResponse, ApiError> {
        let key = if range.is_empty() {
            format!("analyze:{}", name)
        } else {
            format!(
                "analyze:{}:{}-{}",
                name,
                range.start_time.as_deref().unwrap_or(""),
                range.end_time.as_deref().unwrap_or("")
            )
        };
        self.record(&key).await;
        scripted(&self.analyses, name, &key)
    }

    async fn visualization_types(&self) -> Result<Vec<VisualizationType>, ApiError> {
        self.record("visualization_types").await;
        self.viz_types
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Err(not_scripted("visualization_types")))
    }

    async fn columns(&self, name: &str) -> Result<ColumnsResponse, ApiError> {
        let key = format!("columns:{}", name);
        self.record(&key).await;
        scripted(&self.columns, name, &key)
    }

    async fn visualize(
        &self,
        name: &str,
        plot_type: &str,
        columns: Option<&[String]>,
    ) -> Result<PlotResponse, ApiError> {
        let key = match columns {
            Some(columns) => format!("visualize:{}:{}:{}", name, plot_type, columns.join(",")),
            None => format!("visualize:{}:{}", name, plot_type),
        };
        self.record(&key).await;
        scripted(&self.plots, &format!("{}:{}", name, plot_type), &key)
    }

    fn file_url(&self, source: FileSource, name: &str) -> String {
        format!("http://fake/api/{}/{}", source.as_str(), name)
    }

    fn resolve_url(&self, path: &str) -> String {
        format!("http://fake{}", path)
    }
}
