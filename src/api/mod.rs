//! Client side of the data-logger service
//!
//! `RemoteApi` is the seam between the dashboard core and the backend. The
//! controllers, supervisor and navigator are generic over it; production code
//! uses `HttpApi`, tests use the scripted fake.

mod http;
pub mod models;

#[cfg(test)]
pub mod fake;

pub use http::HttpApi;
pub use models::{
    AnalysisRange, AnalysisResponse, ColumnsResponse, ControlResponse, PlotResponse, RawReadings,
    Settings, StatusResponse, VisualizationType,
};

use crate::error::ApiError;
use crate::schedule::ScheduleRequest;
use std::future::Future;

/// Which listing a file browser reads from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FileSource {
    /// Measurement CSV files (`/api/files`)
    #[default]
    Data,
    /// Archived service logs (`/api/logs`)
    Logs,
}

impl FileSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Data => "files",
            Self::Logs => "logs",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "logs" => Self::Logs,
            _ => Self::Data,
        }
    }
}

/// Calls consumed from the data-logger service
///
/// Every call is one request/response round trip. Implementations must not
/// retry; callers decide what a failure means for them.
pub trait RemoteApi: Send + Sync + 'static {
    /// Current session status
    fn status(&self) -> impl Future<Output = Result<StatusResponse, ApiError>> + Send;

    /// Most recent set of readings (empty map when nothing has been logged)
    fn latest(&self) -> impl Future<Output = Result<RawReadings, ApiError>> + Send;

    /// Start logging immediately with the default trigger
    fn start_default(&self) -> impl Future<Output = Result<ControlResponse, ApiError>> + Send;

    /// Stop logging and drop any scheduled jobs
    fn stop_and_clear(&self) -> impl Future<Output = Result<ControlResponse, ApiError>> + Send;

    /// Arm a schedule
    fn schedule(
        &self,
        request: &ScheduleRequest,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Device and polling settings
    fn settings(&self) -> impl Future<Output = Result<Settings, ApiError>> + Send;

    /// File names available from `source`
    fn list_files(
        &self,
        source: FileSource,
    ) -> impl Future<Output = Result<Vec<String>, ApiError>> + Send;

    /// Statistics for one data file, optionally narrowed to a time window
    fn analyze(
        &self,
        name: &str,
        range: &AnalysisRange,
    ) -> impl Future<Output = Result<AnalysisResponse, ApiError>> + Send;

    /// Plot types the service can render
    fn visualization_types(
        &self,
    ) -> impl Future<Output = Result<Vec<VisualizationType>, ApiError>> + Send;

    /// Selectable columns of one data file
    fn columns(&self, name: &str) -> impl Future<Output = Result<ColumnsResponse, ApiError>> + Send;

    /// Render a plot; `columns` is only used by the `custom` type
    fn visualize(
        &self,
        name: &str,
        plot_type: &str,
        columns: Option<&[String]>,
    ) -> impl Future<Output = Result<PlotResponse, ApiError>> + Send;

    /// Address for direct view/download of a file (no request is issued)
    fn file_url(&self, source: FileSource, name: &str) -> String;

    /// Turn a service-relative path (e.g. `/plots/x.png`) into an absolute URL
    fn resolve_url(&self, path: &str) -> String;
}
