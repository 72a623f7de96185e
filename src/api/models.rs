//! Wire types for the data-logger service
//!
//! These mirror the JSON bodies the service returns. They are deliberately
//! loose (most fields optional) so that a partially populated response still
//! parses; interpretation happens in the session, readings and explore modules.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `GET /api/schedules/status`
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub last_updated: Option<String>,
    #[serde(default, rename = "activeCSVFile")]
    pub active_csv_file: Option<String>,
    #[serde(default)]
    pub next_event_time: Option<String>,
    #[serde(default)]
    pub next_event_type: Option<String>,
}

/// Start/stop response: `{status: "started"|"cleared"|"error", message?}`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ControlResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// `POST /api/analyze/<name>`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AnalysisResponse {
    #[serde(default)]
    pub filename: Option<String>,
    pub analysis_text: String,
}

/// Optional analysis window sent with an analyze request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnalysisRange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
}

impl AnalysisRange {
    pub fn is_empty(&self) -> bool {
        self.start_time.is_none() && self.end_time.is_none()
    }
}

/// One entry of `GET /api/visualization-types`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct VisualizationType {
    pub id: String,
    pub name: String,
}

/// `GET /api/columns/<name>`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ColumnsResponse {
    #[serde(default)]
    pub filename: Option<String>,
    pub columns: Vec<String>,
}

/// `GET /api/visualize/...` and `POST /api/visualize/custom/...`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PlotResponse {
    pub regular_plot: String,
    pub normalized_plot: String,
}

/// Device and polling configuration (read-only here)
pub type Settings = Map<String, Value>;

/// Raw `GET /api/latest` body: parameter name to value, plus a timestamp
pub type RawReadings = Map<String, Value>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_response_parses_service_shape() {
        let body = r#"{
            "mode": "recurring",
            "status": "logging",
            "activeCSVFile": "20240115_143000.csv",
            "nextEventTime": "2024-01-15T18:00:00",
            "nextEventType": "stop",
            "lastUpdated": "2024-01-15T14:35:00.123456"
        }"#;
        let parsed: StatusResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.mode.as_deref(), Some("recurring"));
        assert_eq!(parsed.active_csv_file.as_deref(), Some("20240115_143000.csv"));
        assert_eq!(parsed.next_event_type.as_deref(), Some("stop"));
    }

    #[test]
    fn test_status_response_tolerates_nulls() {
        let body = r#"{"mode":"none","status":"idle","lastUpdated":null,"nextEventTime":null}"#;
        let parsed: StatusResponse = serde_json::from_str(body).unwrap();
        assert!(parsed.last_updated.is_none());
        assert!(parsed.next_event_time.is_none());
    }

    #[test]
    fn test_analysis_range_skips_empty_fields() {
        let range = AnalysisRange {
            start_time: Some("08:00".to_string()),
            end_time: None,
        };
        assert_eq!(
            serde_json::to_string(&range).unwrap(),
            r#"{"start_time":"08:00"}"#
        );
        assert!(AnalysisRange::default().is_empty());
    }
}
