//! Session state as seen by the dashboard
//!
//! The service is the only source of truth. Every successful status poll
//! replaces the whole `SessionState`; nothing is merged or persisted locally.

mod controller;

pub use controller::{Observer, SessionController};

use crate::api::StatusResponse;
use chrono::{DateTime, Local, NaiveDateTime};
use std::fmt;

/// Naive local date-time, as emitted by the service
pub type Timestamp = NaiveDateTime;

/// Logging trigger policy currently armed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    None,
    Default,
    Once,
    Recurring,
}

impl Mode {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "default" => Self::Default,
            "once" => Self::Once,
            "recurring" => Self::Recurring,
            _ => Self::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Default => "default",
            Self::Once => "once",
            Self::Recurring => "recurring",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Idle,
    Scheduled,
    Logging,
    /// The last status poll failed; dependents must hold their current state
    Unknown,
}

impl Status {
    /// Unrecognised strings map to `Unknown` rather than guessing a phase
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "idle" => Self::Idle,
            "scheduled" => Self::Scheduled,
            "logging" => Self::Logging,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Scheduled => "scheduled",
            Self::Logging => "logging",
            Self::Unknown => "unknown",
        }
    }

    /// Human label for the status header
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "Inactive",
            Self::Scheduled => "Scheduled",
            Self::Logging => "Active",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which edge of a schedule fires next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextEventKind {
    Start,
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NextEvent {
    pub at: Timestamp,
    pub kind: NextEventKind,
}

/// Snapshot of the remote session
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionState {
    pub mode: Mode,
    pub status: Status,
    /// Time of the newest reading; only set while logging
    pub last_updated: Option<Timestamp>,
    /// CSV file the logger is writing to
    pub active_file: Option<String>,
    pub next_event: Option<NextEvent>,
}

impl SessionState {
    /// Map a status response onto a fresh state
    pub fn from_response(response: &StatusResponse) -> Self {
        let status = response
            .status
            .as_deref()
            .map(Status::from_str)
            .unwrap_or(Status::Unknown);
        let mode = response
            .mode
            .as_deref()
            .map(Mode::from_str)
            .unwrap_or_default();

        // Readings from a finished run are stale once logging stops
        let last_updated = if status == Status::Logging {
            response.last_updated.as_deref().and_then(parse_timestamp)
        } else {
            None
        };

        let next_event = match (
            response.next_event_time.as_deref().and_then(parse_timestamp),
            response.next_event_type.as_deref(),
        ) {
            (Some(at), Some("start")) => Some(NextEvent {
                at,
                kind: NextEventKind::Start,
            }),
            (Some(at), Some("stop")) => Some(NextEvent {
                at,
                kind: NextEventKind::Stop,
            }),
            _ => None,
        };

        Self {
            mode,
            status,
            last_updated,
            active_file: response.active_csv_file.clone(),
            next_event,
        }
    }

    /// Failed poll: status becomes `Unknown`, everything else is kept
    pub fn unknown_from(previous: &SessionState) -> Self {
        Self {
            status: Status::Unknown,
            ..previous.clone()
        }
    }

    /// Nothing armed and nothing running
    pub fn is_unconfigured(&self) -> bool {
        self.status == Status::Idle && self.mode == Mode::None
    }
}

/// Parse a service timestamp
///
/// Accepts naive ISO strings (`2024-01-15T14:30:00[.ffffff]`) and RFC 3339
/// strings with an offset, which are converted to local time.
pub fn parse_timestamp(s: &str) -> Option<Timestamp> {
    let s = s.trim();
    if let Ok(ts) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(ts);
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M") {
        return Some(ts);
    }
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Local).naive_local())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn response(mode: &str, status: &str, last: Option<&str>) -> StatusResponse {
        StatusResponse {
            mode: Some(mode.to_string()),
            status: Some(status.to_string()),
            last_updated: last.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_logging_keeps_last_updated() {
        let state = SessionState::from_response(&response(
            "default",
            "logging",
            Some("2024-01-15T14:30:00.250000"),
        ));
        assert_eq!(state.status, Status::Logging);
        assert_eq!(state.mode, Mode::Default);
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_milli_opt(14, 30, 0, 250)
            .unwrap();
        assert_eq!(state.last_updated, Some(expected));
    }

    #[test]
    fn test_last_updated_dropped_unless_logging() {
        for status in ["idle", "scheduled"] {
            let state = SessionState::from_response(&response(
                "recurring",
                status,
                Some("2024-01-15T14:30:00"),
            ));
            assert!(state.last_updated.is_none(), "status {}", status);
        }
    }

    #[test]
    fn test_idle_none_is_unconfigured() {
        let state = SessionState::from_response(&response("none", "idle", None));
        assert!(state.is_unconfigured());

        let scheduled = SessionState::from_response(&response("once", "scheduled", None));
        assert!(!scheduled.is_unconfigured());
    }

    #[test]
    fn test_unrecognised_status_is_unknown() {
        let state = SessionState::from_response(&response("default", "paused", None));
        assert_eq!(state.status, Status::Unknown);
    }

    #[test]
    fn test_next_event_mapping() {
        let mut raw = response("once", "scheduled", None);
        raw.next_event_time = Some("2099-01-01T08:00:00".to_string());
        raw.next_event_type = Some("start".to_string());
        raw.active_csv_file = Some("20990101_080000.csv".to_string());

        let state = SessionState::from_response(&raw);
        let next = state.next_event.unwrap();
        assert_eq!(next.kind, NextEventKind::Start);
        assert_eq!(next.at.to_string(), "2099-01-01 08:00:00");
        assert_eq!(state.active_file.as_deref(), Some("20990101_080000.csv"));
    }

    #[test]
    fn test_unknown_preserves_everything_but_status() {
        let logging = SessionState::from_response(&response(
            "default",
            "logging",
            Some("2024-01-15T14:30:00"),
        ));
        let unknown = SessionState::unknown_from(&logging);
        assert_eq!(unknown.status, Status::Unknown);
        assert_eq!(unknown.mode, logging.mode);
        assert_eq!(unknown.last_updated, logging.last_updated);
    }

    #[test]
    fn test_parse_timestamp_variants() {
        assert!(parse_timestamp("2024-01-15T14:30:00").is_some());
        assert!(parse_timestamp("2024-01-15T14:30").is_some());
        assert!(parse_timestamp("2024-01-15T14:30:00+00:00").is_some());
        assert!(parse_timestamp("not a time").is_none());
    }
}
