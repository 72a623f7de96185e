//! Schedule configuration: form state, validation, submission
//!
//! Two independent axes drive the form: trigger mode (`default` or
//! `scheduled`) and, when scheduled, schedule type (`once` or `recurring`).
//! `validate` turns a raw selection into a `ScheduleRequest` or a
//! `ValidationError`; nothing is sent until validation passes.

use crate::api::RemoteApi;
use crate::error::{SubmitError, ValidationError};
use crate::session::{SessionController, SessionState};
use serde::Serialize;

// ─────────────────────────────────────────────────────────────────────────────
// Request payload
// ─────────────────────────────────────────────────────────────────────────────

/// Body of `POST /api/schedules/set`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleRequest {
    pub mode: ScheduleMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day_interval: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleMode {
    Default,
    Once,
    Recurring,
}

impl ScheduleRequest {
    pub fn default_mode() -> Self {
        Self {
            mode: ScheduleMode::Default,
            start_time: None,
            end_time: None,
            day_interval: None,
        }
    }

    pub fn once(start_time: &str, end_time: Option<&str>) -> Self {
        Self {
            mode: ScheduleMode::Once,
            start_time: Some(start_time.to_string()),
            end_time: end_time.map(str::to_string),
            day_interval: None,
        }
    }

    pub fn recurring(start_time: &str, end_time: &str, day_interval: u32) -> Self {
        Self {
            mode: ScheduleMode::Recurring,
            start_time: Some(start_time.to_string()),
            end_time: Some(end_time.to_string()),
            day_interval: Some(day_interval),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Selection and validation
// ─────────────────────────────────────────────────────────────────────────────

/// Raw values as picked in the UI or given on the command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleSelection {
    /// `"default"` or `"scheduled"`
    pub mode: String,
    /// `"once"` or `"recurring"` when scheduled
    pub schedule_type: Option<String>,
    pub start_time: String,
    pub end_time: String,
    /// Repeat period in days; empty means 0
    pub day_interval: String,
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Check a selection and build the request it describes
pub fn validate(selection: &ScheduleSelection) -> Result<ScheduleRequest, ValidationError> {
    match (
        selection.mode.trim(),
        selection.schedule_type.as_deref().map(str::trim),
    ) {
        ("default", _) => Ok(ScheduleRequest::default_mode()),
        ("scheduled", Some("once")) => {
            let start_time =
                non_empty(&selection.start_time).ok_or(ValidationError::MissingStartTime)?;
            Ok(ScheduleRequest {
                mode: ScheduleMode::Once,
                start_time: Some(start_time),
                end_time: non_empty(&selection.end_time),
                day_interval: None,
            })
        }
        ("scheduled", Some("recurring")) => {
            let start_time =
                non_empty(&selection.start_time).ok_or(ValidationError::MissingStartTime)?;
            let end_time =
                non_empty(&selection.end_time).ok_or(ValidationError::MissingEndTime)?;
            let day_interval = parse_day_interval(&selection.day_interval)?;
            Ok(ScheduleRequest {
                mode: ScheduleMode::Recurring,
                start_time: Some(start_time),
                end_time: Some(end_time),
                day_interval: Some(day_interval),
            })
        }
        (mode, schedule_type) => Err(ValidationError::InvalidMode(match schedule_type {
            Some(t) => format!("{}/{}", mode, t),
            None => mode.to_string(),
        })),
    }
}

fn parse_day_interval(raw: &str) -> Result<u32, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    trimmed
        .parse::<u32>()
        .map_err(|_| ValidationError::InvalidDayInterval(raw.to_string()))
}

// ─────────────────────────────────────────────────────────────────────────────
// Form state machine
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriggerMode {
    #[default]
    Default,
    Scheduled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScheduleType {
    #[default]
    Once,
    Recurring,
}

/// Editable form fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    StartTime,
    EndTime,
    DayInterval,
}

impl Field {
    pub fn label(&self) -> &'static str {
        match self {
            Self::StartTime => "Start time",
            Self::EndTime => "End time",
            Self::DayInterval => "Every N days",
        }
    }
}

/// Schedule form; typed values survive mode switches and failed submissions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleForm {
    trigger: TriggerMode,
    schedule_type: Option<ScheduleType>,
    pub start_time: String,
    pub end_time: String,
    pub day_interval: String,
}

impl ScheduleForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) -> TriggerMode {
        self.trigger
    }

    pub fn schedule_type(&self) -> Option<ScheduleType> {
        self.schedule_type
    }

    /// Switching trigger resets the schedule type (and so the required fields)
    pub fn set_trigger(&mut self, trigger: TriggerMode) {
        self.trigger = trigger;
        self.schedule_type = match trigger {
            TriggerMode::Default => None,
            TriggerMode::Scheduled => Some(ScheduleType::Once),
        };
    }

    /// Only meaningful while scheduled
    pub fn set_schedule_type(&mut self, schedule_type: ScheduleType) {
        if self.trigger == TriggerMode::Scheduled {
            self.schedule_type = Some(schedule_type);
        }
    }

    /// Fields shown for the current mode
    pub fn visible_fields(&self) -> &'static [Field] {
        match self.schedule_type {
            None => &[],
            Some(ScheduleType::Once) => &[Field::StartTime, Field::EndTime],
            Some(ScheduleType::Recurring) => &[Field::StartTime, Field::EndTime, Field::DayInterval],
        }
    }

    /// Fields that must be non-empty for the current mode
    pub fn required_fields(&self) -> &'static [Field] {
        match self.schedule_type {
            None => &[],
            Some(ScheduleType::Once) => &[Field::StartTime],
            Some(ScheduleType::Recurring) => &[Field::StartTime, Field::EndTime, Field::DayInterval],
        }
    }

    pub fn field_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::StartTime => &mut self.start_time,
            Field::EndTime => &mut self.end_time,
            Field::DayInterval => &mut self.day_interval,
        }
    }

    pub fn field(&self, field: Field) -> &str {
        match field {
            Field::StartTime => &self.start_time,
            Field::EndTime => &self.end_time,
            Field::DayInterval => &self.day_interval,
        }
    }

    pub fn selection(&self) -> ScheduleSelection {
        ScheduleSelection {
            mode: match self.trigger {
                TriggerMode::Default => "default",
                TriggerMode::Scheduled => "scheduled",
            }
            .to_string(),
            schedule_type: self.schedule_type.map(|t| {
                match t {
                    ScheduleType::Once => "once",
                    ScheduleType::Recurring => "recurring",
                }
                .to_string()
            }),
            start_time: self.start_time.clone(),
            end_time: self.end_time.clone(),
            day_interval: self.day_interval.clone(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Submission
// ─────────────────────────────────────────────────────────────────────────────

/// Result of an accepted schedule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleOutcome {
    pub request: ScheduleRequest,
    /// State from the poll issued right after acceptance
    pub state: SessionState,
}

/// Validate, send, then refresh session state without waiting for the next tick
///
/// Remote rejections are returned verbatim and never retried.
pub async fn submit_schedule<A: RemoteApi>(
    controller: &SessionController<A>,
    selection: &ScheduleSelection,
) -> Result<ScheduleOutcome, SubmitError> {
    let request = validate(selection)?;
    tracing::info!("Submitting {:?} schedule", request.mode);

    controller.api().schedule(&request).await.map_err(|e| {
        tracing::warn!("Schedule rejected: {}", e);
        SubmitError::Api(e)
    })?;

    let state = controller.poll().await;
    Ok(ScheduleOutcome { request, state })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::FakeApi;
    use crate::api::StatusResponse;
    use crate::error::ApiError;
    use crate::session::Status;
    use std::sync::Arc;
    use std::time::Duration;

    fn scheduled(schedule_type: &str, start: &str, end: &str, every: &str) -> ScheduleSelection {
        ScheduleSelection {
            mode: "scheduled".to_string(),
            schedule_type: Some(schedule_type.to_string()),
            start_time: start.to_string(),
            end_time: end.to_string(),
            day_interval: every.to_string(),
        }
    }

    #[test]
    fn test_default_needs_nothing() {
        let selection = ScheduleSelection {
            mode: "default".to_string(),
            start_time: "ignored".to_string(),
            ..Default::default()
        };
        let request = validate(&selection).unwrap();
        assert_eq!(request, ScheduleRequest::default_mode());
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({ "mode": "default" })
        );
    }

    #[test]
    fn test_recurring_missing_start() {
        let selection = scheduled("recurring", "", "2099-01-01T00:00", "1");
        assert_eq!(validate(&selection), Err(ValidationError::MissingStartTime));
    }

    #[test]
    fn test_recurring_missing_end() {
        let selection = scheduled("recurring", "08:00", "  ", "1");
        assert_eq!(validate(&selection), Err(ValidationError::MissingEndTime));
    }

    #[test]
    fn test_once_payload_has_no_day_interval() {
        let selection = scheduled("once", "2099-01-01T00:00", "", "");
        let request = validate(&selection).unwrap();
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({ "mode": "once", "start_time": "2099-01-01T00:00" })
        );
    }

    #[test]
    fn test_once_missing_start() {
        let selection = scheduled("once", "", "18:00", "");
        assert_eq!(validate(&selection), Err(ValidationError::MissingStartTime));
    }

    #[test]
    fn test_recurring_day_interval() {
        let every_day = validate(&scheduled("recurring", "08:00", "18:00", "")).unwrap();
        assert_eq!(every_day.day_interval, Some(0));

        let every_third = validate(&scheduled("recurring", "08:00", "18:00", "2")).unwrap();
        assert_eq!(every_third, ScheduleRequest::recurring("08:00", "18:00", 2));

        assert_eq!(
            validate(&scheduled("recurring", "08:00", "18:00", "-1")),
            Err(ValidationError::InvalidDayInterval("-1".to_string()))
        );
        assert_eq!(
            validate(&scheduled("recurring", "08:00", "18:00", "daily")),
            Err(ValidationError::InvalidDayInterval("daily".to_string()))
        );
    }

    #[test]
    fn test_other_combinations_are_invalid() {
        let no_type = ScheduleSelection {
            mode: "scheduled".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            validate(&no_type),
            Err(ValidationError::InvalidMode(_))
        ));
        assert!(matches!(
            validate(&scheduled("weekly", "08:00", "18:00", "")),
            Err(ValidationError::InvalidMode(_))
        ));
        let unknown = ScheduleSelection {
            mode: "sometimes".to_string(),
            ..Default::default()
        };
        assert_eq!(
            validate(&unknown),
            Err(ValidationError::InvalidMode("sometimes".to_string()))
        );
    }

    #[test]
    fn test_form_trigger_switch_resets_requirements_keeps_values() {
        let mut form = ScheduleForm::new();
        assert!(form.required_fields().is_empty());

        form.set_trigger(TriggerMode::Scheduled);
        form.set_schedule_type(ScheduleType::Recurring);
        form.start_time = "08:00".to_string();
        assert_eq!(form.required_fields().len(), 3);

        form.set_trigger(TriggerMode::Default);
        assert!(form.required_fields().is_empty());
        assert_eq!(form.schedule_type(), None);

        form.set_trigger(TriggerMode::Scheduled);
        assert_eq!(form.schedule_type(), Some(ScheduleType::Once));
        assert_eq!(form.required_fields(), &[Field::StartTime]);
        assert_eq!(form.start_time, "08:00");
    }

    #[test]
    fn test_schedule_type_ignored_while_default() {
        let mut form = ScheduleForm::new();
        form.set_schedule_type(ScheduleType::Recurring);
        assert_eq!(form.schedule_type(), None);
        assert_eq!(validate(&form.selection()), Ok(ScheduleRequest::default_mode()));
    }

    fn controller(api: Arc<FakeApi>) -> SessionController<FakeApi> {
        SessionController::new(api, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_submit_sends_then_polls() {
        let api = Arc::new(FakeApi::new());
        api.push_status(Ok(StatusResponse {
            mode: Some("once".to_string()),
            status: Some("scheduled".to_string()),
            ..Default::default()
        }));
        let controller = controller(api.clone());

        let outcome = submit_schedule(&controller, &scheduled("once", "08:00", "", ""))
            .await
            .unwrap();
        assert_eq!(outcome.state.status, Status::Scheduled);
        assert_eq!(api.calls(), vec!["schedule", "status"]);
        assert_eq!(api.submitted_schedules(), vec![outcome.request]);
    }

    #[tokio::test]
    async fn test_validation_failure_sends_nothing() {
        let api = Arc::new(FakeApi::new());
        let controller = controller(api.clone());

        let err = submit_schedule(&controller, &scheduled("recurring", "", "18:00", "0"))
            .await
            .unwrap_err();
        assert_eq!(err, SubmitError::Validation(ValidationError::MissingStartTime));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_rejection_is_surfaced_verbatim_without_retry() {
        let api = Arc::new(FakeApi::new());
        api.reject_schedules(ApiError::Rejected("Invalid time format: bad".to_string()));
        let controller = controller(api.clone());

        let err = submit_schedule(&controller, &scheduled("once", "25:99", "", ""))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            SubmitError::Api(ApiError::Rejected("Invalid time format: bad".to_string()))
        );
        assert_eq!(api.count("schedule"), 1);
        assert_eq!(api.count("status"), 0);
    }

    #[tokio::test]
    async fn test_default_start_failure_is_reported() {
        let api = Arc::new(FakeApi::new());
        api.reject_schedules(ApiError::Rejected(
            "Could not determine filepath or table.".to_string(),
        ));
        let controller = controller(api.clone());
        let selection = ScheduleSelection {
            mode: "default".to_string(),
            ..Default::default()
        };

        let err = submit_schedule(&controller, &selection).await.unwrap_err();
        assert_eq!(err.to_string(), "Could not determine filepath or table.");
        assert!(api.submitted_schedules().is_empty());
        assert_eq!(api.count("status"), 0);
    }
}
