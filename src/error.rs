//! Error taxonomy for the dashboard core
//!
//! Three families, matching how each one is handled:
//! - `ApiError::Transient`: any failed or malformed response. Poll loops absorb it.
//! - `ApiError::Rejected`: the service answered with a structured `error`. Shown verbatim.
//! - `ValidationError`: caught locally before any request is sent.

use std::fmt;

/// Errors from a call to the data-logger service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Transport failure, unreadable body, or a response of unexpected shape
    Transient(String),
    /// The service reported an error in its response body
    Rejected(String),
}

impl ApiError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transient(msg) => write!(f, "Network error: {}", msg),
            // Verbatim: the service's own wording is what the user sees
            Self::Rejected(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

/// Input rejected before a request was issued
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    MissingStartTime,
    MissingEndTime,
    /// Unknown trigger mode / schedule type combination
    InvalidMode(String),
    /// Repeat period that is not a non-negative integer
    InvalidDayInterval(String),
    /// Refinement submitted with no parameter selected
    EmptySelection,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingStartTime => write!(f, "Start time is required"),
            Self::MissingEndTime => write!(f, "End time is required"),
            Self::InvalidMode(mode) => write!(f, "Invalid schedule mode: '{}'", mode),
            Self::InvalidDayInterval(raw) => {
                write!(f, "Day interval must be a non-negative integer, got '{}'", raw)
            }
            Self::EmptySelection => write!(f, "Select at least one parameter"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Failure of a schedule submission, either local or remote
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    Validation(ValidationError),
    Api(ApiError),
}

impl fmt::Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(e) => write!(f, "{}", e),
            Self::Api(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for SubmitError {}

impl From<ValidationError> for SubmitError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<ApiError> for SubmitError {
    fn from(e: ApiError) -> Self {
        Self::Api(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_displays_verbatim() {
        let err = ApiError::Rejected("Start and end times are required.".to_string());
        assert_eq!(err.to_string(), "Start and end times are required.");
        assert!(!err.is_transient());
    }

    #[test]
    fn test_submit_error_wraps_validation() {
        let err: SubmitError = ValidationError::MissingEndTime.into();
        assert_eq!(err, SubmitError::Validation(ValidationError::MissingEndTime));
        assert_eq!(err.to_string(), "End time is required");
    }
}
