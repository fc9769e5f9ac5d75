//! services/api/src/error.rs
//!
//! Defines the error types for the API service: `ApiError` for startup and
//! infrastructure failures, and `NoteError` for everything a single note
//! request can run into.

use crate::adapters::extractor::ExtractError;
use crate::config::ConfigError;
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use study_notes_core::{PortError, UsageRejection};

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

//=========================================================================================
// Note Request Errors
//=========================================================================================

/// Whether a failed generation is worth resubmitting later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Transient,
    Permanent,
}

/// Everything that can end a note request early. None of these are fatal to
/// the session; the caller reports them and the user resubmits by hand.
#[derive(Debug, thiserror::Error)]
pub enum NoteError {
    #[error("Please add text or upload a file")]
    InputEmpty,

    #[error(transparent)]
    Usage(#[from] UsageRejection),

    #[error("The uploaded text file is not valid UTF-8: {0}")]
    Decode(String),

    #[error("Could not read the uploaded PDF: {0}")]
    Extraction(String),

    #[error("AI server busy or rate limited. Try later.")]
    GenerationFailed { kind: FailureKind, message: String },

    #[error("Session not found")]
    SessionNotFound,

    #[error("Invalid form input: {0}")]
    BadRequest(String),
}

impl From<ExtractError> for NoteError {
    fn from(err: ExtractError) -> Self {
        match err {
            ExtractError::Decode(e) => NoteError::Decode(e.to_string()),
            ExtractError::Pdf(msg) => NoteError::Extraction(msg),
        }
    }
}

impl NoteError {
    /// Wraps a completion-service failure, keeping whether it was transient.
    pub fn generation(err: PortError) -> Self {
        let kind = if err.is_transient() {
            FailureKind::Transient
        } else {
            FailureKind::Permanent
        };
        NoteError::GenerationFailed {
            kind,
            message: err.to_string(),
        }
    }

    /// Stable machine-readable code for the error body.
    pub fn code(&self) -> &'static str {
        match self {
            NoteError::InputEmpty => "input_empty",
            NoteError::Usage(UsageRejection::QuotaExceeded { .. }) => "quota_exceeded",
            NoteError::Usage(UsageRejection::CooldownActive { .. }) => "cooldown_active",
            NoteError::Decode(_) => "decode_error",
            NoteError::Extraction(_) => "extraction_error",
            NoteError::GenerationFailed { .. } => "generation_failed",
            NoteError::SessionNotFound => "session_not_found",
            NoteError::BadRequest(_) => "bad_request",
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            NoteError::Usage(UsageRejection::CooldownActive { .. })
                | NoteError::GenerationFailed {
                    kind: FailureKind::Transient,
                    ..
                }
        )
    }

    pub fn status(&self) -> StatusCode {
        match self {
            NoteError::InputEmpty | NoteError::BadRequest(_) => StatusCode::BAD_REQUEST,
            NoteError::Usage(_) => StatusCode::TOO_MANY_REQUESTS,
            NoteError::Decode(_) | NoteError::Extraction(_) => StatusCode::UNPROCESSABLE_ENTITY,
            NoteError::GenerationFailed {
                kind: FailureKind::Transient,
                ..
            } => StatusCode::SERVICE_UNAVAILABLE,
            NoteError::GenerationFailed { .. } => StatusCode::BAD_GATEWAY,
            NoteError::SessionNotFound => StatusCode::NOT_FOUND,
        }
    }
}

/// The JSON body sent for every failed request.
#[derive(Serialize, Debug, utoipa::ToSchema)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
    pub retryable: bool,
}

impl IntoResponse for NoteError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.code().to_string(),
            message: self.to_string(),
            retryable: self.is_retryable(),
        };
        let mut response = (self.status(), Json(body)).into_response();

        if let Some(secs) = match &self {
            NoteError::Usage(rejection) => rejection.retry_after_secs(),
            _ => None,
        } {
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn transient_port_errors_stay_retryable() {
        let err = NoteError::generation(PortError::Unavailable("429 rate limited".into()));
        assert!(err.is_retryable());
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.to_string(), "AI server busy or rate limited. Try later.");

        let err = NoteError::generation(PortError::Rejected("model not found".into()));
        assert!(!err.is_retryable());
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn cooldown_response_carries_retry_after() {
        let err = NoteError::Usage(UsageRejection::CooldownActive {
            retry_after: Duration::seconds(3),
        });
        let response = err.into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "3");
    }

    #[test]
    fn retry_after_never_undershoots_the_cooldown() {
        let err = NoteError::Usage(UsageRejection::CooldownActive {
            retry_after: Duration::milliseconds(2_500),
        });
        let response = err.into_response();

        assert_eq!(response.headers()[header::RETRY_AFTER], "3");
    }
}
