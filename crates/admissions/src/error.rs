use crate::applications::ApplicationStatus;
use crate::catalog::ImportError;
use crate::config::ConfigError;
use crate::persistence::RepositoryError;
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use std::fmt;

/// Process-level failures surfaced by the binary and the import endpoint.
#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Import(ImportError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Import(err) => write!(f, "catalog import error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Import(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Import(_) => StatusCode::BAD_REQUEST,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = ErrorBody {
            error: self.to_string(),
            kind: self.kind(),
        };
        (status, Json(body)).into_response()
    }
}

impl AppError {
    pub const fn kind(&self) -> &'static str {
        match self {
            AppError::Import(_) => "import_failed",
            AppError::Config(_) => "configuration",
            AppError::Telemetry(_) => "telemetry",
            AppError::Io(_) => "io",
            AppError::Server(_) => "server",
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<ImportError> for AppError {
    fn from(value: ImportError) -> Self {
        Self::Import(value)
    }
}

/// Domain error kinds raised by the catalog, eligibility and application services.
#[derive(Debug, thiserror::Error)]
pub enum AdmissionError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },
    #[error("validation failed: {0}")]
    ValidationFailed(String),
    #[error("candidate already has an active application for this combination")]
    DuplicateSubmission,
    #[error("cannot move application from {from} to {to}")]
    InvalidTransition {
        from: ApplicationStatus,
        to: ApplicationStatus,
    },
    #[error("application changed since it was read; re-read and retry")]
    ConcurrentModification,
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("{entity} is still referenced by {referrer}")]
    InUse {
        entity: &'static str,
        referrer: &'static str,
    },
    #[error("authentication required: {0}")]
    Unauthenticated(String),
    #[error(transparent)]
    Repository(RepositoryError),
}

impl AdmissionError {
    pub fn not_found(entity: &'static str, id: impl fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationFailed(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    /// Stable machine-readable identifier used in HTTP error bodies.
    pub const fn kind(&self) -> &'static str {
        match self {
            AdmissionError::NotFound { .. } => "not_found",
            AdmissionError::ValidationFailed(_) => "validation_failed",
            AdmissionError::DuplicateSubmission => "duplicate_submission",
            AdmissionError::InvalidTransition { .. } => "invalid_transition",
            AdmissionError::ConcurrentModification => "concurrent_modification",
            AdmissionError::Forbidden(_) => "forbidden",
            AdmissionError::InUse { .. } => "in_use",
            AdmissionError::Unauthenticated(_) => "unauthenticated",
            AdmissionError::Repository(_) => "repository",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AdmissionError::NotFound { .. } => StatusCode::NOT_FOUND,
            AdmissionError::ValidationFailed(_) | AdmissionError::InvalidTransition { .. } => {
                StatusCode::BAD_REQUEST
            }
            AdmissionError::DuplicateSubmission
            | AdmissionError::ConcurrentModification
            | AdmissionError::InUse { .. } => StatusCode::CONFLICT,
            AdmissionError::Forbidden(_) => StatusCode::FORBIDDEN,
            AdmissionError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AdmissionError::Repository(err) => match err {
                RepositoryError::NotFound | RepositoryError::MissingReference(_) => {
                    StatusCode::NOT_FOUND
                }
                RepositoryError::Conflict(_)
                | RepositoryError::InUse(_)
                | RepositoryError::Stale { .. } => StatusCode::CONFLICT,
                RepositoryError::Unavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Only optimistic-concurrency failures are worth retrying after a fresh read.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, AdmissionError::ConcurrentModification)
    }
}

impl From<RepositoryError> for AdmissionError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::Stale { .. } => Self::ConcurrentModification,
            other => Self::Repository(other),
        }
    }
}

/// JSON body returned for every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub kind: &'static str,
}

impl IntoResponse for AdmissionError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = ErrorBody {
            error: self.to_string(),
            kind: self.kind(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_error_kinds() {
        assert_eq!(
            AdmissionError::not_found("major", "m-1").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AdmissionError::DuplicateSubmission.status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AdmissionError::ConcurrentModification.status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AdmissionError::InvalidTransition {
                from: ApplicationStatus::Approved,
                to: ApplicationStatus::Pending,
            }
            .status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AdmissionError::validation("bad year").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AdmissionError::Repository(RepositoryError::Unavailable("offline".into()))
                .status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn stale_repository_writes_become_concurrent_modification() {
        let err = AdmissionError::from(RepositoryError::Stale {
            expected: 1,
            found: 2,
        });
        assert!(matches!(err, AdmissionError::ConcurrentModification));
        assert!(err.is_retryable());
        assert!(!AdmissionError::DuplicateSubmission.is_retryable());
    }

    #[test]
    fn transition_errors_name_both_states() {
        let err = AdmissionError::InvalidTransition {
            from: ApplicationStatus::Approved,
            to: ApplicationStatus::Processing,
        };
        assert_eq!(
            err.to_string(),
            "cannot move application from approved to processing"
        );
        assert_eq!(err.kind(), "invalid_transition");
    }

    #[test]
    fn process_errors_carry_a_kind() {
        let err = AppError::Import(ImportError::Io(std::io::Error::other("truncated upload")));
        assert_eq!(err.kind(), "import_failed");
        assert_eq!(AppError::Io(std::io::Error::other("disk")).kind(), "io");
    }
}
