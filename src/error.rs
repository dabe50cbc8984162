use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use validator::ValidationErrors;

use crate::{
    dao::{models::InvalidAnswerLetter, storage::StorageError},
    state::state_machine::{InvalidLifeline, TransitionError},
};

/// Failure classes every core operation reports, independent of transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Malformed input (answer outside A-D, negative time, ...).
    Validation,
    /// No active session, no vote session or no matching record.
    NotFound,
    /// Valid request issued in the wrong state.
    PreconditionFailed,
    /// Persistence or transport failure.
    Internal,
}

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage backend is unavailable.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Application is running in degraded mode without storage.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Operation cannot be performed in the current state.
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),
    /// Operation exceeded its timeout limit.
    #[error("operation timed out")]
    Timeout,
}

impl ServiceError {
    /// Classify the error for callers that map failures to their own surface.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::InvalidInput(_) => ErrorKind::Validation,
            ServiceError::NotFound(_) => ErrorKind::NotFound,
            ServiceError::PreconditionFailed(_) => ErrorKind::PreconditionFailed,
            ServiceError::Unavailable(_) | ServiceError::Degraded | ServiceError::Timeout => {
                ErrorKind::Internal
            }
        }
    }
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Conflict { .. } => ServiceError::PreconditionFailed(err.to_string()),
            StorageError::TimedOut { .. } => ServiceError::Timeout,
            other => ServiceError::Unavailable(other),
        }
    }
}

impl From<InvalidAnswerLetter> for ServiceError {
    fn from(err: InvalidAnswerLetter) -> Self {
        ServiceError::InvalidInput(err.to_string())
    }
}

impl From<InvalidLifeline> for ServiceError {
    fn from(err: InvalidLifeline) -> Self {
        ServiceError::InvalidInput(err.to_string())
    }
}

impl From<TransitionError> for ServiceError {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::LastQuestion { .. } => ServiceError::NotFound(err.to_string()),
            TransitionError::NotActive(_) | TransitionError::LifelineAlreadyUsed(_) => {
                ServiceError::PreconditionFailed(err.to_string())
            }
        }
    }
}

impl From<ValidationErrors> for ServiceError {
    fn from(err: ValidationErrors) -> Self {
        ServiceError::InvalidInput(format!("validation failed: {err}"))
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {}", err))
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Conflict with current state.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Service unavailable or degraded.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn kind(&self) -> ErrorKind {
        match self {
            AppError::BadRequest(_) => ErrorKind::Validation,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::Conflict(_) => ErrorKind::PreconditionFailed,
            AppError::ServiceUnavailable(_) | AppError::Internal(_) => ErrorKind::Internal,
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unavailable(source) => AppError::ServiceUnavailable(source.to_string()),
            ServiceError::Degraded => AppError::ServiceUnavailable("degraded mode".into()),
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            ServiceError::PreconditionFailed(message) => AppError::Conflict(message),
            ServiceError::NotFound(message) => AppError::NotFound(message),
            ServiceError::Timeout => AppError::ServiceUnavailable("operation timed out".into()),
        }
    }
}

/// JSON body returned for every failed request.
#[derive(Serialize, ToSchema)]
pub struct ErrorBody {
    message: String,
    kind: ErrorKind,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
            kind: self.kind(),
        });

        (status, payload).into_response()
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[test]
    fn storage_conflicts_are_precondition_failures() {
        let err: ServiceError = StorageError::Conflict {
            id: Uuid::nil(),
            expected: 3,
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::PreconditionFailed);
    }

    #[test]
    fn kinds_map_to_status_codes() {
        let cases = [
            (ServiceError::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (ServiceError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ServiceError::PreconditionFailed("x".into()), StatusCode::CONFLICT),
            (ServiceError::Degraded, StatusCode::SERVICE_UNAVAILABLE),
            (ServiceError::Timeout, StatusCode::SERVICE_UNAVAILABLE),
        ];
        for (err, expected) in cases {
            let response = AppError::from(err).into_response();
            assert_eq!(response.status(), expected);
        }
    }
}
