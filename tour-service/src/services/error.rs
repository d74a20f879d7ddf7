use service_core::error::{AppError, FieldViolation};
use thiserror::Error;

use super::store::StoreError;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Validation failed for {} field(s)", .0.len())]
    Invalid(Vec<FieldViolation>),

    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    InvalidState(String),

    #[error("{0}")]
    InvalidTransition(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ServiceError {
    pub fn invalid(field: &str, message: &str) -> Self {
        ServiceError::Invalid(vec![FieldViolation::new(field, message)])
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateKey(key) => {
                ServiceError::Conflict(format!("Duplicate value for {}", key))
            }
            StoreError::Backend(e) => ServiceError::Internal(e),
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Invalid(fields) => AppError::ValidationError(fields),
            ServiceError::Unauthenticated(msg) => AppError::Unauthorized(anyhow::anyhow!(msg)),
            ServiceError::Forbidden(msg) => AppError::Forbidden(anyhow::anyhow!(msg)),
            ServiceError::NotFound(msg) => AppError::NotFound(anyhow::anyhow!(msg)),
            ServiceError::Conflict(msg) => AppError::Conflict(anyhow::anyhow!(msg)),
            ServiceError::InvalidState(msg) => AppError::InvalidState(anyhow::anyhow!(msg)),
            ServiceError::InvalidTransition(msg) => {
                AppError::InvalidTransition(anyhow::anyhow!(msg))
            }
            ServiceError::Internal(e) => AppError::InternalError(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn business_rule_failures_keep_their_kind() {
        let cases = [
            (ServiceError::Forbidden("nope".into()), StatusCode::FORBIDDEN, "forbidden"),
            (ServiceError::InvalidState("closed".into()), StatusCode::CONFLICT, "invalid_state"),
            (
                ServiceError::InvalidTransition("done".into()),
                StatusCode::CONFLICT,
                "invalid_transition",
            ),
            (ServiceError::invalid("email", "bad"), StatusCode::BAD_REQUEST, "invalid"),
        ];

        for (err, status, kind) in cases {
            let app: AppError = err.into();
            assert_eq!(app.status(), status);
            assert_eq!(app.kind(), kind);
        }
    }

    #[test]
    fn backend_failures_become_internal() {
        let err: ServiceError = StoreError::Backend(anyhow::anyhow!("socket closed")).into();
        let app: AppError = err.into();
        assert_eq!(app.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
