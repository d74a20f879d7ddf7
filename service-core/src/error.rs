use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// A single rejected input field, reported back to the client by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation failed for {} field(s)", .0.len())]
    ValidationError(Vec<FieldViolation>),

    #[error("Bad request: {0}")]
    BadRequest(anyhow::Error),

    #[error("Unauthorized: {0}")]
    Unauthorized(anyhow::Error),

    #[error("Forbidden: {0}")]
    Forbidden(anyhow::Error),

    #[error("Not found: {0}")]
    NotFound(anyhow::Error),

    #[error("Conflict: {0}")]
    Conflict(anyhow::Error),

    #[error("Invalid state: {0}")]
    InvalidState(anyhow::Error),

    #[error("Invalid transition: {0}")]
    InvalidTransition(anyhow::Error),

    #[error("Too many requests: {0}")]
    TooManyRequests(String, Option<u64>),

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),

    #[error("Service Unavailable")]
    ServiceUnavailable,

    #[error("Database error: {0}")]
    DatabaseError(anyhow::Error),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),
}

impl AppError {
    /// Stable machine-readable error kind carried in every error body.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) | AppError::BadRequest(_) => "invalid",
            AppError::Unauthorized(_) => "unauthenticated",
            AppError::Forbidden(_) => "forbidden",
            AppError::NotFound(_) => "not_found",
            AppError::Conflict(_) => "conflict",
            AppError::InvalidState(_) => "invalid_state",
            AppError::InvalidTransition(_) => "invalid_transition",
            AppError::TooManyRequests(..) => "too_many_requests",
            AppError::ServiceUnavailable => "unavailable",
            AppError::InternalError(_) | AppError::DatabaseError(_) | AppError::ConfigError(_) => {
                "internal"
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) | AppError::InvalidState(_) | AppError::InvalidTransition(_) => {
                StatusCode::CONFLICT
            }
            AppError::TooManyRequests(..) => StatusCode::TOO_MANY_REQUESTS,
            AppError::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            AppError::InternalError(_) | AppError::DatabaseError(_) | AppError::ConfigError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Flattens `validator` output into one violation per failed rule, with
/// field names in the camelCase used on the wire.
pub fn violations_from(errors: &validator::ValidationErrors) -> Vec<FieldViolation> {
    let mut violations: Vec<FieldViolation> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            let field = camel_case(field);
            errs.iter().map(move |err| {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("failed '{}' check", err.code));
                FieldViolation::new(field.clone(), message)
            })
        })
        .collect();
    violations.sort_by(|a, b| a.field.cmp(&b.field).then(a.message.cmp(&b.message)));
    violations
}

fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::ValidationError(violations_from(&err))
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: String,
            kind: &'static str,
            #[serde(skip_serializing_if = "Option::is_none")]
            details: Option<String>,
            #[serde(skip_serializing_if = "Vec::is_empty")]
            fields: Vec<FieldViolation>,
        }

        let status = self.status();
        let kind = self.kind();

        let (error_message, details, fields, retry_after) = match self {
            AppError::ValidationError(fields) => {
                ("Validation error".to_string(), None, fields, None)
            }
            AppError::BadRequest(err)
            | AppError::Unauthorized(err)
            | AppError::Forbidden(err)
            | AppError::NotFound(err)
            | AppError::Conflict(err)
            | AppError::InvalidState(err)
            | AppError::InvalidTransition(err) => (err.to_string(), None, Vec::new(), None),
            AppError::TooManyRequests(msg, retry) => (msg, None, Vec::new(), retry),
            AppError::ServiceUnavailable => {
                ("Service unavailable".to_string(), None, Vec::new(), None)
            }
            AppError::InternalError(err) => {
                tracing::error!(error = ?err, "Internal server error");
                ("Internal server error".to_string(), None, Vec::new(), None)
            }
            AppError::DatabaseError(err) => {
                tracing::error!(error = %err, "Database error");
                ("Database error".to_string(), None, Vec::new(), None)
            }
            AppError::ConfigError(err) => {
                tracing::error!(error = %err, "Configuration error");
                (
                    "Configuration error".to_string(),
                    Some(err.to_string()),
                    Vec::new(),
                    None,
                )
            }
        };

        let mut res = (
            status,
            Json(ErrorResponse {
                error: error_message,
                kind,
                details,
                fields,
            }),
        )
            .into_response();

        if let Some(retry) = retry_after {
            res.headers_mut()
                .insert(axum::http::header::RETRY_AFTER, retry.into());
        }

        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use validator::Validate;

    #[derive(Validate)]
    struct Signup {
        #[validate(length(min = 1, message = "Name is required"))]
        display_name: String,
        #[validate(email(message = "Invalid email format"))]
        email: String,
    }

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body should be readable")
            .to_bytes();
        (
            status,
            serde_json::from_slice(&bytes).expect("body should be JSON"),
        )
    }

    #[test]
    fn violations_cover_every_failed_field_in_camel_case() {
        let signup = Signup {
            display_name: String::new(),
            email: "not-an-email".to_string(),
        };
        let errors = signup.validate().expect_err("both fields are invalid");

        let violations = violations_from(&errors);

        assert_eq!(
            violations,
            vec![
                FieldViolation::new("displayName", "Name is required"),
                FieldViolation::new("email", "Invalid email format"),
            ]
        );
    }

    #[tokio::test]
    async fn business_rule_errors_map_to_conflict() {
        for err in [
            AppError::Conflict(anyhow::anyhow!("Package has bookings")),
            AppError::InvalidState(anyhow::anyhow!("Package is not approved")),
            AppError::InvalidTransition(anyhow::anyhow!("Cannot complete a pending booking")),
        ] {
            let expected_kind = err.kind();
            let (status, body) = body_json(err).await;
            assert_eq!(status, StatusCode::CONFLICT);
            assert_eq!(body["kind"], expected_kind);
        }
    }

    #[tokio::test]
    async fn validation_error_lists_fields() {
        let (status, body) = body_json(AppError::ValidationError(vec![
            FieldViolation::new("price", "Price must be non-negative"),
            FieldViolation::new("title", "Title is required"),
        ]))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "invalid");
        assert_eq!(body["fields"].as_array().map(Vec::len), Some(2));
        assert_eq!(body["fields"][1]["field"], "title");
    }

    #[tokio::test]
    async fn internal_errors_do_not_leak_details() {
        let (status, body) =
            body_json(AppError::InternalError(anyhow::anyhow!("connection reset by peer"))).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");
        assert!(body.get("details").is_none());
    }

    #[tokio::test]
    async fn rate_limit_sets_retry_after() {
        let response =
            AppError::TooManyRequests("Too many requests".to_string(), Some(30)).into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            response.headers().get(axum::http::header::RETRY_AFTER),
            Some(&axum::http::HeaderValue::from(30u64))
        );
    }

    #[tokio::test]
    async fn unavailable_is_a_503() {
        let (status, body) = body_json(AppError::ServiceUnavailable).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["kind"], "unavailable");
    }
}
