use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use service_core::error::AppError;

use crate::{models::Identity, services::TokenError, AppState};

/// Requires a valid bearer token and attaches the caller's `Identity`.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            AppError::Unauthorized(anyhow::anyhow!("Missing or invalid Authorization header"))
        })?;

    let identity = state.jwt.verify(token).map_err(|e| {
        tracing::debug!(error = %e, "Rejected bearer token");
        match e {
            TokenError::Expired => AppError::Unauthorized(anyhow::anyhow!("Token expired")),
            TokenError::Malformed | TokenError::InvalidSignature => {
                AppError::Unauthorized(anyhow::anyhow!("Invalid token"))
            }
        }
    })?;

    tracing::Span::current().record("user_id", identity.id.as_str());
    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}

/// Extractor for the identity attached by `auth_middleware`.
pub struct AuthUser(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let identity = parts.extensions.get::<Identity>().ok_or_else(|| {
            AppError::InternalError(anyhow::anyhow!(
                "Identity missing from request extensions"
            ))
        })?;

        Ok(AuthUser(identity.clone()))
    }
}
