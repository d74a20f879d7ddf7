use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use service_core::error::AppError;

use crate::models::{Identity, Role};
use crate::services::policy;

/// Route-level role requirement, applied after `auth_middleware`.
#[derive(Debug, Clone, Copy)]
pub struct RoleGate(pub &'static [Role]);

pub async fn require_roles(
    State(RoleGate(required)): State<RoleGate>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identity = req.extensions().get::<Identity>().ok_or_else(|| {
        AppError::InternalError(anyhow::anyhow!(
            "Identity missing from request extensions"
        ))
    })?;

    if let Err(e) = policy::permit(identity.role, required) {
        tracing::warn!(
            user_id = %identity.id,
            role = %identity.role,
            path = %req.uri().path(),
            "Role gate denied request"
        );
        return Err(e.into());
    }

    Ok(next.run(req).await)
}
