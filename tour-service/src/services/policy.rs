//! Role gate.
//!
//! The same predicate guards routes (see `middleware::role`) and every
//! repository operation, so callers that bypass HTTP get identical answers.

use super::ServiceError;
use crate::models::Role;

pub const ANY_ROLE: &[Role] = &[Role::User, Role::Vendor, Role::Admin];
pub const VENDOR_OR_ADMIN: &[Role] = &[Role::Vendor, Role::Admin];
pub const ADMIN_ONLY: &[Role] = &[Role::Admin];

/// Allows `role` iff it is listed in `required`. Admin is never implied.
pub fn permit(role: Role, required: &[Role]) -> Result<(), ServiceError> {
    if required.contains(&role) {
        Ok(())
    } else {
        Err(ServiceError::Forbidden(format!(
            "Role '{}' is not permitted to perform this action",
            role
        )))
    }
}
