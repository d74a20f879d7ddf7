use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::users::UserResponse;
use crate::models::Role;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(
        required(message = "Name is required"),
        length(min = 1, max = 100, message = "Name must be 1-100 characters")
    )]
    #[schema(example = "Asha Menon")]
    pub name: Option<String>,

    #[validate(
        required(message = "Email is required"),
        email(message = "Invalid email format")
    )]
    #[schema(example = "asha@example.com")]
    pub email: Option<String>,

    #[validate(
        required(message = "Password is required"),
        length(min = 8, message = "Password must be at least 8 characters")
    )]
    #[schema(example = "password123", min_length = 8)]
    pub password: Option<String>,

    /// `user` (default) or `vendor`. Admin accounts cannot self-register.
    pub role: Option<Role>,

    /// Required when `role` is `vendor`.
    pub vendor_profile: Option<VendorProfileInput>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VendorProfileInput {
    #[schema(example = "Backwater Trails")]
    pub company_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(
        required(message = "Email is required"),
        email(message = "Invalid email format")
    )]
    #[schema(example = "asha@example.com")]
    pub email: Option<String>,

    #[validate(
        required(message = "Password is required"),
        length(min = 1, message = "Password is required")
    )]
    #[schema(example = "password123")]
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}
