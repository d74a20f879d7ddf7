use chrono::Utc;
use service_core::error::FieldViolation;
use std::sync::Arc;

use super::store::{Page, StoreError, TourStore};
use super::{policy, JwtService, ServiceError};
use crate::dtos::auth::{AuthResponse, LoginRequest, RegisterRequest};
use crate::dtos::users::{UpdateUserRequest, UserListResponse, UserResponse};
use crate::dtos::Pagination;
use crate::models::{normalize_email, Identity, Role, User, VendorProfile};
use crate::utils::{hash_password, verify_password, Password, PasswordHashString};

/// Registration, login and account administration.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn TourStore>,
    jwt: JwtService,
}

impl AuthService {
    pub fn new(store: Arc<dyn TourStore>, jwt: JwtService) -> Self {
        Self { store, jwt }
    }

    pub async fn register(&self, req: RegisterRequest) -> Result<AuthResponse, ServiceError> {
        let role = req.role.unwrap_or(Role::User);
        let name = req.name.unwrap_or_default().trim().to_string();
        let company_name = req
            .vendor_profile
            .as_ref()
            .and_then(|profile| profile.company_name.as_deref())
            .map(str::trim)
            .unwrap_or_default()
            .to_string();

        let mut violations = Vec::new();
        if name.is_empty() {
            violations.push(FieldViolation::new("name", "Name is required"));
        }
        match role {
            Role::Admin => violations.push(FieldViolation::new(
                "role",
                "Admin accounts cannot be self-registered",
            )),
            Role::Vendor if req.vendor_profile.is_none() => violations.push(
                FieldViolation::new("vendorProfile", "Vendor profile is required"),
            ),
            Role::Vendor if company_name.is_empty() => violations.push(FieldViolation::new(
                "vendorProfile.companyName",
                "Company name is required",
            )),
            _ => {}
        }
        if !violations.is_empty() {
            return Err(ServiceError::Invalid(violations));
        }

        let vendor_profile = match (role, req.vendor_profile) {
            (Role::Vendor, Some(profile)) => Some(VendorProfile {
                company_name,
                phone: profile.phone,
                address: profile.address,
            }),
            _ => None,
        };
        let email = normalize_email(&req.email.unwrap_or_default());

        if self.store.find_user_by_email(&email).await?.is_some() {
            return Err(email_taken());
        }

        let hash = hash_password(Password::new(req.password.unwrap_or_default())).await?;
        let user = User::new(name, &email, hash.into_string(), role, vendor_profile);

        match self.store.insert_user(&user).await {
            Ok(()) => {}
            Err(StoreError::DuplicateKey(_)) => return Err(email_taken()),
            Err(e) => return Err(e.into()),
        }

        tracing::info!(user_id = %user.id, role = %user.role, "User registered");
        self.respond_with_token(user)
    }

    pub async fn login(&self, req: LoginRequest) -> Result<AuthResponse, ServiceError> {
        let email = normalize_email(&req.email.unwrap_or_default());
        let password = Password::new(req.password.unwrap_or_default());

        let mut user = self
            .store
            .find_user_by_email(&email)
            .await?
            .ok_or_else(invalid_credentials)?;

        let matches =
            verify_password(password, PasswordHashString::new(user.password_hash.clone())).await?;
        if !matches {
            tracing::warn!(user_id = %user.id, "Login failed: wrong password");
            return Err(invalid_credentials());
        }

        if !user.active {
            tracing::warn!(user_id = %user.id, "Login refused for disabled account");
            return Err(ServiceError::Forbidden("Account is disabled".to_string()));
        }

        let now = mongodb::bson::DateTime::from_chrono(Utc::now());
        user.last_login = Some(now);
        if let Err(e) = self.store.record_login(&user.id, now).await {
            tracing::warn!(user_id = %user.id, error = %e, "Failed to record last login");
        }

        tracing::info!(user_id = %user.id, "User logged in");
        self.respond_with_token(user)
    }

    pub async fn me(&self, actor: &Identity) -> Result<UserResponse, ServiceError> {
        self.store
            .find_user_by_id(&actor.id)
            .await?
            .map(UserResponse::from)
            .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))
    }

    pub async fn list_users(
        &self,
        actor: &Identity,
        role: Option<Role>,
        page: u64,
        limit: i64,
    ) -> Result<UserListResponse, ServiceError> {
        policy::permit(actor.role, policy::ADMIN_ONLY)?;

        let users = self.store.find_users(role, Page::new(page, limit)).await?;
        let total = self.store.count_users(role).await?;

        Ok(UserListResponse {
            users: users.into_iter().map(UserResponse::from).collect(),
            pagination: Pagination::new(page, limit, total),
        })
    }

    /// Admin changes a user's role or active flag.
    pub async fn update_user(
        &self,
        actor: &Identity,
        user_id: &str,
        req: UpdateUserRequest,
    ) -> Result<UserResponse, ServiceError> {
        policy::permit(actor.role, policy::ADMIN_ONLY)?;

        let mut user = self
            .store
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))?;

        if user.id == actor.id {
            let demoted = req.role.is_some_and(|r| r != Role::Admin);
            let disabled = req.active == Some(false);
            if demoted || disabled {
                return Err(ServiceError::InvalidState(
                    "Admins cannot demote or disable their own account".to_string(),
                ));
            }
        }

        if let Some(role) = req.role {
            if role == Role::Vendor && user.vendor_profile.is_none() {
                user.vendor_profile = Some(VendorProfile {
                    company_name: user.name.clone(),
                    phone: None,
                    address: None,
                });
            }
            user.role = role;
        }
        if let Some(active) = req.active {
            user.active = active;
        }

        if !self.store.update_user(&user).await? {
            return Err(ServiceError::NotFound("User not found".to_string()));
        }

        tracing::info!(
            admin_id = %actor.id,
            user_id = %user.id,
            role = %user.role,
            active = user.active,
            "User updated by admin"
        );
        Ok(user.into())
    }

    fn respond_with_token(&self, user: User) -> Result<AuthResponse, ServiceError> {
        let token = self.jwt.issue(&Identity::new(user.id.clone(), user.role))?;
        Ok(AuthResponse {
            token,
            user: user.into(),
        })
    }
}

fn email_taken() -> ServiceError {
    ServiceError::invalid("email", "Email already registered")
}

fn invalid_credentials() -> ServiceError {
    ServiceError::Unauthenticated("Invalid email or password".to_string())
}
