//! User accounts. Vendors are users with `role = vendor` and a vendor profile.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Vendor,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Vendor => "vendor",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Role::User),
            "vendor" => Ok(Role::Vendor),
            "admin" => Ok(Role::Admin),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct VendorProfile {
    pub company_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    /// Always stored lower-cased; uniqueness is case-insensitive.
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub active: bool,
    pub vendor_profile: Option<VendorProfile>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    pub last_login: Option<mongodb::bson::DateTime>,
}

impl User {
    pub fn new(
        name: String,
        email: &str,
        password_hash: String,
        role: Role,
        vendor_profile: Option<VendorProfile>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            email: normalize_email(email),
            password_hash,
            role,
            active: true,
            vendor_profile,
            created_at: Utc::now(),
            last_login: None,
        }
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
