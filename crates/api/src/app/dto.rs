use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use amg_auth::{IssuedToken, Role};
use amg_core::DomainError;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub role: String,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: &'static str,
    pub role: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<IssuedToken> for LoginResponse {
    fn from(issued: IssuedToken) -> Self {
        Self {
            expires_at: issued.claims.expires_at(),
            role: issued.claims.role.to_string(),
            token: issued.token,
            token_type: "Bearer",
        }
    }
}

// -------------------------
// Helpers
// -------------------------

/// Only roles the policy knows about may be assigned.
pub fn known_role(role: &str) -> Result<Role, DomainError> {
    Role::known(role).ok_or_else(|| {
        DomainError::validation(format!("unknown role '{role}' (expected admin or user)"))
    })
}
