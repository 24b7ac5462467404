//! User accounts: the record behind every login.
//!
//! The model is storage-agnostic. Roles are carried as plain strings here;
//! whether a role is known is decided by the authorization layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{DomainError, DomainResult, UserId};

/// A stored user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a user. `password_hash` is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
}

impl NewUser {
    pub fn validate(&self) -> DomainResult<()> {
        validate_email(&self.email)?;
        if self.first_name.trim().is_empty() {
            return Err(DomainError::validation("first_name must not be empty"));
        }
        if self.last_name.trim().is_empty() {
            return Err(DomainError::validation("last_name must not be empty"));
        }
        Ok(())
    }
}

/// Replacement values for an existing user.
#[derive(Debug, Clone, Deserialize)]
pub struct UserUpdate {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: String,
}

impl UserUpdate {
    pub fn validate(&self) -> DomainResult<()> {
        validate_email(&self.email)?;
        if self.first_name.trim().is_empty() || self.last_name.trim().is_empty() {
            return Err(DomainError::validation("names must not be empty"));
        }
        Ok(())
    }
}

/// Filters for user search. Empty filters match everything.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchUserQuery {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

impl SearchUserQuery {
    pub const DEFAULT_PAGE: usize = 1;
    pub const DEFAULT_PER_PAGE: usize = 20;

    pub fn page(&self) -> usize {
        self.page.filter(|p| *p > 0).unwrap_or(Self::DEFAULT_PAGE)
    }

    pub fn per_page(&self) -> usize {
        self.per_page.filter(|p| *p > 0).unwrap_or(Self::DEFAULT_PER_PAGE)
    }

    /// Case-insensitive substring match on names/email, exact match on role.
    pub fn matches(&self, user: &User) -> bool {
        fn contains(haystack: &str, needle: &Option<String>) -> bool {
            match needle {
                Some(n) if !n.is_empty() => haystack.to_lowercase().contains(&n.to_lowercase()),
                _ => true,
            }
        }

        contains(&user.first_name, &self.first_name)
            && contains(&user.last_name, &self.last_name)
            && contains(&user.email, &self.email)
            && self.role.as_deref().is_none_or(|r| r.is_empty() || r == user.role)
    }
}

/// One page of search results.
#[derive(Debug, Clone, Serialize)]
pub struct SearchUserResult {
    pub total_count: usize,
    pub users: Vec<User>,
    pub page: usize,
    pub per_page: usize,
}

/// Storage contract for user accounts.
///
/// Implementations must enforce email uniqueness (case-insensitive) and
/// return [`DomainError::NotFound`] for unknown ids.
pub trait UserRepository: Send + Sync {
    fn create(&self, user: NewUser) -> DomainResult<User>;

    fn get(&self, id: &UserId) -> DomainResult<User>;

    fn find_by_email(&self, email: &str) -> DomainResult<Option<User>>;

    fn update(&self, id: &UserId, update: UserUpdate) -> DomainResult<User>;

    fn delete(&self, id: &UserId) -> DomainResult<()>;

    fn search(&self, query: &SearchUserQuery) -> DomainResult<SearchUserResult>;
}

pub const MIN_PASSWORD_LEN: usize = 8;

/// Plaintext password policy, checked before hashing.
pub fn validate_password(password: &str) -> DomainResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(DomainError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

fn validate_email(email: &str) -> DomainResult<()> {
    let (local, domain) = email
        .split_once('@')
        .ok_or_else(|| DomainError::validation("email must contain '@'"))?;
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(DomainError::validation("email is malformed"));
    }
    Ok(())
}
