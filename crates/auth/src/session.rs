//! Login and logout: the two write paths around a session token.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{
    AuthConfig, AuthError, Identity, IssuedToken, PasswordHasher, Role, SigningError, TokenCodec,
    guard::extract_bearer,
    password::PasswordError,
    revocation::{RevocationStore, TokenKey, bounded},
};

/// What the directory knows about an account for authentication purposes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub subject: String,
    pub password_hash: String,
    pub role: Role,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("credential lookup failed: {0}")]
pub struct CredentialLookupError(pub String);

/// Source of credentials keyed by login email.
pub trait CredentialDirectory: Send + Sync {
    fn find_credentials(&self, email: &str) -> Result<Option<Credentials>, CredentialLookupError>;
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoginError {
    /// Unknown email and wrong password are reported identically.
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error(transparent)]
    Lookup(#[from] CredentialLookupError),

    #[error(transparent)]
    Signing(#[from] SigningError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutOutcome {
    /// The token is now revoked for the given TTL.
    Revoked { ttl: Duration },

    /// The token had already expired; nothing needed recording.
    AlreadyExpired,
}

#[derive(Clone)]
pub struct SessionService {
    codec: Arc<TokenCodec>,
    store: Arc<dyn RevocationStore>,
    hasher: Arc<dyn PasswordHasher>,
    directory: Arc<dyn CredentialDirectory>,
    store_timeout: Duration,
    max_session: Duration,
    decoy_hash: Arc<str>,
}

impl SessionService {
    /// Build the service. Hashes a throwaway password once so that logins
    /// for unknown emails spend the same verification time as real ones.
    pub fn new(
        codec: Arc<TokenCodec>,
        store: Arc<dyn RevocationStore>,
        hasher: Arc<dyn PasswordHasher>,
        directory: Arc<dyn CredentialDirectory>,
        config: &AuthConfig,
    ) -> Result<Self, PasswordError> {
        let decoy_hash: Arc<str> = hasher.hash("decoy-password-for-unknown-accounts")?.into();
        Ok(Self {
            codec,
            store,
            hasher,
            directory,
            store_timeout: config.store_timeout,
            max_session: config.max_session.max(config.token_lifetime),
            decoy_hash,
        })
    }

    /// Verify credentials and issue a token.
    ///
    /// CPU-bound (password verification); async callers should run it on a
    /// blocking thread.
    pub fn login(&self, email: &str, password: &str) -> Result<IssuedToken, LoginError> {
        let Some(credentials) = self.directory.find_credentials(email)? else {
            let _ = self.hasher.verify(&self.decoy_hash, password);
            tracing::warn!("login rejected: unknown account");
            return Err(LoginError::InvalidCredentials);
        };

        if !self.hasher.verify(&credentials.password_hash, password) {
            tracing::warn!(subject = %credentials.subject, "login rejected: wrong password");
            return Err(LoginError::InvalidCredentials);
        }

        let identity = Identity::new(credentials.subject, credentials.role);
        let issued = self.codec.issue(&identity)?;
        tracing::info!(
            subject = identity.subject(),
            role = identity.role().as_str(),
            "session issued"
        );
        Ok(issued)
    }

    pub async fn logout(&self, authorization: Option<&str>) -> Result<LogoutOutcome, AuthError> {
        self.logout_at(authorization, Utc::now()).await
    }

    /// Revoke the presented bearer token for the rest of its lifetime.
    ///
    /// Idempotent: a token that is already revoked is revoked again, and an
    /// expired token is acknowledged without touching the store.
    pub async fn logout_at(
        &self,
        authorization: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<LogoutOutcome, AuthError> {
        let token = extract_bearer(authorization)?;
        let claims = match self.codec.parse_at(token, now) {
            Ok(claims) => claims,
            Err(AuthError::TokenExpired) => return Ok(LogoutOutcome::AlreadyExpired),
            Err(e) => {
                tracing::warn!(reason = e.kind(), "logout rejected");
                return Err(e);
            }
        };

        let ttl = claims
            .remaining_lifetime(now)
            .unwrap_or(self.max_session)
            .max(Duration::from_secs(1));

        let key = TokenKey::from_token(token);
        if let Err(e) = bounded(self.store_timeout, self.store.revoke(&key, ttl)).await {
            tracing::error!(error = %e, "failed to record revocation");
            return Err(e.into());
        }

        tracing::info!(subject = %claims.sub, ttl_secs = ttl.as_secs(), "session revoked");
        Ok(LogoutOutcome::Revoked { ttl })
    }
}
