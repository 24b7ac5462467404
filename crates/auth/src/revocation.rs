//! Revocation (logout) contract.
//!
//! The store is external and shared between processes; this crate only
//! defines the contract and the canonical key. Adapters live in `amg-infra`.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Canonical revocation key of a bearer token: hex SHA-256 of the raw value.
///
/// Hashing keeps raw tokens out of the store and gives fixed-size keys.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct TokenKey(String);

impl TokenKey {
    pub fn from_token(raw: &str) -> Self {
        Self(hex::encode(Sha256::digest(raw.as_bytes())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Debug for TokenKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "TokenKey({}..)", &self.0[..8.min(self.0.len())])
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RevocationError {
    #[error("revocation store unavailable: {0}")]
    Unavailable(String),

    #[error("revocation store did not answer within {0:?}")]
    Timeout(Duration),
}

/// Key-value store of revoked tokens with native per-entry expiry.
///
/// Implementations must be safe for arbitrary concurrent callers without
/// client-side locking, and a `revoke` that has returned must be visible to
/// every `is_revoked` that starts afterwards.
#[async_trait]
pub trait RevocationStore: Send + Sync {
    /// Mark `key` revoked for at least `ttl`. Revoking twice succeeds.
    async fn revoke(&self, key: &TokenKey, ttl: Duration) -> Result<(), RevocationError>;

    async fn is_revoked(&self, key: &TokenKey) -> Result<bool, RevocationError>;
}

/// Run a store call with an upper bound, turning a hang into [`RevocationError::Timeout`].
pub async fn bounded<T, F>(timeout: Duration, call: F) -> Result<T, RevocationError>
where
    F: Future<Output = Result<T, RevocationError>>,
{
    tokio::time::timeout(timeout, call)
        .await
        .map_err(|_| RevocationError::Timeout(timeout))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_deterministic_and_distinct_per_token() {
        let a = TokenKey::from_token("aaa.bbb.ccc");
        assert_eq!(a, TokenKey::from_token("aaa.bbb.ccc"));
        assert_ne!(a, TokenKey::from_token("aaa.bbb.ccd"));
        assert_eq!(a.as_str().len(), 64);
        assert!(!a.as_str().contains("aaa"));
    }

    #[tokio::test(start_paused = true)]
    async fn bounded_converts_a_hang_into_timeout() {
        let hang = std::future::pending::<Result<bool, RevocationError>>();
        let res = bounded(Duration::from_millis(50), hang).await;
        assert_eq!(res, Err(RevocationError::Timeout(Duration::from_millis(50))));
    }
}
