//! Per-request authentication.
//!
//! The guard is framework-agnostic: it takes the raw `Authorization` header
//! value and returns either an [`AuthContext`] or the first failure.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::{
    AuthError, Claims, Identity, TokenCodec,
    revocation::{RevocationStore, TokenKey, bounded},
};

pub const BEARER_PREFIX: &str = "Bearer ";

/// Request-scoped result of successful authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    identity: Identity,
    claims: Claims,
}

impl AuthContext {
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn claims(&self) -> &Claims {
        &self.claims
    }
}

/// Strip the exact `"Bearer "` scheme from a header value.
pub fn extract_bearer(authorization: Option<&str>) -> Result<&str, AuthError> {
    let header = authorization.ok_or(AuthError::MissingCredential)?;
    let token = header
        .strip_prefix(BEARER_PREFIX)
        .ok_or(AuthError::MalformedCredential)?
        .trim();

    if token.is_empty() {
        return Err(AuthError::MalformedCredential);
    }
    Ok(token)
}

#[derive(Clone)]
pub struct AuthGuard {
    codec: Arc<TokenCodec>,
    store: Arc<dyn RevocationStore>,
    store_timeout: Duration,
}

impl AuthGuard {
    pub fn new(
        codec: Arc<TokenCodec>,
        store: Arc<dyn RevocationStore>,
        store_timeout: Duration,
    ) -> Self {
        Self {
            codec,
            store,
            store_timeout,
        }
    }

    pub async fn authenticate(&self, authorization: Option<&str>) -> Result<AuthContext, AuthError> {
        self.authenticate_at(authorization, Utc::now()).await
    }

    /// Run the guard steps in order, stopping at the first failure:
    /// header → bearer scheme → token → revocation.
    pub async fn authenticate_at(
        &self,
        authorization: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<AuthContext, AuthError> {
        let result = self.check(authorization, now).await;

        match &result {
            Ok(ctx) => tracing::debug!(
                subject = ctx.identity.subject(),
                role = ctx.identity.role().as_str(),
                "request authenticated"
            ),
            Err(e) if e.is_infrastructure() => {
                tracing::error!(error = %e, "revocation check failed; denying request")
            }
            Err(e) => tracing::warn!(reason = e.kind(), "authentication rejected"),
        }

        result
    }

    async fn check(
        &self,
        authorization: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<AuthContext, AuthError> {
        let token = extract_bearer(authorization)?;
        let claims = self.codec.parse_at(token, now)?;

        let key = TokenKey::from_token(token);
        let revoked = bounded(self.store_timeout, self.store.is_revoked(&key)).await?;
        if revoked {
            return Err(AuthError::TokenRevoked);
        }

        Ok(AuthContext {
            identity: claims.identity(),
            claims,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Role;
    use crate::revocation::RevocationError;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct SetStore {
        revoked: Mutex<HashSet<TokenKey>>,
        lookups: AtomicUsize,
    }

    #[async_trait]
    impl RevocationStore for SetStore {
        async fn revoke(&self, key: &TokenKey, _ttl: Duration) -> Result<(), RevocationError> {
            self.revoked.lock().unwrap().insert(key.clone());
            Ok(())
        }

        async fn is_revoked(&self, key: &TokenKey) -> Result<bool, RevocationError> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            Ok(self.revoked.lock().unwrap().contains(key))
        }
    }

    struct DownStore;

    #[async_trait]
    impl RevocationStore for DownStore {
        async fn revoke(&self, _: &TokenKey, _: Duration) -> Result<(), RevocationError> {
            Err(RevocationError::Unavailable("connection refused".into()))
        }

        async fn is_revoked(&self, _: &TokenKey) -> Result<bool, RevocationError> {
            Err(RevocationError::Unavailable("connection refused".into()))
        }
    }

    struct HangingStore;

    #[async_trait]
    impl RevocationStore for HangingStore {
        async fn revoke(&self, _: &TokenKey, _: Duration) -> Result<(), RevocationError> {
            std::future::pending().await
        }

        async fn is_revoked(&self, _: &TokenKey) -> Result<bool, RevocationError> {
            std::future::pending().await
        }
    }

    fn codec() -> Arc<TokenCodec> {
        Arc::new(TokenCodec::hs256(b"guard-secret".to_vec(), Duration::from_secs(600)).unwrap())
    }

    fn bearer(token: &str) -> String {
        format!("Bearer {token}")
    }

    #[test]
    fn extract_bearer_requires_exact_scheme() {
        assert_eq!(extract_bearer(None), Err(AuthError::MissingCredential));
        assert_eq!(extract_bearer(Some("Token abc")), Err(AuthError::MalformedCredential));
        assert_eq!(extract_bearer(Some("bearer abc")), Err(AuthError::MalformedCredential));
        assert_eq!(extract_bearer(Some("Bearer")), Err(AuthError::MalformedCredential));
        assert_eq!(extract_bearer(Some("Bearer   ")), Err(AuthError::MalformedCredential));
        assert_eq!(extract_bearer(Some("Bearer abc")), Ok("abc"));
    }

    #[tokio::test]
    async fn valid_token_yields_identity() {
        let codec = codec();
        let store = Arc::new(SetStore::default());
        let guard = AuthGuard::new(codec.clone(), store.clone(), Duration::from_secs(1));

        let identity = Identity::new("alice@example.com", Role::USER);
        let issued = codec.issue(&identity).unwrap();

        let ctx = guard.authenticate(Some(&bearer(&issued.token))).await.unwrap();
        assert_eq!(ctx.identity(), &identity);
        assert_eq!(ctx.claims().jti, issued.claims.jti);
        assert_eq!(store.lookups.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn bad_tokens_never_reach_the_store() {
        let store = Arc::new(SetStore::default());
        let guard = AuthGuard::new(codec(), store.clone(), Duration::from_secs(1));

        assert_eq!(guard.authenticate(None).await, Err(AuthError::MissingCredential));
        assert_eq!(
            guard.authenticate(Some("Token abc")).await,
            Err(AuthError::MalformedCredential)
        );
        assert_eq!(
            guard.authenticate(Some("Bearer not-a-token")).await,
            Err(AuthError::MalformedToken)
        );
        assert_eq!(store.lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn revoked_token_is_rejected_but_siblings_are_not() {
        let codec = codec();
        let store = Arc::new(SetStore::default());
        let guard = AuthGuard::new(codec.clone(), store.clone(), Duration::from_secs(1));

        let identity = Identity::new("alice@example.com", Role::USER);
        let first = codec.issue(&identity).unwrap();
        let second = codec.issue(&identity).unwrap();

        store
            .revoke(&TokenKey::from_token(&first.token), Duration::from_secs(600))
            .await
            .unwrap();

        assert_eq!(
            guard.authenticate(Some(&bearer(&first.token))).await,
            Err(AuthError::TokenRevoked)
        );
        assert!(guard.authenticate(Some(&bearer(&second.token))).await.is_ok());
    }

    #[tokio::test]
    async fn store_failure_fails_closed() {
        let codec = codec();
        let guard = AuthGuard::new(codec.clone(), Arc::new(DownStore), Duration::from_secs(1));
        let issued = codec
            .issue(&Identity::new("alice@example.com", Role::ADMIN))
            .unwrap();

        let err = guard
            .authenticate(Some(&bearer(&issued.token)))
            .await
            .unwrap_err();
        assert!(err.is_infrastructure(), "got {err:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_store_times_out_into_infrastructure_error() {
        let codec = codec();
        let guard = AuthGuard::new(codec.clone(), Arc::new(HangingStore), Duration::from_millis(250));
        let issued = codec
            .issue(&Identity::new("alice@example.com", Role::USER))
            .unwrap();

        let err = guard
            .authenticate(Some(&bearer(&issued.token)))
            .await
            .unwrap_err();
        assert!(err.is_infrastructure(), "got {err:?}");
    }
}
