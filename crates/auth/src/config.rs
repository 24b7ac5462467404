use std::time::Duration;

use jsonwebtoken::Algorithm;

/// Tunables for issuing, validating and revoking session tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthConfig {
    /// Signature algorithm for issued tokens; tokens signed otherwise are rejected.
    pub algorithm: Algorithm,

    /// `exp - iat` for every issued token.
    pub token_lifetime: Duration,

    /// Revocation TTL used when a token's remaining lifetime cannot be computed.
    /// Never shorter than `token_lifetime`.
    pub max_session: Duration,

    /// Upper bound on any single revocation-store round trip.
    pub store_timeout: Duration,
}

impl AuthConfig {
    pub const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(24 * 60 * 60);
    pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(2);
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::HS256,
            token_lifetime: Self::DEFAULT_TOKEN_LIFETIME,
            max_session: Self::DEFAULT_TOKEN_LIFETIME,
            store_timeout: Self::DEFAULT_STORE_TIMEOUT,
        }
    }
}
