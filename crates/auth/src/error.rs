//! Authentication/authorization failure taxonomy.

use thiserror::Error;

use crate::revocation::RevocationError;

/// Every way a protected request can be refused.
///
/// All variants except [`AuthError::Infrastructure`] are client faults: the
/// caller re-authenticates. The `Display` text is for logs; transports must
/// render [`AuthError::public_code`] instead so that token failures stay
/// indistinguishable to the client.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("authorization header is missing")]
    MissingCredential,

    #[error("authorization header is not a bearer credential")]
    MalformedCredential,

    #[error("token is not well-formed")]
    MalformedToken,

    #[error("token signature verification failed")]
    InvalidSignature,

    #[error("token has expired")]
    TokenExpired,

    #[error("token has been revoked")]
    TokenRevoked,

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("authentication infrastructure failure: {0}")]
    Infrastructure(String),
}

impl AuthError {
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    /// Precise, log-only reason.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::MissingCredential => "missing_credential",
            AuthError::MalformedCredential => "malformed_credential",
            AuthError::MalformedToken => "malformed_token",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::TokenExpired => "token_expired",
            AuthError::TokenRevoked => "token_revoked",
            AuthError::Forbidden(_) => "forbidden",
            AuthError::Infrastructure(_) => "infrastructure",
        }
    }

    /// Client-facing code. Malformed, forged and expired tokens collapse into
    /// one value.
    pub fn public_code(&self) -> &'static str {
        match self {
            AuthError::MalformedToken | AuthError::InvalidSignature | AuthError::TokenExpired => {
                "invalid_token"
            }
            AuthError::Infrastructure(_) => "service_unavailable",
            other => other.kind(),
        }
    }

    /// Client-facing message, free of internal detail.
    pub fn public_message(&self) -> &'static str {
        match self {
            AuthError::MissingCredential => "missing bearer token",
            AuthError::MalformedCredential => "authorization header must use the Bearer scheme",
            AuthError::MalformedToken | AuthError::InvalidSignature | AuthError::TokenExpired => {
                "invalid or expired token"
            }
            AuthError::TokenRevoked => "token has been revoked",
            AuthError::Forbidden(_) => "insufficient privileges",
            AuthError::Infrastructure(_) => "authentication is temporarily unavailable",
        }
    }

    /// `true` when the caller must re-authenticate (HTTP 401).
    pub fn is_unauthenticated(&self) -> bool {
        !matches!(self, AuthError::Forbidden(_) | AuthError::Infrastructure(_))
    }

    pub fn is_infrastructure(&self) -> bool {
        matches!(self, AuthError::Infrastructure(_))
    }
}

impl From<RevocationError> for AuthError {
    fn from(value: RevocationError) -> Self {
        AuthError::Infrastructure(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_failures_share_one_public_code() {
        let codes: Vec<_> = [
            AuthError::MalformedToken,
            AuthError::InvalidSignature,
            AuthError::TokenExpired,
        ]
        .iter()
        .map(|e| (e.public_code(), e.public_message()))
        .collect();

        assert!(codes.windows(2).all(|w| w[0] == w[1]));
        assert_ne!(AuthError::InvalidSignature.kind(), AuthError::TokenExpired.kind());
    }

    #[test]
    fn only_forbidden_and_infrastructure_are_not_401() {
        assert!(AuthError::TokenRevoked.is_unauthenticated());
        assert!(AuthError::MalformedCredential.is_unauthenticated());
        assert!(!AuthError::forbidden("x").is_unauthenticated());
        assert!(!AuthError::Infrastructure("down".into()).is_unauthenticated());
    }
}
