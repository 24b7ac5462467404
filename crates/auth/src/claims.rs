use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::{AuthError, Identity, Role};

/// Claims carried in the token payload.
///
/// Timestamps are seconds since the Unix epoch, as on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user email).
    pub sub: String,

    /// The single role granted to the subject.
    pub role: Role,

    /// Issued-at timestamp.
    pub iat: i64,

    /// Expiration timestamp.
    pub exp: i64,

    /// Unique per issuance.
    pub jti: String,
}

impl Claims {
    pub fn identity(&self) -> Identity {
        Identity::new(self.sub.clone(), self.role.clone())
    }

    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.iat, 0).single()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.exp, 0).single()
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.exp <= now.timestamp()
    }

    /// Time left until `exp`, or `None` once the token is no longer usable.
    pub fn remaining_lifetime(&self, now: DateTime<Utc>) -> Option<Duration> {
        let remaining = self.exp.checked_sub(now.timestamp())?;
        u64::try_from(remaining)
            .ok()
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

/// Deterministically validate the time window of verified claims.
pub fn validate_claims(claims: &Claims, now: DateTime<Utc>) -> Result<(), AuthError> {
    if claims.exp <= claims.iat {
        return Err(AuthError::MalformedToken);
    }
    if claims.is_expired(now) {
        return Err(AuthError::TokenExpired);
    }
    Ok(())
}
