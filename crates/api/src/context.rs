use chrono::{DateTime, Utc};

use amg_auth::{AuthContext, Identity, Role};

/// Authenticated caller for the current request.
///
/// Inserted by the auth middleware; handlers behind it can rely on it
/// being present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    identity: Identity,
    expires_at: Option<DateTime<Utc>>,
}

impl PrincipalContext {
    pub fn new(identity: Identity, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            identity,
            expires_at,
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn subject(&self) -> &str {
        self.identity.subject()
    }

    pub fn role(&self) -> &Role {
        self.identity.role()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }
}

impl From<AuthContext> for PrincipalContext {
    fn from(ctx: AuthContext) -> Self {
        Self::new(ctx.identity().clone(), ctx.claims().expires_at())
    }
}
