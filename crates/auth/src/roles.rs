use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Role identifier used for RBAC.
///
/// Roles travel inside tokens as opaque strings. Only [`Role::ADMIN`] and
/// [`Role::USER`] are known to the service; any other value is representable
/// (a token may carry it) but is granted nothing by the policy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub const ADMIN: Role = Role(Cow::Borrowed("admin"));
    pub const USER: Role = Role(Cow::Borrowed("user"));

    /// The closed set of roles accounts may be assigned.
    pub const KNOWN: [Role; 2] = [Role::ADMIN, Role::USER];

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_known(&self) -> bool {
        Self::KNOWN.contains(self)
    }

    /// Parse a role name, accepting only members of [`Role::KNOWN`].
    pub fn known(name: &str) -> Option<Self> {
        Self::KNOWN.into_iter().find(|r| r.as_str() == name)
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
