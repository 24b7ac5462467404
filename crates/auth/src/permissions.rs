use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission identifier.
///
/// Permissions are opaque strings checked against the role table. There is
/// no wildcard: a role holds exactly the permissions listed for it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub const CREATE: Permission = Permission(Cow::Borrowed("create"));
    pub const READ: Permission = Permission(Cow::Borrowed("read"));
    pub const UPDATE: Permission = Permission(Cow::Borrowed("update"));
    pub const DELETE: Permission = Permission(Cow::Borrowed("delete"));

    pub const ALL: [Permission; 4] = [
        Permission::CREATE,
        Permission::READ,
        Permission::UPDATE,
        Permission::DELETE,
    ];

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
