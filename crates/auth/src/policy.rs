//! Role-based access policy.
//!
//! - No IO
//! - No panics
//! - Deny by default: anything not listed is refused

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::{Identity, Permission, Role};

/// Read-only `role -> permissions` mapping, built once at startup.
///
/// There is no role hierarchy and no wildcard. A role is granted exactly
/// the permissions listed for it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RolePermissionTable {
    grants: HashMap<Role, HashSet<Permission>>,
}

impl RolePermissionTable {
    /// `admin` may create/read/update/delete; `user` may read.
    pub fn standard() -> Self {
        Self::from_grants([
            (Role::ADMIN, Permission::ALL.to_vec()),
            (Role::USER, vec![Permission::READ]),
        ])
    }

    pub fn from_grants<I, P>(grants: I) -> Self
    where
        I: IntoIterator<Item = (Role, P)>,
        P: IntoIterator<Item = Permission>,
    {
        let mut table: HashMap<Role, HashSet<Permission>> = HashMap::new();
        for (role, perms) in grants {
            table.entry(role).or_default().extend(perms);
        }
        Self { grants: table }
    }

    pub fn permissions_for(&self, role: &Role) -> Option<&HashSet<Permission>> {
        self.grants.get(role)
    }

    pub fn roles(&self) -> impl Iterator<Item = &Role> {
        self.grants.keys()
    }
}

/// Decision functions over a shared [`RolePermissionTable`].
///
/// Cloning is cheap; clones share the same table.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    table: Arc<RolePermissionTable>,
}

impl AccessPolicy {
    pub fn new(table: RolePermissionTable) -> Self {
        Self {
            table: Arc::new(table),
        }
    }

    pub fn table(&self) -> &RolePermissionTable {
        &self.table
    }

    /// Unknown role or unknown permission → `false`.
    pub fn allows(&self, role: &Role, permission: &Permission) -> bool {
        self.table
            .permissions_for(role)
            .is_some_and(|perms| perms.contains(permission))
    }

    /// Membership of the identity's role in an explicit allow-list.
    pub fn has_role(&self, identity: &Identity, acceptable: &[Role]) -> bool {
        acceptable.contains(identity.role())
    }
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self::new(RolePermissionTable::standard())
    }
}
