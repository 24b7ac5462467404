use crate::{AccessPolicy, AuthError, Identity, Permission, Role};

/// A declarative authorization requirement attached to a route.
///
/// Guards only ever see an identity that already passed the auth guard.
/// Several guards on one route are AND-ed; [`enforce`] stops at the first
/// failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteGuard {
    /// The caller's role must be one of these.
    RequireRole(Vec<Role>),

    /// The caller's role must be granted this permission by the policy.
    RequirePermission(Permission),
}

impl RouteGuard {
    pub fn require_role(roles: impl IntoIterator<Item = Role>) -> Self {
        Self::RequireRole(roles.into_iter().collect())
    }

    pub fn require_permission(permission: Permission) -> Self {
        Self::RequirePermission(permission)
    }

    pub fn check(&self, identity: &Identity, policy: &AccessPolicy) -> Result<(), AuthError> {
        match self {
            RouteGuard::RequireRole(roles) => {
                if policy.has_role(identity, roles) {
                    Ok(())
                } else {
                    Err(AuthError::forbidden(format!(
                        "role '{}' is not allowed on this route",
                        identity.role()
                    )))
                }
            }
            RouteGuard::RequirePermission(permission) => {
                if policy.allows(identity.role(), permission) {
                    Ok(())
                } else {
                    Err(AuthError::forbidden(format!(
                        "role '{}' lacks permission '{}'",
                        identity.role(),
                        permission
                    )))
                }
            }
        }
    }
}

/// Evaluate guards in order; the first failure wins.
pub fn enforce(
    guards: &[RouteGuard],
    identity: &Identity,
    policy: &AccessPolicy,
) -> Result<(), AuthError> {
    guards.iter().try_for_each(|g| g.check(identity, policy))
}
