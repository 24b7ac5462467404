//! `amg-auth`: session tokens, revocation and role-based access control.
//!
//! No HTTP or storage here. The guard takes a raw header value; the
//! revocation store, password hasher and credential directory are traits
//! implemented in `amg-infra`.

pub mod claims;
pub mod codec;
pub mod config;
pub mod error;
pub mod guard;
pub mod identity;
pub mod password;
pub mod permissions;
pub mod policy;
pub mod revocation;
pub mod roles;
pub mod route_guard;
pub mod session;

pub use claims::{Claims, validate_claims};
pub use codec::{IssuedToken, KeyMaterial, SigningError, TokenCodec};
pub use config::AuthConfig;
pub use error::AuthError;
pub use guard::{AuthContext, AuthGuard, extract_bearer};
pub use identity::Identity;
pub use jsonwebtoken::Algorithm;
pub use password::{PasswordError, PasswordHasher};
pub use permissions::Permission;
pub use policy::{AccessPolicy, RolePermissionTable};
pub use revocation::{RevocationError, RevocationStore, TokenKey};
pub use roles::Role;
pub use route_guard::{RouteGuard, enforce};
pub use session::{
    CredentialDirectory, CredentialLookupError, Credentials, LoginError, LogoutOutcome,
    SessionService,
};
