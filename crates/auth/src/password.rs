use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("password hashing failed: {0}")]
pub struct PasswordError(pub String);

/// Opaque password hashing collaborator.
///
/// The algorithm is the implementation's business; callers only hash on
/// write and verify on login. `verify` returns `false` for a malformed hash.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, plaintext: &str) -> Result<String, PasswordError>;

    fn verify(&self, hash: &str, plaintext: &str) -> bool;
}
