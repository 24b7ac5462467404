//! Infrastructure layer: configuration, revocation stores, password hashing
//! and the user store.

pub mod config;
pub mod password;
pub mod revocation;
pub mod users;

pub use config::{AdminSeed, AppConfig, ConfigError, KeySource, LogFormat};
pub use password::Argon2PasswordHasher;
pub use revocation::InMemoryRevocationStore;
#[cfg(feature = "redis")]
pub use revocation::RedisRevocationStore;
pub use users::InMemoryUserRepository;
