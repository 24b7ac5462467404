//! `amg-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).
//! Storage adapters live in `amg-infra`; authentication lives in `amg-auth`.

pub mod error;
pub mod id;
pub mod user;

pub use error::{DomainError, DomainResult};
pub use id::UserId;
pub use user::{
    NewUser, SearchUserQuery, SearchUserResult, User, UserRepository, UserUpdate, validate_password,
};
