use axum::{
    Router,
    routing::{get, post},
};

use amg_auth::AccessPolicy;

pub mod session;
pub mod system;
pub mod users;

/// Endpoints reachable without a valid session.
pub fn public_router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .route("/users/register", post(session::register))
        .route("/users/login", post(session::login))
        .route("/users/logout", post(session::logout))
}

/// Endpoints behind the auth middleware. Per-route guards are attached here.
pub fn protected_router(policy: &AccessPolicy) -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .merge(users::router(policy))
}
