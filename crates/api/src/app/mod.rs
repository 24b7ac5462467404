//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: auth core, revocation store and user store wiring
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: request/response DTOs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router};
use tower::ServiceBuilder;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::{AppServices, build_services};

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(services: Arc<AppServices>) -> Router {
    let auth_state = middleware::AuthState {
        guard: services.guard.clone(),
    };

    // Protected routes: auth middleware first, then per-route guards.
    let protected = routes::protected_router(&services.policy).layer(
        axum::middleware::from_fn_with_state(auth_state, middleware::auth_middleware),
    );

    Router::new()
        .nest("/api", routes::public_router().merge(protected))
        .layer(ServiceBuilder::new().layer(Extension(services)))
}
