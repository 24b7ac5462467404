//! Per-route authorization on top of the auth middleware.
//!
//! Routes declare their [`RouteGuard`]s with [`guarded`]; the guards run
//! after authentication and before the handler.

use std::sync::Arc;

use axum::{
    extract::State,
    middleware::{Next, from_fn_with_state},
    response::Response,
    routing::MethodRouter,
};

use amg_auth::{AccessPolicy, AuthError, RouteGuard, enforce};

use crate::app::errors;
use crate::context::PrincipalContext;

#[derive(Clone)]
pub struct RouteGuardState {
    policy: AccessPolicy,
    guards: Arc<[RouteGuard]>,
}

impl RouteGuardState {
    pub fn new(policy: AccessPolicy, guards: impl IntoIterator<Item = RouteGuard>) -> Self {
        Self {
            policy,
            guards: guards.into_iter().collect(),
        }
    }
}

pub async fn route_guard_middleware(
    State(state): State<RouteGuardState>,
    req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, Response> {
    // Only reachable behind `auth_middleware`.
    let principal = req
        .extensions()
        .get::<PrincipalContext>()
        .ok_or_else(|| errors::auth_error_response(&AuthError::MissingCredential))?;

    if let Err(e) = enforce(&state.guards, principal.identity(), &state.policy) {
        tracing::warn!(
            subject = principal.subject(),
            role = principal.role().as_str(),
            path = %req.uri().path(),
            error = %e,
            "route guard denied request"
        );
        return Err(errors::auth_error_response(&e));
    }

    Ok(next.run(req).await)
}

/// Attach guards to every handler in `route`.
pub fn guarded<S>(
    route: MethodRouter<S>,
    policy: &AccessPolicy,
    guards: impl IntoIterator<Item = RouteGuard>,
) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    route.route_layer(from_fn_with_state(
        RouteGuardState::new(policy.clone(), guards),
        route_guard_middleware,
    ))
}
