use axum::{
    extract::State,
    http::{HeaderMap, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};

use amg_auth::{AuthError, AuthGuard};

use crate::app::errors;
use crate::context::PrincipalContext;

#[derive(Clone)]
pub struct AuthState {
    pub guard: AuthGuard,
}

/// Authenticate the request and attach a [`PrincipalContext`].
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, Response> {
    let header = authorization_header(req.headers()).map_err(|e| errors::auth_error_response(&e))?;

    let ctx = state
        .guard
        .authenticate(header)
        .await
        .map_err(|e| errors::auth_error_response(&e))?;

    req.extensions_mut().insert(PrincipalContext::from(ctx));

    Ok(next.run(req).await)
}

/// Raw `Authorization` value. A header that is not visible ASCII counts as
/// a malformed credential, not a missing one.
pub fn authorization_header(headers: &HeaderMap) -> Result<Option<&str>, AuthError> {
    headers
        .get(AUTHORIZATION)
        .map(|v| v.to_str().map_err(|_| AuthError::MalformedCredential))
        .transpose()
}
