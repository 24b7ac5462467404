use axum::http::{HeaderValue, StatusCode, header::WWW_AUTHENTICATE};
use axum::response::IntoResponse;
use serde_json::json;

use amg_auth::{AuthError, LoginError};
use amg_core::DomainError;

/// Map an auth failure to its public response.
///
/// 401 carries a `WWW-Authenticate: Bearer` challenge. Store failures are
/// 503 so clients can tell them apart from a rejected token.
pub fn auth_error_response(err: &AuthError) -> axum::response::Response {
    let status = if err.is_unauthenticated() {
        StatusCode::UNAUTHORIZED
    } else if err.is_infrastructure() {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::FORBIDDEN
    };

    let mut res = json_error(status, err.public_code(), err.public_message());
    if status == StatusCode::UNAUTHORIZED {
        res.headers_mut()
            .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
    }
    res
}

pub fn login_error_response(err: LoginError) -> axum::response::Response {
    match err {
        LoginError::InvalidCredentials => json_error(
            StatusCode::UNAUTHORIZED,
            "invalid_credentials",
            LoginError::InvalidCredentials.to_string(),
        ),
        LoginError::Lookup(e) => {
            tracing::error!(error = %e, "credential lookup failed");
            internal_error()
        }
        LoginError::Signing(e) => {
            tracing::error!(error = %e, "failed to sign session token");
            internal_error()
        }
    }
}

pub fn domain_error_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        DomainError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        DomainError::Storage(msg) => {
            tracing::error!(error = %msg, "user store failure");
            internal_error()
        }
    }
}

pub fn internal_error() -> axum::response::Response {
    json_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal_error",
        "internal server error",
    )
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
