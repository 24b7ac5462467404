//! Registration, login and logout.

use std::sync::Arc;

use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};

use amg_auth::{LogoutOutcome, Role};
use amg_core::{NewUser, validate_password};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::middleware::authorization_header;

/// Self-service sign-up. New accounts always get the `user` role.
pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::RegisterRequest>,
) -> axum::response::Response {
    if let Err(e) = validate_password(&body.password) {
        return errors::domain_error_response(e);
    }

    let password_hash = match hash_password(&services, body.password).await {
        Ok(h) => h,
        Err(res) => return res,
    };

    match services.users.create(NewUser {
        first_name: body.first_name,
        last_name: body.last_name,
        email: body.email,
        password_hash,
        role: Role::USER.to_string(),
    }) {
        Ok(user) => {
            tracing::info!(user_id = %user.id, "user registered");
            (StatusCode::CREATED, Json(user)).into_response()
        }
        Err(e) => errors::domain_error_response(e),
    }
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::LoginRequest>,
) -> axum::response::Response {
    let svc = services.clone();
    let result =
        tokio::task::spawn_blocking(move || svc.sessions.login(&body.email, &body.password)).await;

    match result {
        Ok(Ok(issued)) => (StatusCode::OK, Json(dto::LoginResponse::from(issued))).into_response(),
        Ok(Err(e)) => errors::login_error_response(e),
        Err(e) => {
            tracing::error!(error = %e, "login task failed");
            errors::internal_error()
        }
    }
}

/// Revoke the presented token. Safe to repeat.
pub async fn logout(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
) -> axum::response::Response {
    let header = match authorization_header(&headers) {
        Ok(h) => h,
        Err(e) => return errors::auth_error_response(&e),
    };

    match services.sessions.logout(header).await {
        Ok(LogoutOutcome::Revoked { .. }) | Ok(LogoutOutcome::AlreadyExpired) => (
            StatusCode::OK,
            Json(serde_json::json!({ "message": "logged out" })),
        )
            .into_response(),
        Err(e) => errors::auth_error_response(&e),
    }
}

/// Hash on a blocking thread; Argon2 is deliberately slow.
pub(crate) async fn hash_password(
    services: &Arc<AppServices>,
    password: String,
) -> Result<String, axum::response::Response> {
    let svc = services.clone();
    match tokio::task::spawn_blocking(move || svc.hasher.hash(&password)).await {
        Ok(Ok(hash)) => Ok(hash),
        Ok(Err(e)) => {
            tracing::error!(error = %e, "password hashing failed");
            Err(errors::internal_error())
        }
        Err(e) => {
            tracing::error!(error = %e, "password hashing task failed");
            Err(errors::internal_error())
        }
    }
}
