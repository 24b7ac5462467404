//! User administration. Every route here sits behind the auth middleware.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
};

use amg_auth::{AccessPolicy, Permission, Role, RouteGuard};
use amg_core::{NewUser, SearchUserQuery, UserId, UserUpdate, validate_password};

use crate::app::routes::session::hash_password;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz::guarded;
use crate::context::PrincipalContext;

pub fn router(policy: &AccessPolicy) -> Router {
    let create = guarded(
        post(create_user),
        policy,
        [
            RouteGuard::require_role([Role::ADMIN]),
            RouteGuard::require_permission(Permission::CREATE),
        ],
    );
    let search = guarded(
        get(search_users),
        policy,
        [RouteGuard::require_permission(Permission::READ)],
    );
    let read = guarded(
        get(get_user),
        policy,
        [RouteGuard::require_permission(Permission::READ)],
    );
    let update = guarded(
        put(update_user),
        policy,
        [RouteGuard::require_permission(Permission::UPDATE)],
    );
    let remove = guarded(
        delete(delete_user),
        policy,
        [RouteGuard::require_permission(Permission::DELETE)],
    );

    Router::new()
        .route("/users", create.merge(search))
        .route("/users/:id", read.merge(update).merge(remove))
}

pub async fn create_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::CreateUserRequest>,
) -> axum::response::Response {
    let role = match dto::known_role(&body.role) {
        Ok(r) => r,
        Err(e) => return errors::domain_error_response(e),
    };
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
        role: role.to_string(),
    }) {
        Ok(user) => {
            tracing::info!(
                user_id = %user.id,
                role = %user.role,
                created_by = principal.subject(),
                "user created"
            );
            (StatusCode::CREATED, Json(user)).into_response()
        }
        Err(e) => errors::domain_error_response(e),
    }
}

pub async fn search_users(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<SearchUserQuery>,
) -> axum::response::Response {
    match services.users.search(&query) {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(e) => errors::domain_error_response(e),
    }
}

pub async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let result = id.parse::<UserId>().and_then(|id| services.users.get(&id));
    match result {
        Ok(user) => (StatusCode::OK, Json(user)).into_response(),
        Err(e) => errors::domain_error_response(e),
    }
}

pub async fn update_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<UserUpdate>,
) -> axum::response::Response {
    let result = dto::known_role(&body.role)
        .and_then(|_| id.parse::<UserId>())
        .and_then(|id| services.users.update(&id, body));

    match result {
        Ok(user) => {
            tracing::info!(user_id = %user.id, updated_by = principal.subject(), "user updated");
            (StatusCode::OK, Json(user)).into_response()
        }
        Err(e) => errors::domain_error_response(e),
    }
}

pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let result = id
        .parse::<UserId>()
        .and_then(|id| services.users.delete(&id).map(|()| id));

    match result {
        Ok(id) => {
            tracing::info!(user_id = %id, deleted_by = principal.subject(), "user deleted");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => errors::domain_error_response(e),
    }
}
