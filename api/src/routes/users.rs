//! User management endpoints

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use formdesk_core::service::{NewUser, UserPatch};
use formdesk_core::User;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::middleware::AuthUser;
use crate::models::*;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:id", get(get_user).put(update_user).delete(delete_user))
}

/// List accounts
#[utoipa::path(
    get,
    path = "/users",
    params(UserListParams),
    responses(
        (status = 200, description = "List of users", body = [User]),
        (status = 403, description = "Not a super-admin", body = ErrorResponse)
    ),
    tag = "users",
    security(("bearer" = []))
)]
pub async fn list_users(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Query(params): Query<UserListParams>,
) -> ApiResult<Json<ApiResponse<Vec<User>>>> {
    let users = state.formdesk.users.list(&actor, params.role).await?;
    Ok(Json(ApiResponse::success(users)))
}

/// Create an account of any role
#[utoipa::path(
    post,
    path = "/users",
    request_body = NewUser,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 409, description = "Email already registered", body = ErrorResponse)
    ),
    tag = "users",
    security(("bearer" = []))
)]
pub async fn create_user(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Json(input): Json<NewUser>,
) -> ApiResult<(StatusCode, Json<ApiResponse<User>>)> {
    let user = state.formdesk.users.create(&actor, input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(user))))
}

/// Get user by ID
#[utoipa::path(
    get,
    path = "/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User details", body = User),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    tag = "users",
    security(("bearer" = []))
)]
pub async fn get_user(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<User>>> {
    let user = state.formdesk.users.get(&actor, id).await?;
    Ok(Json(ApiResponse::success(user)))
}

/// Update an account
#[utoipa::path(
    put,
    path = "/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UserPatch,
    responses(
        (status = 200, description = "Updated user", body = User),
        (status = 403, description = "Not allowed", body = ErrorResponse)
    ),
    tag = "users",
    security(("bearer" = []))
)]
pub async fn update_user(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<Uuid>,
    Json(patch): Json<UserPatch>,
) -> ApiResult<Json<ApiResponse<User>>> {
    let user = state.formdesk.users.update(&actor, id, patch).await?;
    Ok(Json(ApiResponse::success(user)))
}

/// Delete an account with its forms and submissions
#[utoipa::path(
    delete,
    path = "/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted", body = Deleted),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    tag = "users",
    security(("bearer" = []))
)]
pub async fn delete_user(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Deleted>>> {
    state.formdesk.users.delete(&actor, id).await?;
    Ok(Json(ApiResponse::success(Deleted { id })))
}
