//! Login, registration and profile endpoints

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use formdesk_core::service::{Credentials, Registration};
use formdesk_core::{AuthSession, User};

use crate::error::ApiResult;
use crate::middleware::AuthUser;
use crate::models::*;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/profile", get(profile))
}

/// Register a client account
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = Registration,
    responses(
        (status = 201, description = "Account created and logged in", body = AuthSession),
        (status = 409, description = "Email already registered", body = ErrorResponse),
        (status = 422, description = "Invalid email or password", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<Registration>,
) -> ApiResult<(StatusCode, Json<ApiResponse<AuthSession>>)> {
    let session = state.formdesk.auth.register(input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(session))))
}

/// Exchange credentials for a bearer token
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = Credentials,
    responses(
        (status = 200, description = "Logged in", body = AuthSession),
        (status = 401, description = "Bad credentials or suspended account", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<Credentials>,
) -> ApiResult<Json<ApiResponse<AuthSession>>> {
    let session = state.formdesk.auth.login(input).await?;
    Ok(Json(ApiResponse::success(session)))
}

/// The caller's own account
#[utoipa::path(
    get,
    path = "/auth/profile",
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    tag = "auth",
    security(("bearer" = []))
)]
pub async fn profile(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
) -> ApiResult<Json<ApiResponse<User>>> {
    let user = state.formdesk.auth.profile(&actor).await?;
    Ok(Json(ApiResponse::success(user)))
}
