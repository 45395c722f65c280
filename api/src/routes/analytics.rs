//! Analytics endpoints

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use formdesk_core::service::{ClientStats, FormStats, PlatformOverview, Timeline};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::middleware::AuthUser;
use crate::models::*;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/overview", get(get_overview))
        .route("/clients", get(get_client_stats))
        .route("/timeline", get(get_timeline))
        .route("/forms/:form_id", get(get_form_stats))
        .route("/forms/:form_id/export", get(export_form_csv))
}

/// Platform totals
#[utoipa::path(
    get,
    path = "/analytics/overview",
    responses(
        (status = 200, body = PlatformOverview),
        (status = 403, description = "Not a super-admin", body = ErrorResponse)
    ),
    tag = "analytics",
    security(("bearer" = []))
)]
pub async fn get_overview(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
) -> ApiResult<Json<ApiResponse<PlatformOverview>>> {
    let overview = state.formdesk.analytics.overview(&actor).await?;
    Ok(Json(ApiResponse::success(overview)))
}

/// Per-client activity, busiest first
#[utoipa::path(
    get,
    path = "/analytics/clients",
    responses(
        (status = 200, body = [ClientStats]),
        (status = 403, description = "Not a super-admin", body = ErrorResponse)
    ),
    tag = "analytics",
    security(("bearer" = []))
)]
pub async fn get_client_stats(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
) -> ApiResult<Json<ApiResponse<Vec<ClientStats>>>> {
    let clients = state.formdesk.analytics.clients(&actor).await?;
    Ok(Json(ApiResponse::success(clients)))
}

/// Daily submission counts
#[utoipa::path(
    get,
    path = "/analytics/timeline",
    params(TimelineParams),
    responses(
        (status = 200, body = Timeline),
        (status = 422, description = "days out of range", body = ErrorResponse)
    ),
    tag = "analytics",
    security(("bearer" = []))
)]
pub async fn get_timeline(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Query(params): Query<TimelineParams>,
) -> ApiResult<Json<ApiResponse<Timeline>>> {
    let timeline = state.formdesk.analytics.timeline(&actor, params.days, params.form_id).await?;
    Ok(Json(ApiResponse::success(timeline)))
}

/// Statistics of one form
#[utoipa::path(
    get,
    path = "/analytics/forms/{form_id}",
    params(("form_id" = Uuid, Path, description = "Form ID")),
    responses(
        (status = 200, body = FormStats),
        (status = 403, description = "Form belongs to another client", body = ErrorResponse)
    ),
    tag = "analytics",
    security(("bearer" = []))
)]
pub async fn get_form_stats(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(form_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<FormStats>>> {
    let stats = state.formdesk.analytics.form_stats(&actor, form_id).await?;
    Ok(Json(ApiResponse::success(stats)))
}

/// Download a form's submissions as CSV
#[utoipa::path(
    get,
    path = "/analytics/forms/{form_id}/export",
    params(("form_id" = Uuid, Path, description = "Form ID")),
    responses(
        (status = 200, description = "CSV attachment", content_type = "text/csv", body = String),
        (status = 403, description = "Form belongs to another client", body = ErrorResponse)
    ),
    tag = "analytics",
    security(("bearer" = []))
)]
pub async fn export_form_csv(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(form_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let csv = state.formdesk.analytics.export_csv(&actor, form_id).await?;
    let disposition = format!("attachment; filename=\"form-{}-submissions.csv\"", form_id);

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    ))
}
