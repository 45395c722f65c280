//! Submission endpoints

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use formdesk_core::{NewSubmission, Submission};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::middleware::AuthUser;
use crate::models::*;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_submissions).post(create_submission))
        .route("/form/:form_id", get(list_form_submissions))
        .route("/:id", get(get_submission).delete(delete_submission))
}

/// Submit answers to a published form
#[utoipa::path(
    post,
    path = "/submissions",
    request_body = NewSubmission,
    responses(
        (status = 201, description = "Submission stored", body = Submission),
        (status = 403, description = "Form is not published", body = ErrorResponse),
        (status = 404, description = "Form not found", body = ErrorResponse),
        (status = 422, description = "Answers do not fit the form", body = ErrorResponse)
    ),
    tag = "submissions"
)]
pub async fn create_submission(
    State(state): State<AppState>,
    Json(input): Json<NewSubmission>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Submission>>)> {
    let submission = state.formdesk.submissions.create(input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(submission))))
}

/// List submissions visible to the caller, newest first
#[utoipa::path(
    get,
    path = "/submissions",
    params(SubmissionListParams),
    responses((status = 200, description = "Submissions", body = [Submission])),
    tag = "submissions",
    security(("bearer" = []))
)]
pub async fn list_submissions(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Query(params): Query<SubmissionListParams>,
) -> ApiResult<Json<ApiResponse<Vec<Submission>>>> {
    let submissions = state.formdesk.submissions.list(&actor, params.form_id).await?;
    Ok(Json(ApiResponse::success(submissions)))
}

/// Submissions of one form, newest first
#[utoipa::path(
    get,
    path = "/submissions/form/{form_id}",
    params(("form_id" = Uuid, Path, description = "Form ID")),
    responses(
        (status = 200, description = "Submissions", body = [Submission]),
        (status = 403, description = "Form belongs to another client", body = ErrorResponse)
    ),
    tag = "submissions",
    security(("bearer" = []))
)]
pub async fn list_form_submissions(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(form_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Vec<Submission>>>> {
    let submissions = state.formdesk.submissions.list_for_form(&actor, form_id).await?;
    Ok(Json(ApiResponse::success(submissions)))
}

/// Get one submission
#[utoipa::path(
    get,
    path = "/submissions/{id}",
    params(("id" = Uuid, Path, description = "Submission ID")),
    responses(
        (status = 200, description = "Submission", body = Submission),
        (status = 404, description = "Submission not found", body = ErrorResponse)
    ),
    tag = "submissions",
    security(("bearer" = []))
)]
pub async fn get_submission(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Submission>>> {
    let submission = state.formdesk.submissions.get(&actor, id).await?;
    Ok(Json(ApiResponse::success(submission)))
}

/// Delete one submission
#[utoipa::path(
    delete,
    path = "/submissions/{id}",
    params(("id" = Uuid, Path, description = "Submission ID")),
    responses(
        (status = 200, description = "Submission deleted", body = Deleted),
        (status = 404, description = "Submission not found", body = ErrorResponse)
    ),
    tag = "submissions",
    security(("bearer" = []))
)]
pub async fn delete_submission(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Deleted>>> {
    state.formdesk.submissions.delete(&actor, id).await?;
    Ok(Json(ApiResponse::success(Deleted { id })))
}
