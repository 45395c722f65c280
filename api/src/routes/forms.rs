//! Form and field endpoints

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use formdesk_core::{FieldPatch, Form, FormDetail, FormField, FormPatch, NewField, NewForm};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::middleware::AuthUser;
use crate::models::*;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_forms).post(create_form))
        .route("/public/:client_id/:slug", get(get_public_form))
        .route("/:id", get(get_form).put(update_form).delete(delete_form))
        .route("/:id/fields", post(add_field))
        .route("/:id/fields/order", put(reorder_fields))
        .route("/:id/fields/:field_id", put(update_field).delete(delete_field))
}

/// List forms visible to the caller
#[utoipa::path(
    get,
    path = "/forms",
    params(FormListParams),
    responses((status = 200, description = "Forms, newest first", body = [Form])),
    tag = "forms",
    security(("bearer" = []))
)]
pub async fn list_forms(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Query(params): Query<FormListParams>,
) -> ApiResult<Json<ApiResponse<Vec<Form>>>> {
    let forms = state.formdesk.forms.list(&actor, params.client_id).await?;
    Ok(Json(ApiResponse::success(forms)))
}

/// Create a form, optionally with fields
#[utoipa::path(
    post,
    path = "/forms",
    request_body = NewForm,
    responses(
        (status = 201, description = "Form created", body = FormDetail),
        (status = 409, description = "Slug or field label already in use", body = ErrorResponse),
        (status = 422, description = "Invalid form", body = ErrorResponse)
    ),
    tag = "forms",
    security(("bearer" = []))
)]
pub async fn create_form(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Json(input): Json<NewForm>,
) -> ApiResult<(StatusCode, Json<ApiResponse<FormDetail>>)> {
    let form = state.formdesk.forms.create(&actor, input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(form))))
}

/// Get a form with its fields in display order
#[utoipa::path(
    get,
    path = "/forms/{id}",
    params(("id" = Uuid, Path, description = "Form ID")),
    responses(
        (status = 200, description = "Form with fields", body = FormDetail),
        (status = 403, description = "Form belongs to another client", body = ErrorResponse),
        (status = 404, description = "Form not found", body = ErrorResponse)
    ),
    tag = "forms",
    security(("bearer" = []))
)]
pub async fn get_form(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<FormDetail>>> {
    let form = state.formdesk.forms.get(&actor, id).await?;
    Ok(Json(ApiResponse::success(form)))
}

/// Update title, description, slug or published flag
#[utoipa::path(
    put,
    path = "/forms/{id}",
    params(("id" = Uuid, Path, description = "Form ID")),
    request_body = FormPatch,
    responses(
        (status = 200, description = "Updated form", body = FormDetail),
        (status = 422, description = "Invalid update", body = ErrorResponse)
    ),
    tag = "forms",
    security(("bearer" = []))
)]
pub async fn update_form(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<Uuid>,
    Json(patch): Json<FormPatch>,
) -> ApiResult<Json<ApiResponse<FormDetail>>> {
    let form = state.formdesk.forms.update(&actor, id, patch).await?;
    Ok(Json(ApiResponse::success(form)))
}

/// Delete a form with its fields and submissions
#[utoipa::path(
    delete,
    path = "/forms/{id}",
    params(("id" = Uuid, Path, description = "Form ID")),
    responses(
        (status = 200, description = "Form deleted", body = Deleted),
        (status = 404, description = "Form not found", body = ErrorResponse)
    ),
    tag = "forms",
    security(("bearer" = []))
)]
pub async fn delete_form(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Deleted>>> {
    state.formdesk.forms.delete(&actor, id).await?;
    Ok(Json(ApiResponse::success(Deleted { id })))
}

/// Add a field
#[utoipa::path(
    post,
    path = "/forms/{id}/fields",
    params(("id" = Uuid, Path, description = "Form ID")),
    request_body = NewField,
    responses(
        (status = 201, description = "Field added", body = FormField),
        (status = 409, description = "Label already in use", body = ErrorResponse)
    ),
    tag = "forms",
    security(("bearer" = []))
)]
pub async fn add_field(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<NewField>,
) -> ApiResult<(StatusCode, Json<ApiResponse<FormField>>)> {
    let field = state.formdesk.forms.add_field(&actor, id, input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(field))))
}

/// Rewrite the display order of all fields
#[utoipa::path(
    put,
    path = "/forms/{id}/fields/order",
    params(("id" = Uuid, Path, description = "Form ID")),
    request_body = FieldOrder,
    responses(
        (status = 200, description = "Fields in their new order", body = [FormField]),
        (status = 422, description = "Not a permutation of the form's fields", body = ErrorResponse)
    ),
    tag = "forms",
    security(("bearer" = []))
)]
pub async fn reorder_fields(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<FieldOrder>,
) -> ApiResult<Json<ApiResponse<Vec<FormField>>>> {
    let fields = state.formdesk.forms.reorder_fields(&actor, id, input.field_ids).await?;
    Ok(Json(ApiResponse::success(fields)))
}

/// Update a field
#[utoipa::path(
    put,
    path = "/forms/{id}/fields/{field_id}",
    params(
        ("id" = Uuid, Path, description = "Form ID"),
        ("field_id" = Uuid, Path, description = "Field ID")
    ),
    request_body = FieldPatch,
    responses(
        (status = 200, description = "Updated field", body = FormField),
        (status = 404, description = "Field not found on this form", body = ErrorResponse)
    ),
    tag = "forms",
    security(("bearer" = []))
)]
pub async fn update_field(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path((id, field_id)): Path<(Uuid, Uuid)>,
    Json(patch): Json<FieldPatch>,
) -> ApiResult<Json<ApiResponse<FormField>>> {
    let field = state.formdesk.forms.update_field(&actor, id, field_id, patch).await?;
    Ok(Json(ApiResponse::success(field)))
}

/// Delete a field
#[utoipa::path(
    delete,
    path = "/forms/{id}/fields/{field_id}",
    params(
        ("id" = Uuid, Path, description = "Form ID"),
        ("field_id" = Uuid, Path, description = "Field ID")
    ),
    responses(
        (status = 200, description = "Field deleted", body = Deleted),
        (status = 404, description = "Field not found on this form", body = ErrorResponse)
    ),
    tag = "forms",
    security(("bearer" = []))
)]
pub async fn delete_field(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path((id, field_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<ApiResponse<Deleted>>> {
    state.formdesk.forms.delete_field(&actor, id, field_id).await?;
    Ok(Json(ApiResponse::success(Deleted { id: field_id })))
}

/// Published form by its public address
#[utoipa::path(
    get,
    path = "/forms/public/{client_id}/{slug}",
    params(
        ("client_id" = Uuid, Path, description = "Owning client"),
        ("slug" = String, Path, description = "Form slug")
    ),
    responses(
        (status = 200, description = "Published form with fields", body = FormDetail),
        (status = 404, description = "No published form at this address", body = ErrorResponse)
    ),
    tag = "forms"
)]
pub async fn get_public_form(
    State(state): State<AppState>,
    Path((client_id, slug)): Path<(Uuid, String)>,
) -> ApiResult<Json<ApiResponse<FormDetail>>> {
    let form = state.formdesk.forms.get_public(client_id, &slug).await?;
    Ok(Json(ApiResponse::success(form)))
}
