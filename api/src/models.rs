//! API Models

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use formdesk_core::Role;

/// Standard API response envelope.
///
/// Documented per route by its `data` type; see [`ErrorResponse`] for failures.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ErrorResponse>,
}

impl<T> ApiResponse<T> {
    /// Successful envelope
    pub fn success(data: T) -> Self {
        Self { success: true, data: Some(data), error: None }
    }

    /// Failed envelope
    pub fn error(code: &str, message: &str) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ErrorResponse {
                code: code.to_string(),
                message: message.to_string(),
            }),
        }
    }
}

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

/// Body of successful deletes
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Deleted {
    pub id: Uuid,
}

// ============ Query parameters ============

/// `GET /users`
#[derive(Debug, Deserialize, IntoParams)]
pub struct UserListParams {
    /// Only users of this role
    pub role: Option<Role>,
}

/// `GET /forms`
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(rename_all = "camelCase")]
pub struct FormListParams {
    /// Super-admin only: forms of one client
    pub client_id: Option<Uuid>,
}

/// `GET /submissions`
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(rename_all = "camelCase")]
pub struct SubmissionListParams {
    /// Only submissions of this form
    pub form_id: Option<Uuid>,
}

/// `GET /analytics/timeline`
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(rename_all = "camelCase")]
pub struct TimelineParams {
    /// Window size, 1 to 365 (default 30)
    pub days: Option<u32>,
    /// Only submissions of this form
    pub form_id: Option<Uuid>,
}

// ============ Request bodies ============

/// `PUT /forms/:id/fields/order`
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldOrder {
    /// Every field id of the form, in the new display order
    pub field_ids: Vec<Uuid>,
}
