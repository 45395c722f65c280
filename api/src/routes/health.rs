//! Liveness and storage reachability

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::AppState;

/// Service status
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// `healthy`, or `degraded` when storage does not answer
    pub status: &'static str,
    /// Storage backend in use (`memory` or `sqlite`)
    pub storage: &'static str,
    /// Server version
    pub version: &'static str,
    /// RFC 3339 time of the check
    pub checked_at: String,
}

/// Health check
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Server and storage are up", body = HealthResponse),
        (status = 503, description = "Storage unreachable", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let storage = state.formdesk.storage_status().await;
    let (code, status) = if storage.reachable {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    let body = HealthResponse {
        status,
        storage: storage.backend,
        version: env!("CARGO_PKG_VERSION"),
        checked_at: chrono::Utc::now().to_rfc3339(),
    };
    (code, Json(body))
}
