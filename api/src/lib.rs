//! Formdesk REST API
//!
//! Axum front end over [`formdesk_core`].
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         REST API                             │
//! │  /auth  /users  /forms  /submissions  /analytics  /health    │
//! │  Bearer tokens (AuthUser) | JSON envelope | OpenAPI 3        │
//! └───────────────────────────┬──────────────────────────────────┘
//!                             │
//! ┌───────────────────────────▼──────────────────────────────────┐
//! │                  formdesk_core::Formdesk                     │
//! └──────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;

use axum::routing::get;
use axum::{Json, Router};
use formdesk_core::Formdesk;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

pub use error::{ApiError, ApiResult};
pub use models::*;

/// API state
#[derive(Clone)]
pub struct AppState {
    /// Services over the configured repository
    pub formdesk: Formdesk,
    /// Allow any origin
    pub cors_permissive: bool,
}

impl AppState {
    /// State with permissive CORS
    pub fn new(formdesk: Formdesk) -> Self {
        Self { formdesk, cors_permissive: true }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Formdesk API",
        version = "1.0.0",
        description = "Multi-tenant form builder: forms, fields, submissions and analytics",
        license(name = "Apache-2.0")
    ),
    paths(
        routes::health::health_check,
        routes::auth::register,
        routes::auth::login,
        routes::auth::profile,
        routes::users::list_users,
        routes::users::create_user,
        routes::users::get_user,
        routes::users::update_user,
        routes::users::delete_user,
        routes::forms::list_forms,
        routes::forms::create_form,
        routes::forms::get_form,
        routes::forms::update_form,
        routes::forms::delete_form,
        routes::forms::add_field,
        routes::forms::reorder_fields,
        routes::forms::update_field,
        routes::forms::delete_field,
        routes::forms::get_public_form,
        routes::submissions::create_submission,
        routes::submissions::list_submissions,
        routes::submissions::list_form_submissions,
        routes::submissions::get_submission,
        routes::submissions::delete_submission,
        routes::analytics::get_overview,
        routes::analytics::get_client_stats,
        routes::analytics::get_timeline,
        routes::analytics::get_form_stats,
        routes::analytics::export_form_csv,
    ),
    components(
        schemas(
            ErrorResponse, Deleted, FieldOrder,
            routes::health::HealthResponse,
            formdesk_core::User, formdesk_core::Role, formdesk_core::UserStatus,
            formdesk_core::service::Credentials, formdesk_core::service::Registration,
            formdesk_core::AuthSession,
            formdesk_core::service::NewUser, formdesk_core::service::UserPatch,
            formdesk_core::Form, formdesk_core::FormDetail, formdesk_core::FormField,
            formdesk_core::FieldType, formdesk_core::NewForm, formdesk_core::FormPatch,
            formdesk_core::NewField, formdesk_core::FieldPatch,
            formdesk_core::Submission, formdesk_core::NewSubmission,
            formdesk_core::service::PlatformOverview, formdesk_core::service::ClientStats,
            formdesk_core::service::FormStats, formdesk_core::service::FieldStats,
            formdesk_core::service::OptionCount, formdesk_core::service::Timeline,
            formdesk_core::service::DailyCount
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Login, registration and profile"),
        (name = "users", description = "User management"),
        (name = "forms", description = "Forms and their fields"),
        (name = "submissions", description = "Collected answers"),
        (name = "analytics", description = "Analytics and CSV export")
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).bearer_format("JWT").build()),
            );
        }
    }
}

/// Build the API router
pub fn build_router(state: AppState) -> Router {
    let cors = if state.cors_permissive {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
    };

    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .nest("/auth", routes::auth::router())
        .nest("/users", routes::users::router())
        .nest("/forms", routes::forms::router())
        .nest("/submissions", routes::submissions::router())
        .nest("/analytics", routes::analytics::router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
