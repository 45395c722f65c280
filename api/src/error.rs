//! HTTP mapping of service errors

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use formdesk_core::FormdeskError;

use crate::models::ApiResponse;

/// Error returned by handlers; renders the standard error envelope
#[derive(Debug)]
pub struct ApiError(pub FormdeskError);

impl ApiError {
    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match &self.0 {
            FormdeskError::NotFound(_) => StatusCode::NOT_FOUND,
            FormdeskError::Forbidden(_) => StatusCode::FORBIDDEN,
            FormdeskError::Conflict(_) => StatusCode::CONFLICT,
            FormdeskError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            FormdeskError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            FormdeskError::Storage(_) | FormdeskError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Shorthand for a 401
    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError(FormdeskError::Unauthorized(message.into()))
    }
}

impl From<FormdeskError> for ApiError {
    fn from(err: FormdeskError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self.0 {
            // Never expose storage or internal details
            err if err.is_server_error() => {
                tracing::error!(error = %err, "request failed");
                "internal server error".to_string()
            }
            FormdeskError::NotFound(m)
            | FormdeskError::Forbidden(m)
            | FormdeskError::Conflict(m)
            | FormdeskError::Validation(m)
            | FormdeskError::Unauthorized(m)
            | FormdeskError::Storage(m)
            | FormdeskError::Internal(m) => m.clone(),
        };

        let body: ApiResponse<()> = ApiResponse::error(self.0.code(), &message);
        (status, Json(body)).into_response()
    }
}

/// Handler result
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (FormdeskError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (FormdeskError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (FormdeskError::Conflict("x".into()), StatusCode::CONFLICT),
            (FormdeskError::Validation("x".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (FormdeskError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (FormdeskError::Storage("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (FormdeskError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError(err).status_code(), status);
        }
    }

    #[test]
    fn test_server_errors_do_not_leak_details() {
        let response = ApiError(FormdeskError::Storage("disk /var/db full".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
