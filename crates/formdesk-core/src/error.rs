//! Error types for Formdesk

use thiserror::Error;

use crate::store::RepositoryError;

/// Formdesk error type
///
/// Each variant corresponds to one class of HTTP failure; the API layer maps
/// them one to one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormdeskError {
    /// Entity does not exist (or is hidden from the caller)
    #[error("not found: {0}")]
    NotFound(String),

    /// Caller is authenticated but not allowed to do this
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Unique constraint violated (email, slug, field label)
    #[error("conflict: {0}")]
    Conflict(String),

    /// Input failed validation
    #[error("validation failed: {0}")]
    Validation(String),

    /// Missing, invalid or expired credentials
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Storage backend failure
    #[error("storage error: {0}")]
    Storage(String),

    /// Anything else that is our fault
    #[error("internal error: {0}")]
    Internal(String),
}

impl FormdeskError {
    /// Short machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            FormdeskError::NotFound(_) => "NOT_FOUND",
            FormdeskError::Forbidden(_) => "FORBIDDEN",
            FormdeskError::Conflict(_) => "CONFLICT",
            FormdeskError::Validation(_) => "VALIDATION_FAILED",
            FormdeskError::Unauthorized(_) => "UNAUTHORIZED",
            FormdeskError::Storage(_) => "STORAGE_ERROR",
            FormdeskError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether the failure is on the server side
    pub fn is_server_error(&self) -> bool {
        matches!(self, FormdeskError::Storage(_) | FormdeskError::Internal(_))
    }

    pub(crate) fn not_found(kind: &str, id: impl std::fmt::Display) -> Self {
        FormdeskError::NotFound(format!("{} {}", kind, id))
    }
}

impl From<RepositoryError> for FormdeskError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(what) => FormdeskError::NotFound(what),
            RepositoryError::Conflict(what) => FormdeskError::Conflict(what),
            RepositoryError::Storage(msg) => FormdeskError::Storage(msg),
        }
    }
}

/// Result type for Formdesk
pub type Result<T> = std::result::Result<T, FormdeskError>;
