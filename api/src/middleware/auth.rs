//! Bearer token authentication

use axum::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use formdesk_core::Actor;

use crate::error::ApiError;
use crate::AppState;

/// The authenticated caller.
///
/// Extracting it rejects the request with 401 unless a valid
/// `Authorization: Bearer <token>` header names an active account.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Actor);

/// Token part of an `Authorization` header value
pub fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or_else(|| ApiError::unauthorized("missing bearer token"))?
            .to_str()
            .map_err(|_| ApiError::unauthorized("malformed authorization header"))?;
        let token = bearer_token(header).ok_or_else(|| ApiError::unauthorized("malformed authorization header"))?;

        let state = AppState::from_ref(state);
        match state.formdesk.auth.authenticate(token).await {
            Ok(actor) => Ok(AuthUser(actor)),
            Err(err) => {
                tracing::warn!(path = %parts.uri.path(), error = %err, "rejected bearer token");
                Err(err.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(bearer_token("bearer abc"), Some("abc"));
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("abc"), None);
    }
}
