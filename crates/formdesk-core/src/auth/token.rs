//! JWT bearer tokens (HS256)

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Role, User};
use crate::error::{FormdeskError, Result};

/// Token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: Uuid,
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and verifies signed tokens
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    /// New issuer signing with `secret`; tokens live `ttl_hours`
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(ttl_hours),
        }
    }

    /// Token lifetime in seconds
    pub fn ttl_seconds(&self) -> i64 {
        self.ttl.num_seconds()
    }

    /// Sign a token for `user`
    pub fn issue(&self, user: &User) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| FormdeskError::Internal(format!("token signing failed: {}", e)))
    }

    /// Verify signature and expiry
    pub fn verify(&self, token: &str) -> Result<Claims> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| FormdeskError::Unauthorized(format!("invalid token: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Email;

    fn user() -> User {
        User::new(Email::new("ada@example.com").unwrap(), String::new(), None, Role::Client)
    }

    #[test]
    fn test_issue_and_verify() {
        let issuer = TokenIssuer::new("test-secret", 8);
        let user = user();
        let token = issuer.issue(&user).unwrap();

        let claims = issuer.verify(&token).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.role, Role::Client);
        assert_eq!(claims.exp - claims.iat, 8 * 3600);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = TokenIssuer::new("one", 8).issue(&user()).unwrap();
        assert!(matches!(
            TokenIssuer::new("two", 8).verify(&token),
            Err(FormdeskError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_expired_rejected() {
        // Past the default 60s leeway
        let issuer = TokenIssuer::new("secret", -1);
        let token = issuer.issue(&user()).unwrap();
        assert!(issuer.verify(&token).is_err());
    }
}
