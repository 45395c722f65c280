//! Registration, login and token authentication

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::auth::{Actor, PasswordHasherService, TokenIssuer};
use crate::domain::user::clean_optional;
use crate::domain::{validate_password, Email, Role, User};
use crate::error::{FormdeskError, Result};
use crate::store::Repository;

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Self-service registration request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub name: Option<String>,
}

/// Issued token plus the user it belongs to
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub token: String,
    pub token_type: String,
    /// Seconds until the token expires
    pub expires_in: i64,
    pub user: User,
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    repo: Arc<dyn Repository>,
    tokens: TokenIssuer,
    hasher: PasswordHasherService,
}

impl AuthService {
    pub(crate) fn new(repo: Arc<dyn Repository>, tokens: TokenIssuer, hasher: PasswordHasherService) -> Self {
        Self { repo, tokens, hasher }
    }

    /// Create a CLIENT account and log it in
    pub async fn register(&self, input: Registration) -> Result<AuthSession> {
        let email = Email::new(&input.email)?;
        validate_password(&input.password)?;

        if self.repo.find_user_by_email(email.as_str()).await?.is_some() {
            return Err(FormdeskError::Conflict(format!("email {} already registered", email)));
        }

        let hash = self.hasher.hash_password_async(input.password).await?;
        let mut user = User::new(email, hash, clean_optional(input.name), Role::Client);
        user.last_login_at = Some(Utc::now());
        self.repo.insert_user(&user).await?;

        tracing::info!(user_id = %user.id, email = %user.email, "client registered");
        self.session(user)
    }

    /// Exchange credentials for a token
    pub async fn login(&self, input: Credentials) -> Result<AuthSession> {
        let invalid = || FormdeskError::Unauthorized("invalid email or password".into());

        let email = Email::new(&input.email).map_err(|_| invalid())?;
        let Some(mut user) = self.repo.find_user_by_email(email.as_str()).await? else {
            tracing::warn!(email = %email, "login for unknown email");
            return Err(invalid());
        };

        if !self
            .hasher
            .verify_password_async(input.password, user.password_hash.clone())
            .await?
        {
            tracing::warn!(user_id = %user.id, "login with wrong password");
            return Err(invalid());
        }
        if !user.is_active() {
            tracing::warn!(user_id = %user.id, "login refused for suspended account");
            return Err(FormdeskError::Unauthorized("account is suspended".into()));
        }

        user.last_login_at = Some(Utc::now());
        self.repo.update_user(&user).await?;

        tracing::info!(user_id = %user.id, "user logged in");
        self.session(user)
    }

    /// The caller's own record
    pub async fn profile(&self, actor: &Actor) -> Result<User> {
        self.repo
            .find_user(actor.user_id)
            .await?
            .ok_or_else(|| FormdeskError::Unauthorized("account no longer exists".into()))
    }

    /// Resolve a bearer token to an actor.
    ///
    /// The role is taken from the stored user, not the token, so demotions
    /// apply to tokens already issued.
    pub async fn authenticate(&self, token: &str) -> Result<Actor> {
        let claims = self.tokens.verify(token)?;

        let user = self
            .repo
            .find_user(claims.sub)
            .await?
            .ok_or_else(|| FormdeskError::Unauthorized("account no longer exists".into()))?;
        if !user.is_active() {
            return Err(FormdeskError::Unauthorized("account is suspended".into()));
        }

        Ok(Actor::from_user(&user))
    }

    /// Ensure a super-admin with this email exists; returns it when newly created
    pub async fn bootstrap_admin(&self, email: &str, password: &str) -> Result<Option<User>> {
        let email = Email::new(email)?;
        if self.repo.find_user_by_email(email.as_str()).await?.is_some() {
            return Ok(None);
        }
        validate_password(password)?;

        let hash = self.hasher.hash_password_async(password.to_string()).await?;
        let admin = User::new(email, hash, Some("Administrator".into()), Role::SuperAdmin);
        self.repo.insert_user(&admin).await?;

        tracing::info!(user_id = %admin.id, email = %admin.email, "bootstrap super-admin created");
        Ok(Some(admin))
    }

    fn session(&self, user: User) -> Result<AuthSession> {
        Ok(AuthSession {
            token: self.tokens.issue(&user)?,
            token_type: "Bearer".into(),
            expires_in: self.tokens.ttl_seconds(),
            user,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryRepository;
    use crate::Formdesk;

    fn formdesk() -> Formdesk {
        Formdesk::new(Arc::new(MemoryRepository::new()), "test-secret", 1)
    }

    fn registration(email: &str) -> Registration {
        Registration {
            email: email.into(),
            password: "password123".into(),
            name: Some("  Ada ".into()),
        }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let fd = formdesk();
        let session = fd.auth.register(registration("Ada@Example.com")).await.unwrap();
        assert_eq!(session.user.email, "ada@example.com");
        assert_eq!(session.user.role, Role::Client);
        assert_eq!(session.user.name.as_deref(), Some("Ada"));

        let login = fd
            .auth
            .login(Credentials { email: "ada@example.com".into(), password: "password123".into() })
            .await
            .unwrap();
        let actor = fd.auth.authenticate(&login.token).await.unwrap();
        assert_eq!(actor.user_id, session.user.id);
        assert!(fd.auth.profile(&actor).await.unwrap().last_login_at.is_some());
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let fd = formdesk();
        fd.auth.register(registration("ada@example.com")).await.unwrap();
        let err = fd.auth.register(registration("ADA@example.com")).await.unwrap_err();
        assert!(matches!(err, FormdeskError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_bad_password_unauthorized() {
        let fd = formdesk();
        fd.auth.register(registration("ada@example.com")).await.unwrap();
        let err = fd
            .auth
            .login(Credentials { email: "ada@example.com".into(), password: "wrong-password".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, FormdeskError::Unauthorized(_)));

        let err = fd
            .auth
            .login(Credentials { email: "nobody@example.com".into(), password: "password123".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, FormdeskError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_bootstrap_admin_once() {
        let fd = formdesk();
        let created = fd.auth.bootstrap_admin("root@example.com", "rootpass123").await.unwrap();
        assert_eq!(created.unwrap().role, Role::SuperAdmin);
        assert!(fd.auth.bootstrap_admin("root@example.com", "rootpass123").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_garbage_token_rejected() {
        let fd = formdesk();
        assert!(matches!(
            fd.auth.authenticate("not.a.token").await,
            Err(FormdeskError::Unauthorized(_))
        ));
    }
}
