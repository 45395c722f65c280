//! User administration

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::{Actor, PasswordHasherService, Permission};
use crate::domain::user::clean_optional;
use crate::domain::{validate_password, Email, Role, User, UserStatus};
use crate::error::{FormdeskError, Result};
use crate::store::Repository;

/// Account created by a super-admin
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub name: Option<String>,
    /// Defaults to CLIENT
    pub role: Option<Role>,
}

/// Partial account update
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UserPatch {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
    /// Super-admin only
    pub role: Option<Role>,
    /// Super-admin only
    pub status: Option<UserStatus>,
}

/// Users service
#[derive(Clone)]
pub struct UsersService {
    repo: Arc<dyn Repository>,
    hasher: PasswordHasherService,
}

impl UsersService {
    pub(crate) fn new(repo: Arc<dyn Repository>, hasher: PasswordHasherService) -> Self {
        Self { repo, hasher }
    }

    /// All accounts, optionally of one role
    pub async fn list(&self, actor: &Actor, role: Option<Role>) -> Result<Vec<User>> {
        actor.require(Permission::UsersRead)?;
        Ok(self.repo.list_users(role).await?)
    }

    /// Create an account of any role
    pub async fn create(&self, actor: &Actor, input: NewUser) -> Result<User> {
        actor.require(Permission::UsersWrite)?;

        let email = Email::new(&input.email)?;
        validate_password(&input.password)?;
        if self.repo.find_user_by_email(email.as_str()).await?.is_some() {
            return Err(FormdeskError::Conflict(format!("email {} already registered", email)));
        }

        let hash = self.hasher.hash_password_async(input.password).await?;
        let user = User::new(
            email,
            hash,
            clean_optional(input.name),
            input.role.unwrap_or(Role::Client),
        );
        self.repo.insert_user(&user).await?;

        tracing::info!(by = %actor.user_id, user_id = %user.id, role = %user.role, "user created");
        Ok(user)
    }

    /// Self or super-admin
    pub async fn get(&self, actor: &Actor, id: Uuid) -> Result<User> {
        if actor.user_id != id {
            actor.require(Permission::UsersRead)?;
        }
        self.find(id).await
    }

    /// Self may change name and password; super-admins may also change
    /// email, role and status, but never demote or suspend themselves.
    pub async fn update(&self, actor: &Actor, id: Uuid, patch: UserPatch) -> Result<User> {
        let is_self = actor.user_id == id;
        if !is_self {
            actor.require(Permission::UsersWrite)?;
        }
        let privileged = patch.email.is_some() || patch.role.is_some() || patch.status.is_some();
        if privileged && !actor.has(Permission::UsersWrite) {
            return Err(FormdeskError::Forbidden(
                "only super-admins may change email, role or status".into(),
            ));
        }

        let mut user = self.find(id).await?;

        if is_self {
            let demoting = patch.role.map(|r| r != user.role).unwrap_or(false);
            let suspending = patch.status == Some(UserStatus::Suspended);
            if demoting || suspending {
                return Err(FormdeskError::Forbidden(
                    "cannot change the role or status of your own account".into(),
                ));
            }
        }

        if let Some(email) = patch.email {
            let email = Email::new(email)?;
            if email.as_str() != user.email {
                if self.repo.find_user_by_email(email.as_str()).await?.is_some() {
                    return Err(FormdeskError::Conflict(format!("email {} already registered", email)));
                }
                user.email = email.into_inner();
            }
        }
        if let Some(name) = patch.name {
            user.name = clean_optional(Some(name));
        }
        if let Some(password) = patch.password {
            validate_password(&password)?;
            user.password_hash = self.hasher.hash_password_async(password).await?;
        }
        if let Some(role) = patch.role {
            user.role = role;
        }
        if let Some(status) = patch.status {
            user.status = status;
        }

        user.touch();
        self.repo.update_user(&user).await?;

        tracing::info!(by = %actor.user_id, user_id = %user.id, "user updated");
        Ok(user)
    }

    /// Delete an account together with its forms and their submissions
    pub async fn delete(&self, actor: &Actor, id: Uuid) -> Result<()> {
        actor.require(Permission::UsersDelete)?;
        if actor.user_id == id {
            return Err(FormdeskError::Forbidden("cannot delete your own account".into()));
        }

        if !self.repo.delete_user(id).await? {
            return Err(FormdeskError::not_found("user", id));
        }

        tracing::info!(by = %actor.user_id, user_id = %id, "user deleted");
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<User> {
        self.repo
            .find_user(id)
            .await?
            .ok_or_else(|| FormdeskError::not_found("user", id))
    }
}
