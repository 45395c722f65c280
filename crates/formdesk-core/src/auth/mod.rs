//! Authentication and authorization
//!
//! - [`password`]: Argon2id hashing
//! - [`token`]: signed bearer tokens
//! - [`Actor`] / [`Permission`]: who is calling and what they may touch

pub mod password;
pub mod token;

pub use password::PasswordHasherService;
pub use token::{Claims, TokenIssuer};

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

use crate::domain::{Role, User};
use crate::error::{FormdeskError, Result};

/// Permission enum for fine-grained access control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    // Users
    UsersRead,
    UsersWrite,
    UsersDelete,

    // Forms
    FormsRead,
    FormsWrite,
    FormsDelete,

    // Submissions
    SubmissionsRead,
    SubmissionsDelete,

    // Analytics
    AnalyticsRead,
    AnalyticsPlatform,

    /// Read and write data of every tenant
    CrossTenant,
}

impl Permission {
    /// Get all permissions for a role
    pub fn for_role(role: Role) -> HashSet<Permission> {
        match role {
            Role::SuperAdmin => Self::all(),
            Role::Client => Self::client(),
        }
    }

    fn all() -> HashSet<Permission> {
        use Permission::*;
        [
            UsersRead, UsersWrite, UsersDelete,
            FormsRead, FormsWrite, FormsDelete,
            SubmissionsRead, SubmissionsDelete,
            AnalyticsRead, AnalyticsPlatform,
            CrossTenant,
        ].into_iter().collect()
    }

    fn client() -> HashSet<Permission> {
        use Permission::*;
        [
            FormsRead, FormsWrite, FormsDelete,
            SubmissionsRead, SubmissionsDelete,
            AnalyticsRead,
        ].into_iter().collect()
    }
}

/// The authenticated caller of a service operation
#[derive(Debug, Clone)]
pub struct Actor {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
    permissions: HashSet<Permission>,
}

impl Actor {
    /// Build an actor for a loaded user
    pub fn from_user(user: &User) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
            role: user.role,
            permissions: Permission::for_role(user.role),
        }
    }

    /// Whether this actor is a platform operator
    pub fn is_super_admin(&self) -> bool {
        self.role == Role::SuperAdmin
    }

    /// Check a single permission
    pub fn has(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }

    /// Fail with `Forbidden` unless the permission is held
    pub fn require(&self, permission: Permission) -> Result<()> {
        if self.has(permission) {
            Ok(())
        } else {
            Err(FormdeskError::Forbidden(format!("missing permission {:?}", permission)))
        }
    }

    /// Whether data owned by `client_id` is visible to this actor
    pub fn can_access(&self, client_id: Uuid) -> bool {
        self.user_id == client_id || self.has(Permission::CrossTenant)
    }

    /// Ownership guard: owner or cross-tenant operator
    pub fn ensure_access(&self, client_id: Uuid, what: &str) -> Result<()> {
        if self.can_access(client_id) {
            Ok(())
        } else {
            Err(FormdeskError::Forbidden(format!("{} belongs to another client", what)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Email;

    fn actor(role: Role) -> Actor {
        Actor::from_user(&User::new(Email::new("x@example.com").unwrap(), String::new(), None, role))
    }

    #[test]
    fn test_client_permissions() {
        let client = actor(Role::Client);
        assert!(client.has(Permission::FormsWrite));
        assert!(!client.has(Permission::UsersRead));
        assert!(client.require(Permission::AnalyticsPlatform).is_err());
    }

    #[test]
    fn test_ownership() {
        let client = actor(Role::Client);
        let admin = actor(Role::SuperAdmin);
        let other = Uuid::new_v4();

        assert!(client.can_access(client.user_id));
        assert!(!client.can_access(other));
        assert!(admin.can_access(other));
        assert!(matches!(client.ensure_access(other, "form"), Err(FormdeskError::Forbidden(_))));
    }
}
