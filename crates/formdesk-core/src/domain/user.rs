//! Users and roles

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{FormdeskError, Result};

/// Platform role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Platform operator, sees every tenant
    SuperAdmin,
    /// Tenant that owns forms
    Client,
}

impl Role {
    /// Wire/storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "SUPER_ADMIN",
            Role::Client => "CLIENT",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = FormdeskError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "SUPER_ADMIN" => Ok(Role::SuperAdmin),
            "CLIENT" => Ok(Role::Client),
            other => Err(FormdeskError::Validation(format!("unknown role: {}", other))),
        }
    }
}

/// Account status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    /// Can log in
    #[default]
    Active,
    /// Login refused, existing tokens rejected
    Suspended,
}

impl UserStatus {
    /// Wire/storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "ACTIVE",
            UserStatus::Suspended => "SUSPENDED",
        }
    }
}

impl FromStr for UserStatus {
    type Err = FormdeskError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ACTIVE" => Ok(UserStatus::Active),
            "SUSPENDED" => Ok(UserStatus::Suspended),
            other => Err(FormdeskError::Validation(format!("unknown status: {}", other))),
        }
    }
}

/// Account record
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    /// Argon2id PHC string; never leaves the server
    #[serde(skip)]
    pub password_hash: String,
    pub name: Option<String>,
    pub role: Role,
    pub status: UserStatus,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new active user; `email` must already be normalized
    pub fn new(email: Email, password_hash: String, name: Option<String>, role: Role) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email: email.into_inner(),
            password_hash,
            name,
            role,
            status: UserStatus::Active,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the account may authenticate
    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Validated, lower-cased email address
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Email(String);

impl Email {
    /// Parse and normalize
    pub fn new(value: impl AsRef<str>) -> Result<Self> {
        let value = value.as_ref().trim().to_lowercase();

        if value.is_empty() {
            return Err(FormdeskError::Validation("email is required".into()));
        }
        if value.len() > 254 || !Self::is_valid_format(&value) {
            return Err(FormdeskError::Validation(format!("invalid email: {}", value)));
        }

        Ok(Self(value))
    }

    /// Borrow as `&str`
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Unwrap into the normalized string
    pub fn into_inner(self) -> String {
        self.0
    }

    fn is_valid_format(email: &str) -> bool {
        let mut parts = email.split('@');
        let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
            return false;
        };

        !local.is_empty()
            && !domain.is_empty()
            && domain.contains('.')
            && !domain.starts_with('.')
            && !domain.ends_with('.')
            && !email.chars().any(char::is_whitespace)
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Minimum accepted password length
pub const MIN_PASSWORD_LEN: usize = 8;

/// Reject passwords that are too short to be worth hashing
pub fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(FormdeskError::Validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

/// Trim an optional display name, mapping blank to `None`
pub(crate) fn clean_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
