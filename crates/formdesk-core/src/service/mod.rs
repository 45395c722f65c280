//! Application services
//!
//! Each service is a cheap clone around the shared repository. Handlers
//! call them with the authenticated [`Actor`](crate::Actor); public
//! operations (login, register, public form read, submit) take none.

mod analytics;
mod auth;
mod forms;
mod submissions;
mod users;

pub use analytics::*;
pub use auth::*;
pub use forms::*;
pub use submissions::*;
pub use users::*;

use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::{Actor, PasswordHasherService, TokenIssuer};
use crate::domain::Form;
use crate::error::{FormdeskError, Result};
use crate::store::Repository;

/// All services over one repository
#[derive(Clone)]
pub struct Formdesk {
    pub auth: AuthService,
    pub users: UsersService,
    pub forms: FormsService,
    pub submissions: SubmissionsService,
    pub analytics: AnalyticsService,
    repo: Arc<dyn Repository>,
}

/// Result of a storage round trip
#[derive(Debug, Clone, Serialize)]
pub struct StorageStatus {
    pub backend: &'static str,
    pub reachable: bool,
}

impl Formdesk {
    /// Wire the services; tokens are signed with `jwt_secret` and live `token_ttl_hours`
    pub fn new(repo: Arc<dyn Repository>, jwt_secret: &str, token_ttl_hours: i64) -> Self {
        let hasher = PasswordHasherService::new();
        let tokens = TokenIssuer::new(jwt_secret, token_ttl_hours);

        Self {
            auth: AuthService::new(repo.clone(), tokens, hasher.clone()),
            users: UsersService::new(repo.clone(), hasher),
            forms: FormsService::new(repo.clone()),
            submissions: SubmissionsService::new(repo.clone()),
            analytics: AnalyticsService::new(repo.clone()),
            repo,
        }
    }

    /// Ping the repository; failures are logged, not returned
    pub async fn storage_status(&self) -> StorageStatus {
        let reachable = match self.repo.ping().await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(backend = self.repo.backend(), error = %e, "storage ping failed");
                false
            }
        };
        StorageStatus { backend: self.repo.backend(), reachable }
    }
}

/// Load a form and check the actor may see it
pub(crate) async fn accessible_form(repo: &dyn Repository, actor: &Actor, form_id: Uuid) -> Result<Form> {
    let form = repo
        .find_form(form_id)
        .await?
        .ok_or_else(|| FormdeskError::not_found("form", form_id))?;
    actor.ensure_access(form.client_id, "form")?;
    Ok(form)
}
