//! Repositories - persistence abstraction
//!
//! One trait covers all four tables so cascading deletes stay inside a
//! single backend call. Two backends:
//! - [`MemoryRepository`]: development and tests
//! - [`SqliteRepository`]: relational storage via sqlx

mod memory;
mod sqlite;

pub use memory::MemoryRepository;
pub use sqlite::SqliteRepository;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Form, FormField, Role, Submission, User};

/// Repository result type
pub type RepoResult<T> = Result<T, RepositoryError>;

/// Repository errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum RepositoryError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage error: {0}")]
    Storage(String),
}

/// Submission query
#[derive(Debug, Clone, Default)]
pub struct SubmissionFilter {
    /// Restrict to these forms; an empty list matches nothing
    pub form_ids: Option<Vec<Uuid>>,
    /// Only submissions created at or after this instant
    pub since: Option<DateTime<Utc>>,
}

impl SubmissionFilter {
    /// Everything
    pub fn all() -> Self {
        Self::default()
    }

    /// One form
    pub fn form(form_id: Uuid) -> Self {
        Self {
            form_ids: Some(vec![form_id]),
            since: None,
        }
    }

    /// Any of these forms
    pub fn forms(form_ids: Vec<Uuid>) -> Self {
        Self {
            form_ids: Some(form_ids),
            since: None,
        }
    }

    /// Add a lower time bound
    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub(crate) fn matches(&self, submission: &Submission) -> bool {
        self.form_ids
            .as_ref()
            .map(|ids| ids.contains(&submission.form_id))
            .unwrap_or(true)
            && self.since.map(|t| submission.created_at >= t).unwrap_or(true)
    }
}

/// Storage for users, forms, fields and submissions.
///
/// Ordering contracts:
/// - `list_users`: oldest first
/// - `list_forms`: newest first
/// - `list_fields`: ascending `order`, ties by creation time
/// - `list_submissions`: newest first
#[async_trait]
pub trait Repository: Send + Sync {
    /// Short backend name reported by health checks
    fn backend(&self) -> &'static str;
    /// Cheap round trip to the underlying store
    async fn ping(&self) -> RepoResult<()>;

    /// Insert a user; `Conflict` on duplicate email
    async fn insert_user(&self, user: &User) -> RepoResult<()>;
    /// Replace a user; `NotFound` if absent, `Conflict` on duplicate email
    async fn update_user(&self, user: &User) -> RepoResult<()>;
    async fn find_user(&self, id: Uuid) -> RepoResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>>;
    async fn list_users(&self, role: Option<Role>) -> RepoResult<Vec<User>>;
    /// Delete a user and everything they own; `false` if absent
    async fn delete_user(&self, id: Uuid) -> RepoResult<bool>;

    /// Insert a form; `Conflict` on a duplicate slug for the same client
    async fn insert_form(&self, form: &Form) -> RepoResult<()>;
    async fn update_form(&self, form: &Form) -> RepoResult<()>;
    async fn find_form(&self, id: Uuid) -> RepoResult<Option<Form>>;
    async fn find_form_by_slug(&self, client_id: Uuid, slug: &str) -> RepoResult<Option<Form>>;
    /// All forms, or one client's
    async fn list_forms(&self, client_id: Option<Uuid>) -> RepoResult<Vec<Form>>;
    /// Delete a form with its fields and submissions; `false` if absent
    async fn delete_form(&self, id: Uuid) -> RepoResult<bool>;

    async fn insert_field(&self, field: &FormField) -> RepoResult<()>;
    async fn update_field(&self, field: &FormField) -> RepoResult<()>;
    async fn find_field(&self, id: Uuid) -> RepoResult<Option<FormField>>;
    async fn list_fields(&self, form_id: Uuid) -> RepoResult<Vec<FormField>>;
    async fn delete_field(&self, id: Uuid) -> RepoResult<bool>;

    async fn insert_submission(&self, submission: &Submission) -> RepoResult<()>;
    async fn find_submission(&self, id: Uuid) -> RepoResult<Option<Submission>>;
    async fn list_submissions(&self, filter: &SubmissionFilter) -> RepoResult<Vec<Submission>>;
    async fn delete_submission(&self, id: Uuid) -> RepoResult<bool>;
}

/// Shared behavioural tests run against every backend
#[cfg(test)]
pub(crate) mod contract {
    use super::*;
    use crate::domain::{Email, FieldType, NewField};
    use chrono::Duration;
    use serde_json::json;

    pub fn client(email: &str) -> User {
        User::new(Email::new(email).unwrap(), "hash".into(), Some("Client".into()), Role::Client)
    }

    pub fn field(form_id: Uuid, label: &str, order: i32) -> FormField {
        NewField {
            label: label.into(),
            field_type: Some(FieldType::Text),
            ..Default::default()
        }
        .into_field(form_id, order)
        .unwrap()
    }

    pub async fn user_round_trip(repo: &dyn Repository) {
        let mut user = client("ada@example.com");
        repo.insert_user(&user).await.unwrap();

        let found = repo.find_user_by_email("ada@example.com").await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert_eq!(found.password_hash, "hash");
        assert_eq!(found.role, Role::Client);

        let dup = client("ada@example.com");
        assert!(matches!(repo.insert_user(&dup).await, Err(RepositoryError::Conflict(_))));

        user.name = Some("Ada L.".into());
        user.last_login_at = Some(Utc::now());
        repo.update_user(&user).await.unwrap();
        let found = repo.find_user(user.id).await.unwrap().unwrap();
        assert_eq!(found.name.as_deref(), Some("Ada L."));
        assert!(found.last_login_at.is_some());

        let ghost = client("ghost@example.com");
        assert!(matches!(repo.update_user(&ghost).await, Err(RepositoryError::NotFound(_))));

        let mut admin = client("root@example.com");
        admin.role = Role::SuperAdmin;
        repo.insert_user(&admin).await.unwrap();
        assert_eq!(repo.list_users(Some(Role::SuperAdmin)).await.unwrap().len(), 1);
        assert_eq!(repo.list_users(None).await.unwrap().len(), 2);
    }

    pub async fn slug_unique_per_client(repo: &dyn Repository) {
        let a = client("a@example.com");
        let b = client("b@example.com");
        repo.insert_user(&a).await.unwrap();
        repo.insert_user(&b).await.unwrap();

        repo.insert_form(&Form::new(a.id, "Contact".into(), None, "contact".into())).await.unwrap();
        repo.insert_form(&Form::new(b.id, "Contact".into(), None, "contact".into())).await.unwrap();
        let dup = Form::new(a.id, "Contact again".into(), None, "contact".into());
        assert!(matches!(repo.insert_form(&dup).await, Err(RepositoryError::Conflict(_))));

        let found = repo.find_form_by_slug(b.id, "contact").await.unwrap().unwrap();
        assert_eq!(found.client_id, b.id);
        assert_eq!(repo.list_forms(Some(a.id)).await.unwrap().len(), 1);
        assert_eq!(repo.list_forms(None).await.unwrap().len(), 2);
    }

    pub async fn fields_in_order(repo: &dyn Repository) {
        let owner = client("owner@example.com");
        repo.insert_user(&owner).await.unwrap();
        let form = Form::new(owner.id, "Survey".into(), None, "survey".into());
        repo.insert_form(&form).await.unwrap();

        for (label, order) in [("Third", 2), ("First", 0), ("Second", 1)] {
            repo.insert_field(&field(form.id, label, order)).await.unwrap();
        }

        let labels: Vec<String> = repo
            .list_fields(form.id)
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.label)
            .collect();
        assert_eq!(labels, ["First", "Second", "Third"]);

        let mut first = repo.list_fields(form.id).await.unwrap().remove(0);
        first.order = 10;
        first.options = vec![];
        repo.update_field(&first).await.unwrap();
        let last = repo.list_fields(form.id).await.unwrap().pop().unwrap();
        assert_eq!(last.id, first.id);

        assert!(repo.delete_field(first.id).await.unwrap());
        assert!(!repo.delete_field(first.id).await.unwrap());
        assert_eq!(repo.list_fields(form.id).await.unwrap().len(), 2);
    }

    pub async fn submissions_filtered(repo: &dyn Repository) {
        let owner = client("owner@example.com");
        repo.insert_user(&owner).await.unwrap();
        let form_a = Form::new(owner.id, "A".into(), None, "a".into());
        let form_b = Form::new(owner.id, "B".into(), None, "b".into());
        repo.insert_form(&form_a).await.unwrap();
        repo.insert_form(&form_b).await.unwrap();

        let now = Utc::now();
        let mut old = Submission::new(form_a.id, json!({ "Name": "old" }).as_object().cloned().unwrap());
        old.created_at = now - Duration::days(10);
        let recent = Submission::new(form_a.id, json!({ "Name": "recent" }).as_object().cloned().unwrap());
        let other = Submission::new(form_b.id, serde_json::Map::new());
        for s in [&old, &recent, &other] {
            repo.insert_submission(s).await.unwrap();
        }

        let for_a = repo.list_submissions(&SubmissionFilter::form(form_a.id)).await.unwrap();
        assert_eq!(for_a.len(), 2);
        assert_eq!(for_a[0].id, recent.id, "newest first");
        assert_eq!(for_a[1].data["Name"], "old");

        let since = SubmissionFilter::all().since(now - Duration::days(1));
        assert_eq!(repo.list_submissions(&since).await.unwrap().len(), 2);

        let none = SubmissionFilter::forms(vec![]);
        assert!(repo.list_submissions(&none).await.unwrap().is_empty());

        assert!(repo.delete_submission(other.id).await.unwrap());
        assert!(repo.find_submission(other.id).await.unwrap().is_none());
    }

    pub async fn cascades(repo: &dyn Repository) {
        let owner = client("owner@example.com");
        repo.insert_user(&owner).await.unwrap();
        let form = Form::new(owner.id, "Survey".into(), None, "survey".into());
        repo.insert_form(&form).await.unwrap();
        let f = field(form.id, "Name", 0);
        repo.insert_field(&f).await.unwrap();
        let s = Submission::new(form.id, serde_json::Map::new());
        repo.insert_submission(&s).await.unwrap();

        assert!(repo.delete_form(form.id).await.unwrap());
        assert!(repo.find_field(f.id).await.unwrap().is_none());
        assert!(repo.find_submission(s.id).await.unwrap().is_none());
        assert!(!repo.delete_form(form.id).await.unwrap());

        let form = Form::new(owner.id, "Again".into(), None, "again".into());
        repo.insert_form(&form).await.unwrap();
        let s = Submission::new(form.id, serde_json::Map::new());
        repo.insert_submission(&s).await.unwrap();

        assert!(repo.delete_user(owner.id).await.unwrap());
        assert!(repo.find_form(form.id).await.unwrap().is_none());
        assert!(repo.find_submission(s.id).await.unwrap().is_none());
    }
}
