//! In-memory repository (development and tests)

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

use super::{RepoResult, Repository, RepositoryError, SubmissionFilter};
use crate::domain::{sort_fields, Form, FormField, Role, Submission, User};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    forms: HashMap<Uuid, Form>,
    fields: HashMap<Uuid, FormField>,
    submissions: HashMap<Uuid, Submission>,
}

impl Tables {
    fn email_taken(&self, email: &str, except: Option<Uuid>) -> bool {
        self.users
            .values()
            .any(|u| u.email == email && Some(u.id) != except)
    }

    fn slug_taken(&self, client_id: Uuid, slug: &str, except: Option<Uuid>) -> bool {
        self.forms
            .values()
            .any(|f| f.client_id == client_id && f.slug == slug && Some(f.id) != except)
    }

    fn remove_form(&mut self, id: Uuid) -> bool {
        if self.forms.remove(&id).is_none() {
            return false;
        }
        self.fields.retain(|_, f| f.form_id != id);
        self.submissions.retain(|_, s| s.form_id != id);
        true
    }
}

/// Repository over hash maps behind a single lock, so cascades are atomic
#[derive(Default)]
pub struct MemoryRepository {
    tables: RwLock<Tables>,
}

impl MemoryRepository {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> RepoResult<()> {
        Ok(())
    }

    async fn insert_user(&self, user: &User) -> RepoResult<()> {
        let mut tables = self.tables.write();
        if tables.email_taken(&user.email, None) {
            return Err(RepositoryError::Conflict(format!("email {} already registered", user.email)));
        }
        tables.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn update_user(&self, user: &User) -> RepoResult<()> {
        let mut tables = self.tables.write();
        if !tables.users.contains_key(&user.id) {
            return Err(RepositoryError::NotFound(format!("user {}", user.id)));
        }
        if tables.email_taken(&user.email, Some(user.id)) {
            return Err(RepositoryError::Conflict(format!("email {} already registered", user.email)));
        }
        tables.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        Ok(self.tables.read().users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        Ok(self
            .tables
            .read()
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn list_users(&self, role: Option<Role>) -> RepoResult<Vec<User>> {
        let mut users: Vec<User> = self
            .tables
            .read()
            .users
            .values()
            .filter(|u| role.map(|r| u.role == r).unwrap_or(true))
            .cloned()
            .collect();
        users.sort_by_key(|u| u.created_at);
        Ok(users)
    }

    async fn delete_user(&self, id: Uuid) -> RepoResult<bool> {
        let mut tables = self.tables.write();
        if tables.users.remove(&id).is_none() {
            return Ok(false);
        }
        let owned: Vec<Uuid> = tables
            .forms
            .values()
            .filter(|f| f.client_id == id)
            .map(|f| f.id)
            .collect();
        for form_id in owned {
            tables.remove_form(form_id);
        }
        Ok(true)
    }

    async fn insert_form(&self, form: &Form) -> RepoResult<()> {
        let mut tables = self.tables.write();
        if !tables.users.contains_key(&form.client_id) {
            return Err(RepositoryError::NotFound(format!("client {}", form.client_id)));
        }
        if tables.slug_taken(form.client_id, &form.slug, None) {
            return Err(RepositoryError::Conflict(format!("slug '{}' already in use", form.slug)));
        }
        tables.forms.insert(form.id, form.clone());
        Ok(())
    }

    async fn update_form(&self, form: &Form) -> RepoResult<()> {
        let mut tables = self.tables.write();
        if !tables.forms.contains_key(&form.id) {
            return Err(RepositoryError::NotFound(format!("form {}", form.id)));
        }
        if tables.slug_taken(form.client_id, &form.slug, Some(form.id)) {
            return Err(RepositoryError::Conflict(format!("slug '{}' already in use", form.slug)));
        }
        tables.forms.insert(form.id, form.clone());
        Ok(())
    }

    async fn find_form(&self, id: Uuid) -> RepoResult<Option<Form>> {
        Ok(self.tables.read().forms.get(&id).cloned())
    }

    async fn find_form_by_slug(&self, client_id: Uuid, slug: &str) -> RepoResult<Option<Form>> {
        Ok(self
            .tables
            .read()
            .forms
            .values()
            .find(|f| f.client_id == client_id && f.slug == slug)
            .cloned())
    }

    async fn list_forms(&self, client_id: Option<Uuid>) -> RepoResult<Vec<Form>> {
        let mut forms: Vec<Form> = self
            .tables
            .read()
            .forms
            .values()
            .filter(|f| client_id.map(|c| f.client_id == c).unwrap_or(true))
            .cloned()
            .collect();
        forms.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(forms)
    }

    async fn delete_form(&self, id: Uuid) -> RepoResult<bool> {
        Ok(self.tables.write().remove_form(id))
    }

    async fn insert_field(&self, field: &FormField) -> RepoResult<()> {
        let mut tables = self.tables.write();
        if !tables.forms.contains_key(&field.form_id) {
            return Err(RepositoryError::NotFound(format!("form {}", field.form_id)));
        }
        tables.fields.insert(field.id, field.clone());
        Ok(())
    }

    async fn update_field(&self, field: &FormField) -> RepoResult<()> {
        let mut tables = self.tables.write();
        match tables.fields.get_mut(&field.id) {
            Some(existing) => {
                *existing = field.clone();
                Ok(())
            }
            None => Err(RepositoryError::NotFound(format!("field {}", field.id))),
        }
    }

    async fn find_field(&self, id: Uuid) -> RepoResult<Option<FormField>> {
        Ok(self.tables.read().fields.get(&id).cloned())
    }

    async fn list_fields(&self, form_id: Uuid) -> RepoResult<Vec<FormField>> {
        let mut fields: Vec<FormField> = self
            .tables
            .read()
            .fields
            .values()
            .filter(|f| f.form_id == form_id)
            .cloned()
            .collect();
        sort_fields(&mut fields);
        Ok(fields)
    }

    async fn delete_field(&self, id: Uuid) -> RepoResult<bool> {
        Ok(self.tables.write().fields.remove(&id).is_some())
    }

    async fn insert_submission(&self, submission: &Submission) -> RepoResult<()> {
        let mut tables = self.tables.write();
        if !tables.forms.contains_key(&submission.form_id) {
            return Err(RepositoryError::NotFound(format!("form {}", submission.form_id)));
        }
        tables.submissions.insert(submission.id, submission.clone());
        Ok(())
    }

    async fn find_submission(&self, id: Uuid) -> RepoResult<Option<Submission>> {
        Ok(self.tables.read().submissions.get(&id).cloned())
    }

    async fn list_submissions(&self, filter: &SubmissionFilter) -> RepoResult<Vec<Submission>> {
        let mut submissions: Vec<Submission> = self
            .tables
            .read()
            .submissions
            .values()
            .filter(|s| filter.matches(s))
            .cloned()
            .collect();
        submissions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(submissions)
    }

    async fn delete_submission(&self, id: Uuid) -> RepoResult<bool> {
        Ok(self.tables.write().submissions.remove(&id).is_some())
    }
}
