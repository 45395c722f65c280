//! Form and field management

use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use super::accessible_form;
use crate::auth::{Actor, Permission};
use crate::domain::user::clean_optional;
use crate::domain::{
    slugify, validate_slug, validate_title, FieldPatch, Form, FormDetail, FormField, FormPatch,
    NewField, NewForm, Role, MAX_FIELD_ORDER, MAX_SLUG_LEN,
};
use crate::error::{FormdeskError, Result};
use crate::store::Repository;

/// Forms service
#[derive(Clone)]
pub struct FormsService {
    repo: Arc<dyn Repository>,
}

impl FormsService {
    pub(crate) fn new(repo: Arc<dyn Repository>) -> Self {
        Self { repo }
    }

    /// Clients see their own forms; super-admins see all, or one client's
    pub async fn list(&self, actor: &Actor, client_id: Option<Uuid>) -> Result<Vec<Form>> {
        actor.require(Permission::FormsRead)?;

        if actor.has(Permission::CrossTenant) {
            return Ok(self.repo.list_forms(client_id).await?);
        }
        if let Some(client_id) = client_id {
            actor.ensure_access(client_id, "forms")?;
        }
        Ok(self.repo.list_forms(Some(actor.user_id)).await?)
    }

    /// Create a form, optionally with its initial fields
    pub async fn create(&self, actor: &Actor, input: NewForm) -> Result<FormDetail> {
        actor.require(Permission::FormsWrite)?;

        let client_id = match input.client_id {
            Some(client_id) if client_id != actor.user_id => {
                actor.ensure_access(client_id, "client")?;
                let owner = self
                    .repo
                    .find_user(client_id)
                    .await?
                    .ok_or_else(|| FormdeskError::not_found("client", client_id))?;
                if owner.role != Role::Client {
                    return Err(FormdeskError::Validation("forms can only be owned by clients".into()));
                }
                client_id
            }
            _ => actor.user_id,
        };

        let title = validate_title(&input.title)?;
        let slug = match input.slug {
            Some(slug) => validate_slug(&slug)?,
            None => self.free_slug(client_id, &slugify(&title)).await?,
        };

        let mut form = Form::new(client_id, title, clean_optional(input.description), slug);

        let mut fields = Vec::with_capacity(input.fields.len());
        for (position, field) in input.fields.into_iter().enumerate() {
            fields.push(field.into_field(form.id, position as i32)?);
        }
        ensure_unique_labels(&fields)?;

        if input.published {
            ensure_publishable(&fields)?;
            form.published = true;
        }

        self.repo.insert_form(&form).await?;
        for field in &fields {
            self.repo.insert_field(field).await?;
        }

        tracing::info!(
            by = %actor.user_id,
            form_id = %form.id,
            client_id = %form.client_id,
            fields = fields.len(),
            "form created"
        );
        self.detail(form).await
    }

    /// Form with its fields in display order
    pub async fn get(&self, actor: &Actor, id: Uuid) -> Result<FormDetail> {
        actor.require(Permission::FormsRead)?;
        let form = accessible_form(self.repo.as_ref(), actor, id).await?;
        self.detail(form).await
    }

    /// Update title, description, slug or published flag
    pub async fn update(&self, actor: &Actor, id: Uuid, patch: FormPatch) -> Result<FormDetail> {
        actor.require(Permission::FormsWrite)?;
        let mut form = accessible_form(self.repo.as_ref(), actor, id).await?;

        if let Some(title) = patch.title {
            form.title = validate_title(&title)?;
        }
        if let Some(description) = patch.description {
            form.description = clean_optional(Some(description));
        }
        if let Some(slug) = patch.slug {
            form.slug = validate_slug(&slug)?;
        }
        if let Some(published) = patch.published {
            if published && !form.published {
                ensure_publishable(&self.repo.list_fields(form.id).await?)?;
            }
            form.published = published;
        }

        form.touch();
        self.repo.update_form(&form).await?;

        tracing::info!(by = %actor.user_id, form_id = %form.id, published = form.published, "form updated");
        self.detail(form).await
    }

    /// Delete a form with its fields and submissions
    pub async fn delete(&self, actor: &Actor, id: Uuid) -> Result<()> {
        actor.require(Permission::FormsDelete)?;
        accessible_form(self.repo.as_ref(), actor, id).await?;

        if !self.repo.delete_form(id).await? {
            return Err(FormdeskError::not_found("form", id));
        }

        tracing::info!(by = %actor.user_id, form_id = %id, "form deleted");
        Ok(())
    }

    /// Add a field; appended after the last one unless `order` is given
    pub async fn add_field(&self, actor: &Actor, form_id: Uuid, input: NewField) -> Result<FormField> {
        actor.require(Permission::FormsWrite)?;
        let mut form = accessible_form(self.repo.as_ref(), actor, form_id).await?;

        let existing = self.repo.list_fields(form_id).await?;
        let next = existing.iter().map(|f| f.order.saturating_add(1)).max().unwrap_or(0);
        if input.order.is_none() && next > MAX_FIELD_ORDER {
            return Err(FormdeskError::Validation(
                "no position left after the last field; reorder the fields first".into(),
            ));
        }
        let field = input.into_field(form_id, next)?;
        if existing.iter().any(|f| f.label == field.label) {
            return Err(duplicate_label(&field.label));
        }

        self.repo.insert_field(&field).await?;
        form.touch();
        self.repo.update_form(&form).await?;

        tracing::info!(by = %actor.user_id, form_id = %form_id, field_id = %field.id, "field added");
        Ok(field)
    }

    /// Patch one field of a form
    pub async fn update_field(
        &self,
        actor: &Actor,
        form_id: Uuid,
        field_id: Uuid,
        patch: FieldPatch,
    ) -> Result<FormField> {
        actor.require(Permission::FormsWrite)?;
        let mut form = accessible_form(self.repo.as_ref(), actor, form_id).await?;
        let mut field = self.field_of(form_id, field_id).await?;

        patch.apply(&mut field)?;
        let clash = self
            .repo
            .list_fields(form_id)
            .await?
            .into_iter()
            .any(|f| f.id != field.id && f.label == field.label);
        if clash {
            return Err(duplicate_label(&field.label));
        }

        self.repo.update_field(&field).await?;
        form.touch();
        self.repo.update_form(&form).await?;

        tracing::info!(by = %actor.user_id, form_id = %form_id, field_id = %field_id, "field updated");
        Ok(field)
    }

    /// Remove one field of a form
    pub async fn delete_field(&self, actor: &Actor, form_id: Uuid, field_id: Uuid) -> Result<()> {
        actor.require(Permission::FormsWrite)?;
        let mut form = accessible_form(self.repo.as_ref(), actor, form_id).await?;
        self.field_of(form_id, field_id).await?;
        if form.published && self.repo.list_fields(form_id).await?.len() == 1 {
            return Err(FormdeskError::Validation(
                "cannot remove the last field of a published form; unpublish it first".into(),
            ));
        }

        self.repo.delete_field(field_id).await?;
        form.touch();
        self.repo.update_form(&form).await?;

        tracing::info!(by = %actor.user_id, form_id = %form_id, field_id = %field_id, "field deleted");
        Ok(())
    }

    /// Rewrite display order; `field_ids` must be a permutation of the form's fields
    pub async fn reorder_fields(&self, actor: &Actor, form_id: Uuid, field_ids: Vec<Uuid>) -> Result<Vec<FormField>> {
        actor.require(Permission::FormsWrite)?;
        let mut form = accessible_form(self.repo.as_ref(), actor, form_id).await?;

        let fields = self.repo.list_fields(form_id).await?;
        let current: HashSet<Uuid> = fields.iter().map(|f| f.id).collect();
        let requested: HashSet<Uuid> = field_ids.iter().copied().collect();
        if requested.len() != field_ids.len() || requested != current {
            return Err(FormdeskError::Validation(
                "field order must list every field of the form exactly once".into(),
            ));
        }

        for mut field in fields {
            let position = field_ids.iter().position(|id| *id == field.id).unwrap_or_default() as i32;
            if field.order != position {
                field.order = position;
                self.repo.update_field(&field).await?;
            }
        }
        form.touch();
        self.repo.update_form(&form).await?;

        tracing::info!(by = %actor.user_id, form_id = %form_id, "fields reordered");
        Ok(self.repo.list_fields(form_id).await?)
    }

    /// Unauthenticated read of a published form by its public address
    pub async fn get_public(&self, client_id: Uuid, slug: &str) -> Result<FormDetail> {
        let form = self
            .repo
            .find_form_by_slug(client_id, slug)
            .await?
            .filter(|f| f.published)
            .ok_or_else(|| FormdeskError::NotFound(format!("form '{}'", slug)))?;
        self.detail(form).await
    }

    async fn detail(&self, form: Form) -> Result<FormDetail> {
        let fields = self.repo.list_fields(form.id).await?;
        Ok(FormDetail { form, fields })
    }

    async fn field_of(&self, form_id: Uuid, field_id: Uuid) -> Result<FormField> {
        self.repo
            .find_field(field_id)
            .await?
            .filter(|f| f.form_id == form_id)
            .ok_or_else(|| FormdeskError::not_found("field", field_id))
    }

    /// `base`, or `base-2`, `base-3`, ... whichever is free for the client
    async fn free_slug(&self, client_id: Uuid, base: &str) -> Result<String> {
        let mut candidate = base.to_string();
        let mut n = 2;
        while self.repo.find_form_by_slug(client_id, &candidate).await?.is_some() {
            let suffix = format!("-{}", n);
            let room = MAX_SLUG_LEN - suffix.len();
            let stem = if base.len() > room { base[..room].trim_end_matches('-') } else { base };
            candidate = format!("{}{}", stem, suffix);
            n += 1;
        }
        Ok(candidate)
    }
}

fn ensure_unique_labels(fields: &[FormField]) -> Result<()> {
    let mut seen = HashSet::new();
    for field in fields {
        if !seen.insert(field.label.as_str()) {
            return Err(duplicate_label(&field.label));
        }
    }
    Ok(())
}

fn ensure_publishable(fields: &[FormField]) -> Result<()> {
    if fields.is_empty() {
        return Err(FormdeskError::Validation("cannot publish a form without fields".into()));
    }
    Ok(())
}

fn duplicate_label(label: &str) -> FormdeskError {
    FormdeskError::Conflict(format!("a field labelled '{}' already exists", label))
}
