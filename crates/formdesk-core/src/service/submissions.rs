//! Collecting and reading submissions

use std::sync::Arc;
use uuid::Uuid;

use super::accessible_form;
use crate::auth::{Actor, Permission};
use crate::domain::{validate_answers, NewSubmission, Submission};
use crate::error::{FormdeskError, Result};
use crate::store::{Repository, SubmissionFilter};

/// Submissions service
#[derive(Clone)]
pub struct SubmissionsService {
    repo: Arc<dyn Repository>,
}

impl SubmissionsService {
    pub(crate) fn new(repo: Arc<dyn Repository>) -> Self {
        Self { repo }
    }

    /// Public entry point; only published forms accept answers
    pub async fn create(&self, input: NewSubmission) -> Result<Submission> {
        let form = self
            .repo
            .find_form(input.form_id)
            .await?
            .ok_or_else(|| FormdeskError::not_found("form", input.form_id))?;
        if !form.published {
            tracing::debug!(form_id = %form.id, "submission to unpublished form refused");
            return Err(FormdeskError::Forbidden("form is not accepting submissions".into()));
        }

        let fields = self.repo.list_fields(form.id).await?;
        validate_answers(&fields, &input.data)?;

        let submission = Submission::new(form.id, input.data);
        self.repo.insert_submission(&submission).await?;

        tracing::info!(form_id = %form.id, submission_id = %submission.id, "submission received");
        Ok(submission)
    }

    /// Newest first. Without `form_id`, clients get every submission to
    /// their own forms and super-admins get everything.
    pub async fn list(&self, actor: &Actor, form_id: Option<Uuid>) -> Result<Vec<Submission>> {
        if let Some(form_id) = form_id {
            return self.list_for_form(actor, form_id).await;
        }
        actor.require(Permission::SubmissionsRead)?;

        let filter = if actor.has(Permission::CrossTenant) {
            SubmissionFilter::all()
        } else {
            let own = self.repo.list_forms(Some(actor.user_id)).await?;
            SubmissionFilter::forms(own.into_iter().map(|f| f.id).collect())
        };
        Ok(self.repo.list_submissions(&filter).await?)
    }

    /// Submissions of one form, newest first
    pub async fn list_for_form(&self, actor: &Actor, form_id: Uuid) -> Result<Vec<Submission>> {
        actor.require(Permission::SubmissionsRead)?;
        accessible_form(self.repo.as_ref(), actor, form_id).await?;
        Ok(self.repo.list_submissions(&SubmissionFilter::form(form_id)).await?)
    }

    /// One submission, if it belongs to a form the actor can see
    pub async fn get(&self, actor: &Actor, id: Uuid) -> Result<Submission> {
        actor.require(Permission::SubmissionsRead)?;
        self.accessible(actor, id).await
    }

    /// Remove one submission
    pub async fn delete(&self, actor: &Actor, id: Uuid) -> Result<()> {
        actor.require(Permission::SubmissionsDelete)?;
        self.accessible(actor, id).await?;

        if !self.repo.delete_submission(id).await? {
            return Err(FormdeskError::not_found("submission", id));
        }

        tracing::info!(by = %actor.user_id, submission_id = %id, "submission deleted");
        Ok(())
    }

    async fn accessible(&self, actor: &Actor, id: Uuid) -> Result<Submission> {
        let submission = self
            .repo
            .find_submission(id)
            .await?
            .ok_or_else(|| FormdeskError::not_found("submission", id))?;
        accessible_form(self.repo.as_ref(), actor, submission.form_id).await?;
        Ok(submission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Email, FieldType, NewField, NewForm, Role, User};
    use crate::store::MemoryRepository;
    use crate::Formdesk;
    use serde_json::{json, Map, Value};

    async fn client(repo: &MemoryRepository, email: &str) -> Actor {
        let user = User::new(Email::new(email).unwrap(), String::new(), None, Role::Client);
        repo.insert_user(&user).await.unwrap();
        Actor::from_user(&user)
    }

    async fn setup() -> (Formdesk, Actor, Actor, Uuid) {
        let repo = Arc::new(MemoryRepository::new());
        let alice = client(&repo, "alice@example.com").await;
        let bob = client(&repo, "bob@example.com").await;
        let fd = Formdesk::new(repo, "secret", 1);

        let form = fd
            .forms
            .create(
                &alice,
                NewForm {
                    title: "Signup".into(),
                    published: true,
                    fields: vec![
                        NewField { label: "Name".into(), required: true, ..Default::default() },
                        NewField {
                            label: "Plan".into(),
                            field_type: Some(FieldType::Dropdown),
                            options: vec!["Free".into(), "Pro".into()],
                            ..Default::default()
                        },
                    ],
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        (fd, alice, bob, form.form.id)
    }

    fn answers(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_submit_and_read_back() {
        let (fd, alice, _, form_id) = setup().await;
        let created = fd
            .submissions
            .create(NewSubmission { form_id, data: answers(json!({ "Name": "Ada", "Plan": "Pro" })) })
            .await
            .unwrap();

        let fetched = fd.submissions.get(&alice, created.id).await.unwrap();
        assert_eq!(fetched.answer("Plan"), Some(&json!("Pro")));
        assert_eq!(fd.submissions.list_for_form(&alice, form_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_answers_rejected() {
        let (fd, _, _, form_id) = setup().await;
        let err = fd
            .submissions
            .create(NewSubmission { form_id, data: answers(json!({ "Plan": "Gold" })) })
            .await
            .unwrap_err();
        assert!(matches!(err, FormdeskError::Validation(_)));
    }

    #[tokio::test]
    async fn test_unpublished_refused() {
        let (fd, alice, _, form_id) = setup().await;
        fd.forms
            .update(
                &alice,
                form_id,
                crate::domain::FormPatch { published: Some(false), ..Default::default() },
            )
            .await
            .unwrap();

        let err = fd
            .submissions
            .create(NewSubmission { form_id, data: answers(json!({ "Name": "Ada" })) })
            .await
            .unwrap_err();
        assert!(matches!(err, FormdeskError::Forbidden(_)));

        let missing = NewSubmission { form_id: Uuid::new_v4(), data: Map::new() };
        assert!(matches!(fd.submissions.create(missing).await, Err(FormdeskError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_tenant_isolation() {
        let (fd, alice, bob, form_id) = setup().await;
        let submission = fd
            .submissions
            .create(NewSubmission { form_id, data: answers(json!({ "Name": "Ada" })) })
            .await
            .unwrap();

        assert!(fd.submissions.list(&bob, None).await.unwrap().is_empty());
        assert_eq!(fd.submissions.list(&alice, None).await.unwrap().len(), 1);
        assert!(matches!(
            fd.submissions.get(&bob, submission.id).await,
            Err(FormdeskError::Forbidden(_))
        ));
        assert!(fd.submissions.list(&bob, Some(form_id)).await.is_err());
        assert!(fd.submissions.delete(&bob, submission.id).await.is_err());

        fd.submissions.delete(&alice, submission.id).await.unwrap();
        assert!(matches!(
            fd.submissions.get(&alice, submission.id).await,
            Err(FormdeskError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_form_delete_cascades() {
        let (fd, alice, _, form_id) = setup().await;
        let submission = fd
            .submissions
            .create(NewSubmission { form_id, data: answers(json!({ "Name": "Ada" })) })
            .await
            .unwrap();

        fd.forms.delete(&alice, form_id).await.unwrap();
        assert!(fd.submissions.list(&alice, None).await.unwrap().is_empty());
        assert!(matches!(
            fd.submissions.get(&alice, submission.id).await,
            Err(FormdeskError::NotFound(_))
        ));
    }
}
