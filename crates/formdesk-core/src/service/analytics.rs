//! Platform, client and per-form analytics

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use super::accessible_form;
use crate::auth::{Actor, Permission};
use crate::domain::{is_answered, FieldType, Role, UserStatus};
use crate::error::{FormdeskError, Result};
use crate::export::submissions_to_csv;
use crate::store::{Repository, SubmissionFilter};

/// Default timeline window in days
pub const DEFAULT_TIMELINE_DAYS: u32 = 30;
/// Longest timeline window in days
pub const MAX_TIMELINE_DAYS: u32 = 365;

/// Platform-wide totals
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlatformOverview {
    pub total_clients: usize,
    pub active_clients: usize,
    pub total_forms: usize,
    pub published_forms: usize,
    pub total_submissions: usize,
    pub submissions_last_7_days: usize,
    pub submissions_last_30_days: usize,
    pub avg_submissions_per_form: f64,
}

/// One client's activity
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientStats {
    pub client_id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub status: UserStatus,
    pub forms: usize,
    pub published_forms: usize,
    pub submissions: usize,
    pub last_login_at: Option<DateTime<Utc>>,
}

/// How often a choice was picked
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OptionCount {
    pub option: String,
    pub count: usize,
}

/// Answer statistics for one field
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldStats {
    pub field_id: Uuid,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub answered: usize,
    /// `answered / total submissions`, 0 when there are none
    pub answer_rate: f64,
    /// Present for choice fields, in option order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<OptionCount>>,
}

/// Statistics for one form
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FormStats {
    pub form_id: Uuid,
    pub title: String,
    pub published: bool,
    pub total_submissions: usize,
    pub first_submission_at: Option<DateTime<Utc>>,
    pub last_submission_at: Option<DateTime<Utc>>,
    pub fields: Vec<FieldStats>,
}

/// Submissions received on one UTC day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: usize,
}

/// Daily submission counts, oldest first
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Timeline {
    pub days: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form_id: Option<Uuid>,
    pub total: usize,
    pub points: Vec<DailyCount>,
}

/// Analytics service
#[derive(Clone)]
pub struct AnalyticsService {
    repo: Arc<dyn Repository>,
}

impl AnalyticsService {
    pub(crate) fn new(repo: Arc<dyn Repository>) -> Self {
        Self { repo }
    }

    /// Platform totals (super-admin)
    pub async fn overview(&self, actor: &Actor) -> Result<PlatformOverview> {
        actor.require(Permission::AnalyticsPlatform)?;

        let clients = self.repo.list_users(Some(Role::Client)).await?;
        let forms = self.repo.list_forms(None).await?;
        let submissions = self.repo.list_submissions(&SubmissionFilter::all()).await?;

        let now = Utc::now();
        let since = |days: i64| {
            let cutoff = now - Duration::days(days);
            submissions.iter().filter(|s| s.created_at >= cutoff).count()
        };

        let avg = if forms.is_empty() {
            0.0
        } else {
            round2(submissions.len() as f64 / forms.len() as f64)
        };

        Ok(PlatformOverview {
            total_clients: clients.len(),
            active_clients: clients.iter().filter(|c| c.is_active()).count(),
            total_forms: forms.len(),
            published_forms: forms.iter().filter(|f| f.published).count(),
            total_submissions: submissions.len(),
            submissions_last_7_days: since(7),
            submissions_last_30_days: since(30),
            avg_submissions_per_form: avg,
        })
    }

    /// Per-client activity, busiest first (super-admin)
    pub async fn clients(&self, actor: &Actor) -> Result<Vec<ClientStats>> {
        actor.require(Permission::AnalyticsPlatform)?;

        let clients = self.repo.list_users(Some(Role::Client)).await?;
        let forms = self.repo.list_forms(None).await?;
        let submissions = self.repo.list_submissions(&SubmissionFilter::all()).await?;

        let mut per_form: HashMap<Uuid, usize> = HashMap::new();
        for submission in &submissions {
            *per_form.entry(submission.form_id).or_default() += 1;
        }

        let mut rows: Vec<ClientStats> = clients
            .into_iter()
            .map(|client| {
                let owned: Vec<_> = forms.iter().filter(|f| f.client_id == client.id).collect();
                ClientStats {
                    client_id: client.id,
                    email: client.email,
                    name: client.name,
                    status: client.status,
                    forms: owned.len(),
                    published_forms: owned.iter().filter(|f| f.published).count(),
                    submissions: owned.iter().map(|f| per_form.get(&f.id).copied().unwrap_or(0)).sum(),
                    last_login_at: client.last_login_at,
                }
            })
            .collect();

        rows.sort_by(|a, b| b.submissions.cmp(&a.submissions).then_with(|| a.email.cmp(&b.email)));
        Ok(rows)
    }

    /// Submission and per-field statistics of one form
    pub async fn form_stats(&self, actor: &Actor, form_id: Uuid) -> Result<FormStats> {
        actor.require(Permission::AnalyticsRead)?;
        let form = accessible_form(self.repo.as_ref(), actor, form_id).await?;

        let fields = self.repo.list_fields(form_id).await?;
        let submissions = self.repo.list_submissions(&SubmissionFilter::form(form_id)).await?;
        let total = submissions.len();

        let fields = fields
            .into_iter()
            .map(|field| {
                let answers: Vec<_> = submissions
                    .iter()
                    .filter_map(|s| s.answer(&field.label))
                    .filter(|v| is_answered(v))
                    .collect();

                let options = (field.field_type.is_choice() && !field.options.is_empty()).then(|| {
                    field
                        .options
                        .iter()
                        .map(|option| OptionCount {
                            option: option.clone(),
                            count: answers.iter().filter(|v| picks(v, option)).count(),
                        })
                        .collect()
                });

                FieldStats {
                    field_id: field.id,
                    label: field.label,
                    field_type: field.field_type,
                    answered: answers.len(),
                    answer_rate: if total == 0 { 0.0 } else { round2(answers.len() as f64 / total as f64) },
                    options,
                }
            })
            .collect();

        Ok(FormStats {
            form_id: form.id,
            title: form.title,
            published: form.published,
            total_submissions: total,
            first_submission_at: submissions.iter().map(|s| s.created_at).min(),
            last_submission_at: submissions.iter().map(|s| s.created_at).max(),
            fields,
        })
    }

    /// Daily counts over the last `days` UTC days, today included.
    ///
    /// Clients are scoped to their own forms; `form_id` narrows to one form.
    pub async fn timeline(&self, actor: &Actor, days: Option<u32>, form_id: Option<Uuid>) -> Result<Timeline> {
        actor.require(Permission::AnalyticsRead)?;

        let days = days.unwrap_or(DEFAULT_TIMELINE_DAYS);
        if !(1..=MAX_TIMELINE_DAYS).contains(&days) {
            return Err(FormdeskError::Validation(format!(
                "days must be between 1 and {}",
                MAX_TIMELINE_DAYS
            )));
        }

        let today = Utc::now().date_naive();
        let first = today - Duration::days(i64::from(days) - 1);
        let start = first.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc();

        let filter = match form_id {
            Some(form_id) => {
                accessible_form(self.repo.as_ref(), actor, form_id).await?;
                SubmissionFilter::form(form_id)
            }
            None if actor.has(Permission::CrossTenant) => SubmissionFilter::all(),
            None => {
                let own = self.repo.list_forms(Some(actor.user_id)).await?;
                SubmissionFilter::forms(own.into_iter().map(|f| f.id).collect())
            }
        };
        let submissions = self.repo.list_submissions(&filter.since(start)).await?;

        let mut counts: HashMap<NaiveDate, usize> = HashMap::new();
        for submission in &submissions {
            *counts.entry(submission.created_at.date_naive()).or_default() += 1;
        }

        let points = (0..i64::from(days))
            .map(|offset| {
                let date = first + Duration::days(offset);
                DailyCount { date, count: counts.get(&date).copied().unwrap_or(0) }
            })
            .collect::<Vec<_>>();

        Ok(Timeline {
            days,
            form_id,
            total: points.iter().map(|p| p.count).sum(),
            points,
        })
    }

    /// CSV of a form's submissions, oldest first
    pub async fn export_csv(&self, actor: &Actor, form_id: Uuid) -> Result<String> {
        actor.require(Permission::SubmissionsRead)?;
        accessible_form(self.repo.as_ref(), actor, form_id).await?;

        let fields = self.repo.list_fields(form_id).await?;
        let mut submissions = self.repo.list_submissions(&SubmissionFilter::form(form_id)).await?;
        submissions.sort_by_key(|s| s.created_at);

        tracing::info!(by = %actor.user_id, form_id = %form_id, rows = submissions.len(), "submissions exported");
        submissions_to_csv(&fields, &submissions)
    }
}

fn picks(value: &serde_json::Value, option: &str) -> bool {
    match value {
        serde_json::Value::String(s) => s == option,
        serde_json::Value::Array(items) => items.iter().any(|i| i.as_str() == Some(option)),
        _ => false,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Email, NewField, NewForm, NewSubmission, Submission, User};
    use crate::store::MemoryRepository;
    use crate::Formdesk;
    use serde_json::json;

    struct Fixture {
        fd: Formdesk,
        repo: Arc<MemoryRepository>,
        admin: Actor,
        alice: Actor,
        bob: Actor,
        form_id: Uuid,
    }

    async fn user(repo: &MemoryRepository, email: &str, role: Role) -> Actor {
        let user = User::new(Email::new(email).unwrap(), String::new(), None, role);
        repo.insert_user(&user).await.unwrap();
        Actor::from_user(&user)
    }

    async fn fixture() -> Fixture {
        let repo = Arc::new(MemoryRepository::new());
        let admin = user(&repo, "root@example.com", Role::SuperAdmin).await;
        let alice = user(&repo, "alice@example.com", Role::Client).await;
        let bob = user(&repo, "bob@example.com", Role::Client).await;
        let fd = Formdesk::new(repo.clone(), "secret", 1);

        let form = fd
            .forms
            .create(
                &alice,
                NewForm {
                    title: "Poll".into(),
                    published: true,
                    fields: vec![
                        NewField { label: "Name".into(), ..Default::default() },
                        NewField {
                            label: "Colour".into(),
                            field_type: Some(FieldType::Checkbox),
                            options: vec!["Red".into(), "Blue".into()],
                            ..Default::default()
                        },
                    ],
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        Fixture { fd, repo, admin, alice, bob, form_id: form.form.id }
    }

    async fn submit(f: &Fixture, data: serde_json::Value) -> Submission {
        f.fd.submissions
            .create(NewSubmission { form_id: f.form_id, data: data.as_object().cloned().unwrap() })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_overview_and_clients() {
        let f = fixture().await;
        submit(&f, json!({ "Name": "a" })).await;
        submit(&f, json!({ "Name": "b" })).await;

        let overview = f.fd.analytics.overview(&f.admin).await.unwrap();
        assert_eq!(overview.total_clients, 2);
        assert_eq!(overview.total_forms, 1);
        assert_eq!(overview.published_forms, 1);
        assert_eq!(overview.total_submissions, 2);
        assert_eq!(overview.submissions_last_7_days, 2);
        assert_eq!(overview.avg_submissions_per_form, 2.0);

        let clients = f.fd.analytics.clients(&f.admin).await.unwrap();
        assert_eq!(clients[0].email, "alice@example.com");
        assert_eq!(clients[0].submissions, 2);
        assert_eq!(clients[1].submissions, 0);

        assert!(matches!(f.fd.analytics.overview(&f.alice).await, Err(FormdeskError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_form_stats() {
        let f = fixture().await;
        submit(&f, json!({ "Name": "a", "Colour": ["Red", "Blue"] })).await;
        submit(&f, json!({ "Colour": ["Red"] })).await;

        let stats = f.fd.analytics.form_stats(&f.alice, f.form_id).await.unwrap();
        assert_eq!(stats.total_submissions, 2);
        assert_eq!(stats.fields[0].answered, 1);
        assert_eq!(stats.fields[0].answer_rate, 0.5);
        assert!(stats.fields[0].options.is_none());
        assert_eq!(
            stats.fields[1].options.as_deref(),
            Some(&[
                OptionCount { option: "Red".into(), count: 2 },
                OptionCount { option: "Blue".into(), count: 1 },
            ][..])
        );

        assert!(f.fd.analytics.form_stats(&f.bob, f.form_id).await.is_err());
    }

    #[tokio::test]
    async fn test_timeline_zero_filled() {
        let f = fixture().await;
        submit(&f, json!({ "Name": "today" })).await;

        let old = Submission::new(f.form_id, serde_json::Map::new());
        let old = Submission { created_at: Utc::now() - Duration::days(2), ..old };
        f.repo.insert_submission(&old).await.unwrap();

        let timeline = f.fd.analytics.timeline(&f.alice, Some(7), None).await.unwrap();
        assert_eq!(timeline.points.len(), 7);
        assert_eq!(timeline.total, 2);
        assert_eq!(timeline.points[6].date, Utc::now().date_naive());
        assert_eq!(timeline.points[6].count, 1);
        assert_eq!(timeline.points[4].count, 1);
        assert!(timeline.points.windows(2).all(|w| w[0].date < w[1].date));

        let bobs = f.fd.analytics.timeline(&f.bob, None, None).await.unwrap();
        assert_eq!(bobs.points.len(), DEFAULT_TIMELINE_DAYS as usize);
        assert_eq!(bobs.total, 0);

        assert!(f.fd.analytics.timeline(&f.alice, Some(0), None).await.is_err());
        assert!(f.fd.analytics.timeline(&f.alice, Some(366), None).await.is_err());
    }

    #[tokio::test]
    async fn test_export_oldest_first() {
        let f = fixture().await;
        let first = submit(&f, json!({ "Name": "first" })).await;
        let second = submit(&f, json!({ "Name": "second", "Colour": ["Red", "Blue"] })).await;

        let csv = f.fd.analytics.export_csv(&f.alice, f.form_id).await.unwrap();
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines[0], "submission_id,submitted_at,Name,Colour");
        assert!(lines[1].starts_with(&first.id.to_string()));
        assert!(lines[2].starts_with(&second.id.to_string()));
        assert!(lines[2].ends_with(",second,Red; Blue"));

        assert!(f.fd.analytics.export_csv(&f.bob, f.form_id).await.is_err());
        assert!(f.fd.analytics.export_csv(&f.admin, f.form_id).await.is_ok());
    }
}
