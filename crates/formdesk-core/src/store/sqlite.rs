//! SQLite repository (sqlx)

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite};
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

use super::{RepoResult, Repository, RepositoryError, SubmissionFilter};
use crate::domain::{Form, FormField, Role, Submission, User};

/// Table definitions, applied idempotently on connect
const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id BLOB PRIMARY KEY NOT NULL,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        name TEXT,
        role TEXT NOT NULL,
        status TEXT NOT NULL,
        last_login_at TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS forms (
        id BLOB PRIMARY KEY NOT NULL,
        client_id BLOB NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        title TEXT NOT NULL,
        description TEXT,
        slug TEXT NOT NULL,
        published INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        UNIQUE (client_id, slug)
    )",
    "CREATE TABLE IF NOT EXISTS form_fields (
        id BLOB PRIMARY KEY NOT NULL,
        form_id BLOB NOT NULL REFERENCES forms(id) ON DELETE CASCADE,
        label TEXT NOT NULL,
        field_type TEXT NOT NULL,
        placeholder TEXT,
        required INTEGER NOT NULL DEFAULT 0,
        position INTEGER NOT NULL,
        options TEXT NOT NULL DEFAULT '[]',
        created_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_form_fields_form ON form_fields (form_id, position)",
    "CREATE TABLE IF NOT EXISTS submissions (
        id BLOB PRIMARY KEY NOT NULL,
        form_id BLOB NOT NULL REFERENCES forms(id) ON DELETE CASCADE,
        data TEXT NOT NULL,
        created_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_submissions_form ON submissions (form_id, created_at)",
];

const USER_COLUMNS: &str =
    "id, email, password_hash, name, role, status, last_login_at, created_at, updated_at";
const FORM_COLUMNS: &str = "id, client_id, title, description, slug, published, created_at, updated_at";
const FIELD_COLUMNS: &str =
    "id, form_id, label, field_type, placeholder, required, position, options, created_at";
const SUBMISSION_COLUMNS: &str = "id, form_id, data, created_at";

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        RepositoryError::Storage(err.to_string())
    }
}

/// Map constraint violations to domain conflicts
fn write_error(err: sqlx::Error, conflict: impl FnOnce() -> String) -> RepositoryError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return RepositoryError::Conflict(conflict());
        }
        if db.is_foreign_key_violation() {
            return RepositoryError::NotFound("referenced record".into());
        }
    }
    tracing::error!(error = %err, "sqlite write failed");
    RepositoryError::Storage(err.to_string())
}

fn corrupt(what: &str, err: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::Storage(format!("corrupt {}: {}", what, err))
}

/// Repository backed by a SQLite database
#[derive(Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Open (creating if missing) the database at `url` and apply the schema.
    ///
    /// `sqlite::memory:` gets a single pinned connection, since every
    /// connection to it would otherwise see its own empty database.
    pub async fn connect(url: &str) -> RepoResult<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let in_memory = url.contains(":memory:") || url.contains("mode=memory");
        let pool = SqlitePoolOptions::new()
            .max_connections(if in_memory { 1 } else { 8 })
            .min_connections(1)
            .idle_timeout(Option::<Duration>::None)
            .max_lifetime(Option::<Duration>::None)
            .connect_with(options)
            .await?;

        let repo = Self { pool };
        repo.init_schema().await?;
        tracing::info!(url, "sqlite repository ready");
        Ok(repo)
    }

    /// Private in-memory database
    pub async fn in_memory() -> RepoResult<Self> {
        Self::connect("sqlite::memory:").await
    }

    /// Create tables and indexes if they do not exist
    pub async fn init_schema(&self) -> RepoResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    fn user_from_row(row: &SqliteRow) -> RepoResult<User> {
        let role: String = row.try_get("role")?;
        let status: String = row.try_get("status")?;
        Ok(User {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            name: row.try_get("name")?,
            role: Role::from_str(&role).map_err(|e| corrupt("user role", e))?,
            status: status.parse().map_err(|e| corrupt("user status", e))?,
            last_login_at: row.try_get("last_login_at")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn form_from_row(row: &SqliteRow) -> RepoResult<Form> {
        Ok(Form {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            client_id: row.try_get("client_id")?,
            slug: row.try_get("slug")?,
            published: row.try_get("published")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn field_from_row(row: &SqliteRow) -> RepoResult<FormField> {
        let field_type: String = row.try_get("field_type")?;
        let options: String = row.try_get("options")?;
        Ok(FormField {
            id: row.try_get("id")?,
            form_id: row.try_get("form_id")?,
            label: row.try_get("label")?,
            field_type: field_type.parse().map_err(|e| corrupt("field type", e))?,
            placeholder: row.try_get("placeholder")?,
            required: row.try_get("required")?,
            order: row.try_get("position")?,
            options: serde_json::from_str(&options).map_err(|e| corrupt("field options", e))?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn submission_from_row(row: &SqliteRow) -> RepoResult<Submission> {
        let data: String = row.try_get("data")?;
        Ok(Submission {
            id: row.try_get("id")?,
            form_id: row.try_get("form_id")?,
            data: serde_json::from_str(&data).map_err(|e| corrupt("submission data", e))?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl Repository for SqliteRepository {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    async fn ping(&self) -> RepoResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn insert_user(&self, user: &User) -> RepoResult<()> {
        sqlx::query(&format!(
            "INSERT INTO users ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            USER_COLUMNS
        ))
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(user.role.as_str())
        .bind(user.status.as_str())
        .bind(user.last_login_at)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, || format!("email {} already registered", user.email)))?;
        Ok(())
    }

    async fn update_user(&self, user: &User) -> RepoResult<()> {
        let result = sqlx::query(
            "UPDATE users SET email = ?, password_hash = ?, name = ?, role = ?, status = ?,
                last_login_at = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(user.role.as_str())
        .bind(user.status.as_str())
        .bind(user.last_login_at)
        .bind(user.updated_at)
        .bind(user.id)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, || format!("email {} already registered", user.email)))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("user {}", user.id)));
        }
        Ok(())
    }

    async fn find_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        sqlx::query(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(Self::user_from_row)
            .transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        sqlx::query(&format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(Self::user_from_row)
            .transpose()
    }

    async fn list_users(&self, role: Option<Role>) -> RepoResult<Vec<User>> {
        let rows = match role {
            Some(role) => {
                sqlx::query(&format!(
                    "SELECT {} FROM users WHERE role = ? ORDER BY created_at ASC",
                    USER_COLUMNS
                ))
                .bind(role.as_str())
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(&format!("SELECT {} FROM users ORDER BY created_at ASC", USER_COLUMNS))
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        rows.iter().map(Self::user_from_row).collect()
    }

    async fn delete_user(&self, id: Uuid) -> RepoResult<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "DELETE FROM submissions WHERE form_id IN (SELECT id FROM forms WHERE client_id = ?)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;
        sqlx::query(
            "DELETE FROM form_fields WHERE form_id IN (SELECT id FROM forms WHERE client_id = ?)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;
        sqlx::query("DELETE FROM forms WHERE client_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_form(&self, form: &Form) -> RepoResult<()> {
        sqlx::query(&format!(
            "INSERT INTO forms ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            FORM_COLUMNS
        ))
        .bind(form.id)
        .bind(form.client_id)
        .bind(&form.title)
        .bind(&form.description)
        .bind(&form.slug)
        .bind(form.published)
        .bind(form.created_at)
        .bind(form.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, || format!("slug '{}' already in use", form.slug)))?;
        Ok(())
    }

    async fn update_form(&self, form: &Form) -> RepoResult<()> {
        let result = sqlx::query(
            "UPDATE forms SET title = ?, description = ?, slug = ?, published = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&form.title)
        .bind(&form.description)
        .bind(&form.slug)
        .bind(form.published)
        .bind(form.updated_at)
        .bind(form.id)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, || format!("slug '{}' already in use", form.slug)))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("form {}", form.id)));
        }
        Ok(())
    }

    async fn find_form(&self, id: Uuid) -> RepoResult<Option<Form>> {
        sqlx::query(&format!("SELECT {} FROM forms WHERE id = ?", FORM_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(Self::form_from_row)
            .transpose()
    }

    async fn find_form_by_slug(&self, client_id: Uuid, slug: &str) -> RepoResult<Option<Form>> {
        sqlx::query(&format!(
            "SELECT {} FROM forms WHERE client_id = ? AND slug = ?",
            FORM_COLUMNS
        ))
        .bind(client_id)
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?
        .as_ref()
        .map(Self::form_from_row)
        .transpose()
    }

    async fn list_forms(&self, client_id: Option<Uuid>) -> RepoResult<Vec<Form>> {
        let rows = match client_id {
            Some(client_id) => {
                sqlx::query(&format!(
                    "SELECT {} FROM forms WHERE client_id = ? ORDER BY created_at DESC",
                    FORM_COLUMNS
                ))
                .bind(client_id)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(&format!("SELECT {} FROM forms ORDER BY created_at DESC", FORM_COLUMNS))
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        rows.iter().map(Self::form_from_row).collect()
    }

    async fn delete_form(&self, id: Uuid) -> RepoResult<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM submissions WHERE form_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM form_fields WHERE form_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM forms WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_field(&self, field: &FormField) -> RepoResult<()> {
        let options = serde_json::to_string(&field.options)
            .map_err(|e| RepositoryError::Storage(e.to_string()))?;

        sqlx::query(&format!(
            "INSERT INTO form_fields ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            FIELD_COLUMNS
        ))
        .bind(field.id)
        .bind(field.form_id)
        .bind(&field.label)
        .bind(field.field_type.as_str())
        .bind(&field.placeholder)
        .bind(field.required)
        .bind(field.order)
        .bind(options)
        .bind(field.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, || format!("field {} already exists", field.id)))?;
        Ok(())
    }

    async fn update_field(&self, field: &FormField) -> RepoResult<()> {
        let options = serde_json::to_string(&field.options)
            .map_err(|e| RepositoryError::Storage(e.to_string()))?;

        let result = sqlx::query(
            "UPDATE form_fields SET label = ?, field_type = ?, placeholder = ?, required = ?,
                position = ?, options = ?
             WHERE id = ?",
        )
        .bind(&field.label)
        .bind(field.field_type.as_str())
        .bind(&field.placeholder)
        .bind(field.required)
        .bind(field.order)
        .bind(options)
        .bind(field.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("field {}", field.id)));
        }
        Ok(())
    }

    async fn find_field(&self, id: Uuid) -> RepoResult<Option<FormField>> {
        sqlx::query(&format!("SELECT {} FROM form_fields WHERE id = ?", FIELD_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(Self::field_from_row)
            .transpose()
    }

    async fn list_fields(&self, form_id: Uuid) -> RepoResult<Vec<FormField>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM form_fields WHERE form_id = ? ORDER BY position ASC, created_at ASC",
            FIELD_COLUMNS
        ))
        .bind(form_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(Self::field_from_row).collect()
    }

    async fn delete_field(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM form_fields WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_submission(&self, submission: &Submission) -> RepoResult<()> {
        let data = serde_json::to_string(&submission.data)
            .map_err(|e| RepositoryError::Storage(e.to_string()))?;

        sqlx::query(&format!(
            "INSERT INTO submissions ({}) VALUES (?, ?, ?, ?)",
            SUBMISSION_COLUMNS
        ))
        .bind(submission.id)
        .bind(submission.form_id)
        .bind(data)
        .bind(submission.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, || format!("submission {} already exists", submission.id)))?;
        Ok(())
    }

    async fn find_submission(&self, id: Uuid) -> RepoResult<Option<Submission>> {
        sqlx::query(&format!("SELECT {} FROM submissions WHERE id = ?", SUBMISSION_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(Self::submission_from_row)
            .transpose()
    }

    async fn list_submissions(&self, filter: &SubmissionFilter) -> RepoResult<Vec<Submission>> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {} FROM submissions WHERE 1 = 1",
            SUBMISSION_COLUMNS
        ));

        if let Some(form_ids) = &filter.form_ids {
            if form_ids.is_empty() {
                return Ok(Vec::new());
            }
            query.push(" AND form_id IN (");
            let mut ids = query.separated(", ");
            for id in form_ids {
                ids.push_bind(*id);
            }
            ids.push_unseparated(")");
        }
        if let Some(since) = filter.since {
            query.push(" AND created_at >= ").push_bind(since);
        }
        query.push(" ORDER BY created_at DESC");

        let rows = query.build().fetch_all(&self.pool).await?;
        rows.iter().map(Self::submission_from_row).collect()
    }

    async fn delete_submission(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM submissions WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::contract;

    async fn repo() -> SqliteRepository {
        SqliteRepository::in_memory().await.unwrap()
    }

    #[tokio::test]
    async fn test_user_round_trip() {
        contract::user_round_trip(&repo().await).await;
    }

    #[tokio::test]
    async fn test_slug_unique_per_client() {
        contract::slug_unique_per_client(&repo().await).await;
    }

    #[tokio::test]
    async fn test_fields_in_order() {
        contract::fields_in_order(&repo().await).await;
    }

    #[tokio::test]
    async fn test_submissions_filtered() {
        contract::submissions_filtered(&repo().await).await;
    }

    #[tokio::test]
    async fn test_cascades() {
        contract::cascades(&repo().await).await;
    }

    #[tokio::test]
    async fn test_ping() {
        let repo = repo().await;
        assert_eq!(repo.backend(), "sqlite");
        repo.ping().await.unwrap();
    }

    #[tokio::test]
    async fn test_schema_is_idempotent() {
        let repo = repo().await;
        repo.init_schema().await.unwrap();
    }

    #[tokio::test]
    async fn test_form_requires_existing_client() {
        let repo = repo().await;
        let orphan = Form::new(Uuid::new_v4(), "Orphan".into(), None, "orphan".into());
        assert!(matches!(repo.insert_form(&orphan).await, Err(RepositoryError::NotFound(_))));
    }
}
