use chrono::{DateTime, Utc};
use quadra_core::models::{Question, Survey, SurveyStatus};
use quadra_core::AppError;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

const SURVEY_COLUMNS: &str =
    "id, title, description, org_id, created_by, questions, is_template, due_date, status, created_at";

/// Row shape: questions live in a jsonb column.
#[derive(sqlx::FromRow)]
struct SurveyRow {
    id: Uuid,
    title: String,
    description: Option<String>,
    org_id: Option<Uuid>,
    created_by: Uuid,
    questions: Json<Vec<Question>>,
    is_template: bool,
    due_date: Option<DateTime<Utc>>,
    status: SurveyStatus,
    created_at: DateTime<Utc>,
}

impl From<SurveyRow> for Survey {
    fn from(row: SurveyRow) -> Self {
        Survey {
            id: row.id,
            title: row.title,
            description: row.description,
            org_id: row.org_id,
            created_by: row.created_by,
            questions: row.questions.0,
            is_template: row.is_template,
            due_date: row.due_date,
            status: row.status,
            created_at: row.created_at,
        }
    }
}

/// Repository for survey templates and org survey instances.
#[derive(Clone)]
pub struct SurveyRepository {
    pool: PgPool,
}

impl SurveyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self, questions), fields(db.table = "surveys", db.operation = "insert"))]
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        title: &str,
        description: Option<&str>,
        org_id: Option<Uuid>,
        created_by: Uuid,
        questions: &[Question],
        is_template: bool,
        due_date: Option<DateTime<Utc>>,
    ) -> Result<Survey, AppError> {
        let row = sqlx::query_as::<Postgres, SurveyRow>(&format!(
            r#"
            INSERT INTO surveys (title, description, org_id, created_by, questions, is_template, due_date, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'draft')
            RETURNING {}
            "#,
            SURVEY_COLUMNS
        ))
        .bind(title)
        .bind(description)
        .bind(org_id)
        .bind(created_by)
        .bind(Json(questions))
        .bind(is_template)
        .bind(due_date)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    #[tracing::instrument(skip(self), fields(db.table = "surveys", db.operation = "select", db.record_id = %id))]
    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Survey>, AppError> {
        let row = sqlx::query_as::<Postgres, SurveyRow>(&format!(
            "SELECT {} FROM surveys WHERE id = $1",
            SURVEY_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    #[tracing::instrument(skip(self), fields(db.table = "surveys", db.operation = "select", db.record_id = %id))]
    pub async fn get_template(&self, id: Uuid) -> Result<Option<Survey>, AppError> {
        let row = sqlx::query_as::<Postgres, SurveyRow>(&format!(
            "SELECT {} FROM surveys WHERE id = $1 AND is_template = TRUE",
            SURVEY_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    #[tracing::instrument(skip(self), fields(db.table = "surveys", db.operation = "select"))]
    pub async fn list_templates(&self) -> Result<Vec<Survey>, AppError> {
        let rows = sqlx::query_as::<Postgres, SurveyRow>(&format!(
            "SELECT {} FROM surveys WHERE is_template = TRUE ORDER BY created_at DESC",
            SURVEY_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[tracing::instrument(skip(self, questions), fields(db.table = "surveys", db.operation = "update", db.record_id = %id))]
    pub async fn update_template(
        &self,
        id: Uuid,
        title: &str,
        description: Option<&str>,
        questions: &[Question],
    ) -> Result<Option<Survey>, AppError> {
        let row = sqlx::query_as::<Postgres, SurveyRow>(&format!(
            r#"
            UPDATE surveys SET title = $2, description = $3, questions = $4
            WHERE id = $1 AND is_template = TRUE
            RETURNING {}
            "#,
            SURVEY_COLUMNS
        ))
        .bind(id)
        .bind(title)
        .bind(description)
        .bind(Json(questions))
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    #[tracing::instrument(skip(self), fields(db.table = "surveys", db.operation = "delete", db.record_id = %id))]
    pub async fn delete_template(&self, id: Uuid) -> Result<bool, AppError> {
        let deleted = sqlx::query("DELETE FROM surveys WHERE id = $1 AND is_template = TRUE")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(deleted > 0)
    }

    /// Org survey (never a template), tenant-scoped.
    #[tracing::instrument(skip(self), fields(db.table = "surveys", db.operation = "select", db.record_id = %id))]
    pub async fn get_org_survey(&self, org_id: Uuid, id: Uuid) -> Result<Option<Survey>, AppError> {
        let row = sqlx::query_as::<Postgres, SurveyRow>(&format!(
            "SELECT {} FROM surveys WHERE id = $1 AND org_id = $2 AND is_template = FALSE",
            SURVEY_COLUMNS
        ))
        .bind(id)
        .bind(org_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    #[tracing::instrument(skip(self), fields(db.table = "surveys", db.operation = "select"))]
    pub async fn list_by_org(&self, org_id: Uuid) -> Result<Vec<Survey>, AppError> {
        let rows = sqlx::query_as::<Postgres, SurveyRow>(&format!(
            "SELECT {} FROM surveys WHERE org_id = $1 AND is_template = FALSE ORDER BY created_at DESC",
            SURVEY_COLUMNS
        ))
        .bind(org_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[tracing::instrument(skip(self), fields(db.table = "surveys", db.operation = "update", db.record_id = %id))]
    pub async fn set_status(&self, id: Uuid, status: SurveyStatus) -> Result<(), AppError> {
        sqlx::query("UPDATE surveys SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Delete a survey together with its assignments and responses.
    #[tracing::instrument(skip(self), fields(db.table = "surveys", db.operation = "delete", db.record_id = %id))]
    pub async fn delete_with_children(&self, id: Uuid) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM survey_assignments WHERE survey_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM survey_responses WHERE survey_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let deleted = sqlx::query("DELETE FROM surveys WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        Ok(deleted > 0)
    }
}
