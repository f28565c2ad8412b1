use chrono::{DateTime, Utc};
use quadra_core::models::{Answer, SurveyResponse};
use quadra_core::scoring::{Band, ScoreCard};
use quadra_core::AppError;
use serde::Serialize;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

const RESPONSE_COLUMNS: &str = "id, survey_id, employee_id, org_id, department_id, answers, \
     present_creativity_total, present_morality_total, \
     present_creativity_percentage, present_morality_percentage, \
     present_creativity_band, present_morality_band, \
     future_creativity_total, future_morality_total, \
     future_creativity_percentage, future_morality_percentage, \
     future_creativity_band, future_morality_band, \
     is_draft, submitted_at";

/// Row shape: answers live in a jsonb column.
#[derive(sqlx::FromRow)]
struct ResponseRow {
    id: Uuid,
    survey_id: Uuid,
    employee_id: Uuid,
    org_id: Uuid,
    department_id: Option<Uuid>,
    answers: Json<Vec<Answer>>,
    present_creativity_total: i32,
    present_morality_total: i32,
    present_creativity_percentage: f64,
    present_morality_percentage: f64,
    present_creativity_band: Band,
    present_morality_band: Band,
    future_creativity_total: i32,
    future_morality_total: i32,
    future_creativity_percentage: f64,
    future_morality_percentage: f64,
    future_creativity_band: Band,
    future_morality_band: Band,
    is_draft: bool,
    submitted_at: DateTime<Utc>,
}

impl From<ResponseRow> for SurveyResponse {
    fn from(row: ResponseRow) -> Self {
        SurveyResponse {
            id: row.id,
            survey_id: row.survey_id,
            employee_id: row.employee_id,
            org_id: row.org_id,
            department_id: row.department_id,
            answers: row.answers.0,
            present_creativity_total: row.present_creativity_total,
            present_morality_total: row.present_morality_total,
            present_creativity_percentage: row.present_creativity_percentage,
            present_morality_percentage: row.present_morality_percentage,
            present_creativity_band: row.present_creativity_band,
            present_morality_band: row.present_morality_band,
            future_creativity_total: row.future_creativity_total,
            future_morality_total: row.future_morality_total,
            future_creativity_percentage: row.future_creativity_percentage,
            future_morality_percentage: row.future_morality_percentage,
            future_creativity_band: row.future_creativity_band,
            future_morality_band: row.future_morality_band,
            is_draft: row.is_draft,
            submitted_at: row.submitted_at,
        }
    }
}

/// Response joined with employee, survey, and department names.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseWithContext {
    #[serde(flatten)]
    pub response: SurveyResponse,
    pub employee_name: Option<String>,
    pub employee_email: Option<String>,
    pub survey_title: Option<String>,
    pub department_name: Option<String>,
}

#[derive(sqlx::FromRow)]
struct ResponseContextRow {
    #[sqlx(flatten)]
    row: ResponseRow,
    employee_name: Option<String>,
    employee_email: Option<String>,
    survey_title: Option<String>,
    department_name: Option<String>,
}

impl From<ResponseContextRow> for ResponseWithContext {
    fn from(row: ResponseContextRow) -> Self {
        ResponseWithContext {
            response: row.row.into(),
            employee_name: row.employee_name,
            employee_email: row.employee_email,
            survey_title: row.survey_title,
            department_name: row.department_name,
        }
    }
}

fn context_select(filter: &str) -> String {
    format!(
        r#"
        SELECT r.id, r.survey_id, r.employee_id, r.org_id, r.department_id, r.answers,
               r.present_creativity_total, r.present_morality_total,
               r.present_creativity_percentage, r.present_morality_percentage,
               r.present_creativity_band, r.present_morality_band,
               r.future_creativity_total, r.future_morality_total,
               r.future_creativity_percentage, r.future_morality_percentage,
               r.future_creativity_band, r.future_morality_band,
               r.is_draft, r.submitted_at,
               e.name AS employee_name,
               e.email AS employee_email,
               s.title AS survey_title,
               d.name AS department_name
        FROM survey_responses r
        LEFT JOIN employees e ON e.id = r.employee_id
        LEFT JOIN surveys s ON s.id = r.survey_id
        LEFT JOIN departments d ON d.id = r.department_id
        {}
        "#,
        filter
    )
}

/// Repository for survey responses. Draft and final submission share one row
/// per (survey, employee); both paths are upserts.
#[derive(Clone)]
pub struct ResponseRepository {
    pool: PgPool,
}

impl ResponseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self), fields(db.table = "survey_responses", db.operation = "select"))]
    pub async fn find(
        &self,
        survey_id: Uuid,
        employee_id: Uuid,
    ) -> Result<Option<SurveyResponse>, AppError> {
        let row = sqlx::query_as::<Postgres, ResponseRow>(&format!(
            "SELECT {} FROM survey_responses WHERE survey_id = $1 AND employee_id = $2",
            RESPONSE_COLUMNS
        ))
        .bind(survey_id)
        .bind(employee_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    /// Save a draft: selections only, zeroed marks, assignment moves to
    /// in_progress. One transaction.
    #[tracing::instrument(skip(self, answers), fields(db.table = "survey_responses", db.operation = "upsert"))]
    pub async fn save_draft(
        &self,
        survey_id: Uuid,
        employee_id: Uuid,
        org_id: Uuid,
        department_id: Option<Uuid>,
        answers: &[Answer],
    ) -> Result<SurveyResponse, AppError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<Postgres, ResponseRow>(&format!(
            r#"
            INSERT INTO survey_responses (survey_id, employee_id, org_id, department_id, answers, is_draft)
            VALUES ($1, $2, $3, $4, $5, TRUE)
            ON CONFLICT (survey_id, employee_id) DO UPDATE
            SET answers = EXCLUDED.answers, is_draft = TRUE
            RETURNING {}
            "#,
            RESPONSE_COLUMNS
        ))
        .bind(survey_id)
        .bind(employee_id)
        .bind(org_id)
        .bind(department_id)
        .bind(Json(answers))
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE survey_assignments SET status = 'in_progress'
            WHERE survey_id = $1 AND employee_id = $2 AND status = 'pending'
            "#,
        )
        .bind(survey_id)
        .bind(employee_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row.into())
    }

    /// Final submission: overwrite the row with marked answers and computed
    /// scores, and complete the assignment. One transaction; idempotent per
    /// (survey, employee) — resubmission overwrites.
    #[tracing::instrument(skip(self, answers, card), fields(db.table = "survey_responses", db.operation = "upsert"))]
    pub async fn submit(
        &self,
        survey_id: Uuid,
        employee_id: Uuid,
        org_id: Uuid,
        department_id: Option<Uuid>,
        answers: &[Answer],
        card: &ScoreCard,
    ) -> Result<SurveyResponse, AppError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<Postgres, ResponseRow>(&format!(
            r#"
            INSERT INTO survey_responses
                (survey_id, employee_id, org_id, department_id, answers,
                 present_creativity_total, present_morality_total,
                 present_creativity_percentage, present_morality_percentage,
                 present_creativity_band, present_morality_band,
                 future_creativity_total, future_morality_total,
                 future_creativity_percentage, future_morality_percentage,
                 future_creativity_band, future_morality_band,
                 is_draft, submitted_at)
            VALUES ($1, $2, $3, $4, $5,
                    $6, $7, $8, $9, $10, $11,
                    $12, $13, $14, $15, $16, $17,
                    FALSE, NOW())
            ON CONFLICT (survey_id, employee_id) DO UPDATE
            SET answers = EXCLUDED.answers,
                present_creativity_total = EXCLUDED.present_creativity_total,
                present_morality_total = EXCLUDED.present_morality_total,
                present_creativity_percentage = EXCLUDED.present_creativity_percentage,
                present_morality_percentage = EXCLUDED.present_morality_percentage,
                present_creativity_band = EXCLUDED.present_creativity_band,
                present_morality_band = EXCLUDED.present_morality_band,
                future_creativity_total = EXCLUDED.future_creativity_total,
                future_morality_total = EXCLUDED.future_morality_total,
                future_creativity_percentage = EXCLUDED.future_creativity_percentage,
                future_morality_percentage = EXCLUDED.future_morality_percentage,
                future_creativity_band = EXCLUDED.future_creativity_band,
                future_morality_band = EXCLUDED.future_morality_band,
                is_draft = FALSE,
                submitted_at = NOW()
            RETURNING {}
            "#,
            RESPONSE_COLUMNS
        ))
        .bind(survey_id)
        .bind(employee_id)
        .bind(org_id)
        .bind(department_id)
        .bind(Json(answers))
        .bind(card.present.creativity_total)
        .bind(card.present.morality_total)
        .bind(card.present.creativity_percentage)
        .bind(card.present.morality_percentage)
        .bind(card.present.creativity_band)
        .bind(card.present.morality_band)
        .bind(card.future.creativity_total)
        .bind(card.future.morality_total)
        .bind(card.future.creativity_percentage)
        .bind(card.future.morality_percentage)
        .bind(card.future.creativity_band)
        .bind(card.future.morality_band)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE survey_assignments SET status = 'completed', completed_at = NOW()
            WHERE survey_id = $1 AND employee_id = $2
            "#,
        )
        .bind(survey_id)
        .bind(employee_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row.into())
    }

    /// Submitted responses of a survey with joined context, for reports.
    #[tracing::instrument(skip(self), fields(db.table = "survey_responses", db.operation = "select"))]
    pub async fn list_submitted_by_survey_with_context(
        &self,
        survey_id: Uuid,
    ) -> Result<Vec<ResponseWithContext>, AppError> {
        let rows = sqlx::query_as::<Postgres, ResponseContextRow>(&context_select(
            "WHERE r.survey_id = $1 AND r.is_draft = FALSE ORDER BY r.submitted_at DESC",
        ))
        .bind(survey_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Submitted responses of an org with joined context, newest first.
    #[tracing::instrument(skip(self), fields(db.table = "survey_responses", db.operation = "select"))]
    pub async fn list_submitted_by_org_with_context(
        &self,
        org_id: Uuid,
    ) -> Result<Vec<ResponseWithContext>, AppError> {
        let rows = sqlx::query_as::<Postgres, ResponseContextRow>(&context_select(
            "WHERE r.org_id = $1 AND r.is_draft = FALSE ORDER BY r.submitted_at DESC",
        ))
        .bind(org_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// One employee's submitted responses with survey titles, newest first.
    #[tracing::instrument(skip(self), fields(db.table = "survey_responses", db.operation = "select"))]
    pub async fn list_submitted_by_employee(
        &self,
        employee_id: Uuid,
    ) -> Result<Vec<ResponseWithContext>, AppError> {
        let rows = sqlx::query_as::<Postgres, ResponseContextRow>(&context_select(
            "WHERE r.employee_id = $1 AND r.is_draft = FALSE ORDER BY r.submitted_at DESC",
        ))
        .bind(employee_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[tracing::instrument(skip(self), fields(db.table = "survey_responses", db.operation = "select", db.record_id = %id))]
    pub async fn get_with_context(&self, id: Uuid) -> Result<Option<ResponseWithContext>, AppError> {
        let row = sqlx::query_as::<Postgres, ResponseContextRow>(&context_select(
            "WHERE r.id = $1",
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    /// Most recent submissions across the platform (admin dashboard).
    #[tracing::instrument(skip(self), fields(db.table = "survey_responses", db.operation = "select"))]
    pub async fn recent_submissions(
        &self,
        limit: i64,
    ) -> Result<Vec<ResponseWithContext>, AppError> {
        let rows = sqlx::query_as::<Postgres, ResponseContextRow>(&context_select(
            "WHERE r.is_draft = FALSE ORDER BY r.submitted_at DESC LIMIT $1",
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
