use chrono::{DateTime, Utc};
use quadra_core::models::{
    AssignmentStatus, Question, Survey, SurveyAssignment, SurveyStatus,
};
use quadra_core::AppError;
use serde::Serialize;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

const ASSIGNMENT_COLUMNS: &str = "id, survey_id, org_id, department_id, employee_id, status, \
     due_date, assigned_at, completed_at";

/// Assignment joined with employee and department context, for survey
/// analytics views.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AssignmentWithContext {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub assignment: SurveyAssignment,
    pub employee_name: Option<String>,
    pub employee_email: Option<String>,
    pub department_name: Option<String>,
}

/// Assignment plus its survey, one row per pair.
#[derive(sqlx::FromRow)]
struct AssignmentSurveyRow {
    id: Uuid,
    survey_id: Uuid,
    org_id: Uuid,
    department_id: Option<Uuid>,
    employee_id: Uuid,
    status: AssignmentStatus,
    due_date: Option<DateTime<Utc>>,
    assigned_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    s_title: String,
    s_description: Option<String>,
    s_org_id: Option<Uuid>,
    s_created_by: Uuid,
    s_questions: Json<Vec<Question>>,
    s_is_template: bool,
    s_due_date: Option<DateTime<Utc>>,
    s_status: SurveyStatus,
    s_created_at: DateTime<Utc>,
}

impl From<AssignmentSurveyRow> for (SurveyAssignment, Survey) {
    fn from(row: AssignmentSurveyRow) -> Self {
        (
            SurveyAssignment {
                id: row.id,
                survey_id: row.survey_id,
                org_id: row.org_id,
                department_id: row.department_id,
                employee_id: row.employee_id,
                status: row.status,
                due_date: row.due_date,
                assigned_at: row.assigned_at,
                completed_at: row.completed_at,
            },
            Survey {
                id: row.survey_id,
                title: row.s_title,
                description: row.s_description,
                org_id: row.s_org_id,
                created_by: row.s_created_by,
                questions: row.s_questions.0,
                is_template: row.s_is_template,
                due_date: row.s_due_date,
                status: row.s_status,
                created_at: row.s_created_at,
            },
        )
    }
}

/// Repository for survey assignments: fan-out, catch-up sync, and
/// per-employee views.
#[derive(Clone)]
pub struct AssignmentRepository {
    pool: PgPool,
}

impl AssignmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create an assignment unless one already exists for the pair. Returns
    /// the new assignment, or None when the unique key already held one.
    #[tracing::instrument(skip(self), fields(db.table = "survey_assignments", db.operation = "insert"))]
    pub async fn create_if_missing(
        &self,
        survey_id: Uuid,
        org_id: Uuid,
        department_id: Option<Uuid>,
        employee_id: Uuid,
        due_date: Option<DateTime<Utc>>,
    ) -> Result<Option<SurveyAssignment>, AppError> {
        let assignment = sqlx::query_as::<Postgres, SurveyAssignment>(&format!(
            r#"
            INSERT INTO survey_assignments (survey_id, org_id, department_id, employee_id, due_date)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (survey_id, employee_id) DO NOTHING
            RETURNING {}
            "#,
            ASSIGNMENT_COLUMNS
        ))
        .bind(survey_id)
        .bind(org_id)
        .bind(department_id)
        .bind(employee_id)
        .bind(due_date)
        .fetch_optional(&self.pool)
        .await?;
        Ok(assignment)
    }

    #[tracing::instrument(skip(self), fields(db.table = "survey_assignments", db.operation = "select"))]
    pub async fn find(
        &self,
        survey_id: Uuid,
        employee_id: Uuid,
    ) -> Result<Option<SurveyAssignment>, AppError> {
        let assignment = sqlx::query_as::<Postgres, SurveyAssignment>(&format!(
            "SELECT {} FROM survey_assignments WHERE survey_id = $1 AND employee_id = $2",
            ASSIGNMENT_COLUMNS
        ))
        .bind(survey_id)
        .bind(employee_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(assignment)
    }

    /// All assignments for an employee with their surveys, newest first.
    #[tracing::instrument(skip(self), fields(db.table = "survey_assignments", db.operation = "select"))]
    pub async fn list_for_employee(
        &self,
        employee_id: Uuid,
    ) -> Result<Vec<(SurveyAssignment, Survey)>, AppError> {
        let rows = sqlx::query_as::<Postgres, AssignmentSurveyRow>(
            r#"
            SELECT a.id, a.survey_id, a.org_id, a.department_id, a.employee_id, a.status,
                   a.due_date, a.assigned_at, a.completed_at,
                   s.title AS s_title, s.description AS s_description, s.org_id AS s_org_id,
                   s.created_by AS s_created_by, s.questions AS s_questions,
                   s.is_template AS s_is_template, s.due_date AS s_due_date,
                   s.status AS s_status, s.created_at AS s_created_at
            FROM survey_assignments a
            JOIN surveys s ON s.id = a.survey_id
            WHERE a.employee_id = $1
            ORDER BY a.assigned_at DESC
            "#,
        )
        .bind(employee_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Assignments of a survey with employee and department names.
    #[tracing::instrument(skip(self), fields(db.table = "survey_assignments", db.operation = "select"))]
    pub async fn list_by_survey_with_context(
        &self,
        survey_id: Uuid,
    ) -> Result<Vec<AssignmentWithContext>, AppError> {
        let rows = sqlx::query_as::<Postgres, AssignmentWithContext>(
            r#"
            SELECT a.id, a.survey_id, a.org_id, a.department_id, a.employee_id, a.status,
                   a.due_date, a.assigned_at, a.completed_at,
                   e.name AS employee_name,
                   e.email AS employee_email,
                   d.name AS department_name
            FROM survey_assignments a
            LEFT JOIN employees e ON e.id = a.employee_id
            LEFT JOIN departments d ON d.id = a.department_id
            WHERE a.survey_id = $1
            ORDER BY a.assigned_at
            "#,
        )
        .bind(survey_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Departments a survey has been rolled out to, with their names.
    #[tracing::instrument(skip(self), fields(db.table = "survey_assignments", db.operation = "select"))]
    pub async fn assigned_departments(
        &self,
        survey_id: Uuid,
    ) -> Result<Vec<(Uuid, String)>, AppError> {
        let rows: Vec<(Uuid, String)> = sqlx::query_as(
            r#"
            SELECT DISTINCT d.id, d.name
            FROM survey_assignments a
            JOIN departments d ON d.id = a.department_id
            WHERE a.survey_id = $1
            ORDER BY d.name
            "#,
        )
        .bind(survey_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Catch-up sync for an org: for every active survey, enroll employees
    /// added to its assigned departments after the fan-out. Returns how many
    /// assignments were created.
    #[tracing::instrument(skip(self), fields(db.table = "survey_assignments", db.operation = "insert"))]
    pub async fn sync_missing_for_org(&self, org_id: Uuid) -> Result<u64, AppError> {
        let created = sqlx::query(
            r#"
            INSERT INTO survey_assignments (survey_id, org_id, department_id, employee_id, due_date)
            SELECT DISTINCT s.id, $1, e.department_id, e.id, s.due_date
            FROM surveys s
            JOIN survey_assignments sa ON sa.survey_id = s.id
            JOIN employees e
              ON e.department_id = sa.department_id AND e.org_id = $1 AND e.role = 'user'
            WHERE s.org_id = $1 AND s.status = 'active' AND s.is_template = FALSE
            ON CONFLICT (survey_id, employee_id) DO NOTHING
            "#,
        )
        .bind(org_id)
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(created)
    }

}
