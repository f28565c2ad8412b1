use quadra_core::AppError;
use serde::Serialize;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

/// Per-organization tallies.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrgCounts {
    pub employees: i64,
    pub departments: i64,
    pub surveys: i64,
    pub assignments: i64,
    pub completed: i64,
}

/// Platform-wide tallies (admin analytics).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct GlobalCounts {
    pub organizations: i64,
    pub active_organizations: i64,
    pub employees: i64,
    pub non_admin_employees: i64,
    pub templates: i64,
    pub surveys: i64,
    pub responses: i64,
    pub assignments: i64,
    pub completed: i64,
}

/// Per-department tallies.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DepartmentCounts {
    pub employees: i64,
    pub accepted_employees: i64,
    pub assignments: i64,
    pub completed: i64,
}

/// Per-survey tallies.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SurveyCounts {
    pub assignments: i64,
    pub completed: i64,
}

/// One day in the submission trend.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TrendPoint {
    pub date: String,
    pub count: i64,
}

/// Aggregate count/ratio queries. Everything is recomputed from current
/// collection state per request; there is no pre-aggregation or caching.
#[derive(Clone)]
pub struct AnalyticsRepository {
    pool: PgPool,
}

impl AnalyticsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self), fields(db.operation = "select"))]
    pub async fn global_counts(&self) -> Result<GlobalCounts, AppError> {
        let counts = sqlx::query_as::<Postgres, GlobalCounts>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM organizations) AS organizations,
                (SELECT COUNT(*) FROM organizations WHERE status = 'active') AS active_organizations,
                (SELECT COUNT(*) FROM employees) AS employees,
                (SELECT COUNT(*) FROM employees WHERE role <> 'admin') AS non_admin_employees,
                (SELECT COUNT(*) FROM surveys WHERE is_template = TRUE) AS templates,
                (SELECT COUNT(*) FROM surveys WHERE is_template = FALSE) AS surveys,
                (SELECT COUNT(*) FROM survey_responses WHERE is_draft = FALSE) AS responses,
                (SELECT COUNT(*) FROM survey_assignments) AS assignments,
                (SELECT COUNT(*) FROM survey_assignments WHERE status = 'completed') AS completed
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(counts)
    }

    /// User-role employee, department, survey and assignment tallies for one
    /// organization.
    #[tracing::instrument(skip(self), fields(db.operation = "select"))]
    pub async fn org_counts(&self, org_id: Uuid) -> Result<OrgCounts, AppError> {
        let counts = sqlx::query_as::<Postgres, OrgCounts>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM employees WHERE org_id = $1 AND role = 'user') AS employees,
                (SELECT COUNT(*) FROM departments WHERE org_id = $1) AS departments,
                (SELECT COUNT(*) FROM surveys WHERE org_id = $1 AND is_template = FALSE) AS surveys,
                (SELECT COUNT(*) FROM survey_assignments WHERE org_id = $1) AS assignments,
                (SELECT COUNT(*) FROM survey_assignments WHERE org_id = $1 AND status = 'completed') AS completed
            "#,
        )
        .bind(org_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(counts)
    }

    #[tracing::instrument(skip(self), fields(db.operation = "select"))]
    pub async fn department_counts(
        &self,
        department_id: Uuid,
    ) -> Result<DepartmentCounts, AppError> {
        let counts = sqlx::query_as::<Postgres, DepartmentCounts>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM employees WHERE department_id = $1) AS employees,
                (SELECT COUNT(*) FROM employees WHERE department_id = $1 AND invite_status = 'accepted') AS accepted_employees,
                (SELECT COUNT(*) FROM survey_assignments WHERE department_id = $1) AS assignments,
                (SELECT COUNT(*) FROM survey_assignments WHERE department_id = $1 AND status = 'completed') AS completed
            "#,
        )
        .bind(department_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(counts)
    }

    #[tracing::instrument(skip(self), fields(db.operation = "select"))]
    pub async fn survey_counts(&self, survey_id: Uuid) -> Result<SurveyCounts, AppError> {
        let counts = sqlx::query_as::<Postgres, SurveyCounts>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM survey_assignments WHERE survey_id = $1) AS assignments,
                (SELECT COUNT(*) FROM survey_assignments WHERE survey_id = $1 AND status = 'completed') AS completed
            "#,
        )
        .bind(survey_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(counts)
    }

    /// Accepted/pending user-role employee tallies for one organization.
    #[tracing::instrument(skip(self), fields(db.operation = "select"))]
    pub async fn org_employee_split(&self, org_id: Uuid) -> Result<(i64, i64), AppError> {
        let split: (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FILTER (WHERE invite_status = 'accepted'),
                   COUNT(*) FILTER (WHERE invite_status = 'pending')
            FROM employees
            WHERE org_id = $1 AND role = 'user'
            "#,
        )
        .bind(org_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(split)
    }

    /// Daily submitted-response counts over the trailing window, zero-filled
    /// per UTC day including today.
    #[tracing::instrument(skip(self), fields(db.operation = "select"))]
    pub async fn completion_trend(
        &self,
        org_id: Uuid,
        days: i32,
    ) -> Result<Vec<TrendPoint>, AppError> {
        let points = sqlx::query_as::<Postgres, TrendPoint>(
            r#"
            SELECT to_char(day, 'YYYY-MM-DD') AS date,
                   COALESCE(counts.count, 0) AS count
            FROM generate_series(
                date_trunc('day', NOW()) - make_interval(days => $2 - 1),
                date_trunc('day', NOW()),
                '1 day'
            ) AS day
            LEFT JOIN (
                SELECT date_trunc('day', submitted_at) AS day, COUNT(*) AS count
                FROM survey_responses
                WHERE org_id = $1 AND is_draft = FALSE
                GROUP BY 1
            ) counts USING (day)
            ORDER BY day
            "#,
        )
        .bind(org_id)
        .bind(days)
        .fetch_all(&self.pool)
        .await?;
        Ok(points)
    }
}
