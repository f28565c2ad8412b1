use quadra_core::models::Department;
use quadra_core::AppError;
use serde::Serialize;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

const DEPT_COLUMNS: &str = "id, name, org_id, head_id, created_at";

/// Employee tallies per department, split by invite status.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DepartmentEmployeeCounts {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub department: Department,
    pub employee_count: i64,
    pub active_count: i64,
    pub pending_count: i64,
}

/// Repository for departments (org-scoped).
#[derive(Clone)]
pub struct DepartmentRepository {
    pool: PgPool,
}

impl DepartmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self), fields(db.table = "departments", db.operation = "insert"))]
    pub async fn create(&self, org_id: Uuid, name: &str) -> Result<Department, AppError> {
        let dept = sqlx::query_as::<Postgres, Department>(&format!(
            "INSERT INTO departments (name, org_id) VALUES ($1, $2) RETURNING {}",
            DEPT_COLUMNS
        ))
        .bind(name)
        .bind(org_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(dept)
    }

    #[tracing::instrument(skip(self), fields(db.table = "departments", db.operation = "select", db.record_id = %id))]
    pub async fn get(&self, org_id: Uuid, id: Uuid) -> Result<Option<Department>, AppError> {
        let dept = sqlx::query_as::<Postgres, Department>(&format!(
            "SELECT {} FROM departments WHERE id = $1 AND org_id = $2",
            DEPT_COLUMNS
        ))
        .bind(id)
        .bind(org_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(dept)
    }

    #[tracing::instrument(skip(self), fields(db.table = "departments", db.operation = "select"))]
    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Department>, AppError> {
        let dept = sqlx::query_as::<Postgres, Department>(&format!(
            "SELECT {} FROM departments WHERE id = $1",
            DEPT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(dept)
    }

    #[tracing::instrument(skip(self), fields(db.table = "departments", db.operation = "select"))]
    pub async fn list_by_org(&self, org_id: Uuid) -> Result<Vec<Department>, AppError> {
        let depts = sqlx::query_as::<Postgres, Department>(&format!(
            "SELECT {} FROM departments WHERE org_id = $1 ORDER BY created_at",
            DEPT_COLUMNS
        ))
        .bind(org_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(depts)
    }

    /// Departments of the org with per-status employee counts
    /// (user-role employees only).
    #[tracing::instrument(skip(self), fields(db.table = "departments", db.operation = "select"))]
    pub async fn list_with_counts(
        &self,
        org_id: Uuid,
    ) -> Result<Vec<DepartmentEmployeeCounts>, AppError> {
        let rows = sqlx::query_as::<Postgres, DepartmentEmployeeCounts>(
            r#"
            SELECT d.id, d.name, d.org_id, d.head_id, d.created_at,
                   COUNT(e.id) FILTER (WHERE e.role = 'user') AS employee_count,
                   COUNT(e.id) FILTER (WHERE e.role = 'user' AND e.invite_status = 'accepted') AS active_count,
                   COUNT(e.id) FILTER (WHERE e.role = 'user' AND e.invite_status = 'pending') AS pending_count
            FROM departments d
            LEFT JOIN employees e ON e.department_id = d.id
            WHERE d.org_id = $1
            GROUP BY d.id
            ORDER BY d.created_at
            "#,
        )
        .bind(org_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
