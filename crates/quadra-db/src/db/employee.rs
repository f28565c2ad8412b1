use chrono::{Duration, Utc};
use quadra_core::constants::INVITE_TTL_DAYS;
use quadra_core::models::{Employee, InviteLog, InviteStatus, Role};
use quadra_core::AppError;
use serde::Serialize;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

const EMPLOYEE_COLUMNS: &str = "id, name, email, password_hash, google_id, role, org_id, \
     department_id, invite_token, invite_status, accepted_at, is_active, last_login, created_at";

/// Employee joined with its department name.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct EmployeeWithDepartment {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub employee: Employee,
    pub department_name: Option<String>,
}

/// Repository for the employee directory and the invite-acceptance state
/// machine.
#[derive(Clone)]
pub struct EmployeeRepository {
    pool: PgPool,
}

impl EmployeeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self), fields(db.table = "employees", db.operation = "select", db.record_id = %id))]
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Employee>, AppError> {
        let employee = sqlx::query_as::<Postgres, Employee>(&format!(
            "SELECT {} FROM employees WHERE id = $1",
            EMPLOYEE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(employee)
    }

    /// Case-insensitive email lookup; emails are stored lowercase but older
    /// rows may predate that convention.
    #[tracing::instrument(skip(self), fields(db.table = "employees", db.operation = "select"))]
    pub async fn find_by_email(&self, email: &str) -> Result<Option<Employee>, AppError> {
        let employee = sqlx::query_as::<Postgres, Employee>(&format!(
            "SELECT {} FROM employees WHERE LOWER(email) = LOWER($1)",
            EMPLOYEE_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(employee)
    }

    /// Does this email already belong to a verified account?
    #[tracing::instrument(skip(self), fields(db.table = "employees", db.operation = "select"))]
    pub async fn find_accepted_by_email(&self, email: &str) -> Result<Option<Employee>, AppError> {
        let employee = sqlx::query_as::<Postgres, Employee>(&format!(
            "SELECT {} FROM employees WHERE LOWER(email) = LOWER($1) AND invite_status = 'accepted'",
            EMPLOYEE_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(employee)
    }

    /// Lazily materialize an employee from a live invite on first OTP login.
    /// Role, org and department are copied from the invite and locked.
    #[tracing::instrument(skip(self, invite), fields(db.table = "employees", db.operation = "insert"))]
    pub async fn materialize_from_invite(&self, invite: &InviteLog) -> Result<Employee, AppError> {
        let employee = sqlx::query_as::<Postgres, Employee>(&format!(
            r#"
            INSERT INTO employees (name, email, role, org_id, department_id, invite_token, invite_status)
            VALUES ('Employee', LOWER($1), $2, $3, $4, $5, 'pending')
            RETURNING {}
            "#,
            EMPLOYEE_COLUMNS
        ))
        .bind(&invite.email)
        .bind(invite.role)
        .bind(invite.org_id)
        .bind(invite.department_id)
        .bind(invite.token)
        .fetch_one(&self.pool)
        .await?;
        Ok(employee)
    }

    /// Create a placeholder user employee and its invite log in one
    /// transaction, sharing the given token.
    #[tracing::instrument(skip(self), fields(db.table = "employees", db.operation = "insert"))]
    pub async fn invite_user(
        &self,
        name: &str,
        email: &str,
        org_id: Uuid,
        department_id: Option<Uuid>,
        invited_by: Uuid,
        token: Uuid,
    ) -> Result<Employee, AppError> {
        let mut tx = self.pool.begin().await?;

        let employee = sqlx::query_as::<Postgres, Employee>(&format!(
            r#"
            INSERT INTO employees (name, email, role, org_id, department_id, invite_token, invite_status)
            VALUES ($1, LOWER($2), 'user', $3, $4, $5, 'pending')
            RETURNING {}
            "#,
            EMPLOYEE_COLUMNS
        ))
        .bind(name)
        .bind(email)
        .bind(org_id)
        .bind(department_id)
        .bind(token)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO invite_logs (email, org_id, department_id, invited_by, role, token, expires_at)
            VALUES (LOWER($1), $2, $3, $4, 'user', $5, $6)
            "#,
        )
        .bind(email)
        .bind(org_id)
        .bind(department_id)
        .bind(invited_by)
        .bind(token)
        .bind(Utc::now() + Duration::days(INVITE_TTL_DAYS))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(employee)
    }

    /// Rotate a pending employee's invite token and refresh the invite log.
    #[tracing::instrument(skip(self), fields(db.table = "employees", db.operation = "update", db.record_id = %employee_id))]
    pub async fn rotate_user_invite(
        &self,
        employee_id: Uuid,
        email: &str,
        token: Uuid,
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE employees SET invite_token = $2 WHERE id = $1")
            .bind(employee_id)
            .bind(token)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            UPDATE invite_logs
            SET token = $2, sent_at = NOW(), expires_at = $3, status = 'sent', clicked_at = NULL
            WHERE LOWER(email) = LOWER($1) AND status IN ('sent', 'clicked')
            "#,
        )
        .bind(email)
        .bind(token)
        .bind(Utc::now() + Duration::days(INVITE_TTL_DAYS))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// First-time email verification: flip the employee and its invite logs
    /// to accepted, backfill department survey assignments, and activate the
    /// organization when a CEO verifies. One transaction.
    ///
    /// Idempotent: a second call finds nothing pending and changes nothing.
    #[tracing::instrument(skip(self), fields(db.table = "employees", db.operation = "update", db.record_id = %employee_id))]
    pub async fn accept_on_verification(&self, employee_id: Uuid) -> Result<Employee, AppError> {
        let mut tx = self.pool.begin().await?;

        let employee = sqlx::query_as::<Postgres, Employee>(&format!(
            r#"
            UPDATE employees
            SET invite_status = 'accepted', accepted_at = NOW()
            WHERE id = $1 AND invite_status = 'pending'
            RETURNING {}
            "#,
            EMPLOYEE_COLUMNS
        ))
        .bind(employee_id)
        .fetch_optional(&mut *tx)
        .await?;

        let employee = match employee {
            Some(employee) => {
                Self::finish_acceptance(&mut tx, &employee).await?;
                employee
            }
            // Already accepted earlier; nothing to transition.
            None => sqlx::query_as::<Postgres, Employee>(&format!(
                "SELECT {} FROM employees WHERE id = $1",
                EMPLOYEE_COLUMNS
            ))
            .bind(employee_id)
            .fetch_one(&mut *tx)
            .await?,
        };

        tx.commit().await?;
        Ok(employee)
    }

    /// Signup completion: record name and password hash, mark accepted, and
    /// run the same acceptance side effects. Creates the employee when the
    /// invite was never materialized.
    #[tracing::instrument(skip(self, password_hash), fields(db.table = "employees", db.operation = "update"))]
    pub async fn complete_signup(
        &self,
        invite: &InviteLog,
        name: &str,
        password_hash: &str,
    ) -> Result<Employee, AppError> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query_as::<Postgres, Employee>(&format!(
            "SELECT {} FROM employees WHERE LOWER(email) = LOWER($1)",
            EMPLOYEE_COLUMNS
        ))
        .bind(&invite.email)
        .fetch_optional(&mut *tx)
        .await?;

        let was_pending = existing
            .as_ref()
            .map(|e| e.invite_status == InviteStatus::Pending)
            .unwrap_or(true);

        let employee = match existing {
            Some(existing) => {
                sqlx::query_as::<Postgres, Employee>(&format!(
                    r#"
                    UPDATE employees
                    SET name = $2, password_hash = $3, invite_status = 'accepted',
                        accepted_at = NOW(), invite_token = NULL
                    WHERE id = $1
                    RETURNING {}
                    "#,
                    EMPLOYEE_COLUMNS
                ))
                .bind(existing.id)
                .bind(name)
                .bind(password_hash)
                .fetch_one(&mut *tx)
                .await?
            }
            None => {
                sqlx::query_as::<Postgres, Employee>(&format!(
                    r#"
                    INSERT INTO employees
                        (name, email, password_hash, role, org_id, department_id,
                         invite_status, accepted_at)
                    VALUES ($1, LOWER($2), $3, $4, $5, $6, 'accepted', NOW())
                    RETURNING {}
                    "#,
                    EMPLOYEE_COLUMNS
                ))
                .bind(name)
                .bind(&invite.email)
                .bind(password_hash)
                .bind(invite.role)
                .bind(invite.org_id)
                .bind(invite.department_id)
                .fetch_one(&mut *tx)
                .await?
            }
        };

        if was_pending {
            Self::finish_acceptance(&mut tx, &employee).await?;
        }

        tx.commit().await?;
        Ok(employee)
    }

    /// Shared acceptance side effects: invite logs, catch-up enrollment,
    /// organization activation.
    async fn finish_acceptance(
        tx: &mut Transaction<'_, Postgres>,
        employee: &Employee,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE invite_logs
            SET status = 'accepted', accepted_at = NOW()
            WHERE LOWER(email) = LOWER($1) AND status IN ('sent', 'clicked')
            "#,
        )
        .bind(&employee.email)
        .execute(&mut **tx)
        .await?;

        // Catch-up enrollment: assignments for active surveys already rolled
        // out to this employee's department, skipping any that exist.
        if employee.role == Role::User {
            if let (Some(org_id), Some(department_id)) = (employee.org_id, employee.department_id) {
                let created = sqlx::query(
                    r#"
                    INSERT INTO survey_assignments (survey_id, org_id, department_id, employee_id, due_date)
                    SELECT DISTINCT s.id, $2, $3, $1, s.due_date
                    FROM surveys s
                    WHERE s.status = 'active'
                      AND EXISTS (
                          SELECT 1 FROM survey_assignments sa
                          WHERE sa.survey_id = s.id AND sa.department_id = $3
                      )
                    ON CONFLICT (survey_id, employee_id) DO NOTHING
                    "#,
                )
                .bind(employee.id)
                .bind(org_id)
                .bind(department_id)
                .execute(&mut **tx)
                .await?
                .rows_affected();

                if created > 0 {
                    tracing::info!(
                        employee_id = %employee.id,
                        created,
                        "Backfilled department survey assignments on acceptance"
                    );
                }
            }
        }

        if employee.role == Role::Ceo {
            if let Some(org_id) = employee.org_id {
                sqlx::query(
                    "UPDATE organizations SET ceo_id = $2, status = 'active' WHERE id = $1",
                )
                .bind(org_id)
                .bind(employee.id)
                .execute(&mut **tx)
                .await?;
            }
        }

        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "employees", db.operation = "update", db.record_id = %id))]
    pub async fn touch_last_login(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE employees SET last_login = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "employees", db.operation = "update", db.record_id = %id))]
    pub async fn set_google_identity(&self, id: Uuid, google_id: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE employees SET google_id = $2, last_login = NOW() WHERE id = $1")
            .bind(id)
            .bind(google_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// User-role employees of an org with department names, newest first.
    #[tracing::instrument(skip(self), fields(db.table = "employees", db.operation = "select"))]
    pub async fn list_users_by_org(
        &self,
        org_id: Uuid,
    ) -> Result<Vec<EmployeeWithDepartment>, AppError> {
        let rows = sqlx::query_as::<Postgres, EmployeeWithDepartment>(&format!(
            r#"
            SELECT {}, d.name AS department_name
            FROM employees e
            LEFT JOIN departments d ON d.id = e.department_id
            WHERE e.org_id = $1 AND e.role = 'user'
            ORDER BY e.created_at DESC
            "#,
            qualified_columns("e")
        ))
        .bind(org_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// All employees of an org (admin drill-down).
    #[tracing::instrument(skip(self), fields(db.table = "employees", db.operation = "select"))]
    pub async fn list_by_org(&self, org_id: Uuid) -> Result<Vec<Employee>, AppError> {
        let rows = sqlx::query_as::<Postgres, Employee>(&format!(
            "SELECT {} FROM employees WHERE org_id = $1 ORDER BY created_at DESC",
            EMPLOYEE_COLUMNS
        ))
        .bind(org_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// User-role employees of a department, regardless of invite status.
    #[tracing::instrument(skip(self), fields(db.table = "employees", db.operation = "select"))]
    pub async fn list_users_by_department(
        &self,
        department_id: Uuid,
    ) -> Result<Vec<Employee>, AppError> {
        let rows = sqlx::query_as::<Postgres, Employee>(&format!(
            "SELECT {} FROM employees WHERE department_id = $1 AND role = 'user' ORDER BY created_at",
            EMPLOYEE_COLUMNS
        ))
        .bind(department_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    #[tracing::instrument(skip(self), fields(db.table = "employees", db.operation = "select", db.record_id = %id))]
    pub async fn get_user_in_org(
        &self,
        org_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Employee>, AppError> {
        let employee = sqlx::query_as::<Postgres, Employee>(&format!(
            "SELECT {} FROM employees WHERE id = $1 AND org_id = $2 AND role = 'user'",
            EMPLOYEE_COLUMNS
        ))
        .bind(id)
        .bind(org_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(employee)
    }

    /// Remove an employee and every dependent row (assignments, responses,
    /// invite logs) in one transaction.
    #[tracing::instrument(skip(self), fields(db.table = "employees", db.operation = "delete", db.record_id = %id))]
    pub async fn delete_cascade(&self, id: Uuid, email: &str) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM survey_assignments WHERE employee_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM survey_responses WHERE employee_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM invite_logs WHERE LOWER(email) = LOWER($1)")
            .bind(email)
            .execute(&mut *tx)
            .await?;
        let deleted = sqlx::query("DELETE FROM employees WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        Ok(deleted > 0)
    }

    /// Seed the platform admin on startup when configured and absent.
    #[tracing::instrument(skip(self), fields(db.table = "employees", db.operation = "insert"))]
    pub async fn ensure_admin(&self, name: &str, email: &str) -> Result<(), AppError> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO employees (name, email, role, invite_status, accepted_at)
            VALUES ($1, LOWER($2), 'admin', 'accepted', NOW())
            ON CONFLICT (email) DO NOTHING
            "#,
        )
        .bind(name)
        .bind(email)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if inserted > 0 {
            tracing::info!(email = %email, "Seeded platform admin account");
        }
        Ok(())
    }
}

/// Column list qualified with a table alias, for join queries.
fn qualified_columns(alias: &str) -> String {
    EMPLOYEE_COLUMNS
        .split(", ")
        .map(|c| format!("{}.{}", alias, c.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}
