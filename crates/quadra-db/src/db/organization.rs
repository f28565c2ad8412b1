use chrono::{Duration, Utc};
use quadra_core::constants::INVITE_TTL_DAYS;
use quadra_core::models::{InviteStatus, Organization, OrgStatus, Role};
use quadra_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

const ORG_COLUMNS: &str = "id, name, ceo_email, ceo_id, invite_token, status, created_at";

/// Repository for organizations and the CEO-invite provisioning flow.
#[derive(Clone)]
pub struct OrganizationRepository {
    pool: PgPool,
}

impl OrganizationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create an organization together with its placeholder CEO employee and
    /// invite log, all sharing one fresh token, in a single transaction.
    ///
    /// A pending invite for the same email is superseded first: prior sent
    /// invite logs are marked expired (kept for audit), the placeholder
    /// employee and any pending organization rows are removed.
    #[tracing::instrument(skip(self), fields(db.table = "organizations", db.operation = "insert"))]
    pub async fn provision(
        &self,
        name: &str,
        ceo_email: &str,
        invited_by: Uuid,
        invite_token: Uuid,
    ) -> Result<Organization, AppError> {
        let mut tx = self.pool.begin().await?;

        let superseded = sqlx::query(
            "UPDATE invite_logs SET status = 'expired' WHERE email = $1 AND status = 'sent'",
        )
        .bind(ceo_email)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if superseded > 0 {
            tracing::info!(email = %ceo_email, superseded, "Superseded prior pending invites");
            sqlx::query(
                "DELETE FROM employees WHERE email = $1 AND invite_status = 'pending'",
            )
            .bind(ceo_email)
            .execute(&mut *tx)
            .await?;
            sqlx::query(
                "DELETE FROM organizations WHERE ceo_email = $1 AND status = 'pending'",
            )
            .bind(ceo_email)
            .execute(&mut *tx)
            .await?;
        }

        let org = sqlx::query_as::<Postgres, Organization>(&format!(
            r#"
            INSERT INTO organizations (name, ceo_email, invite_token, status)
            VALUES ($1, $2, $3, 'pending')
            RETURNING {}
            "#,
            ORG_COLUMNS
        ))
        .bind(name)
        .bind(ceo_email)
        .bind(invite_token)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO employees (name, email, role, org_id, invite_token, invite_status)
            VALUES ('CEO', $1, $2, $3, $4, $5)
            "#,
        )
        .bind(ceo_email)
        .bind(Role::Ceo)
        .bind(org.id)
        .bind(invite_token)
        .bind(InviteStatus::Pending)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO invite_logs (email, org_id, invited_by, role, token, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(ceo_email)
        .bind(org.id)
        .bind(invited_by)
        .bind(Role::Ceo)
        .bind(invite_token)
        .bind(Utc::now() + Duration::days(INVITE_TTL_DAYS))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(org)
    }

    /// Rotate the CEO invite token and refresh its expiry. Fails with 400
    /// once the CEO has accepted.
    #[tracing::instrument(skip(self), fields(db.table = "organizations", db.operation = "update", db.record_id = %org_id))]
    pub async fn rotate_ceo_invite(
        &self,
        org_id: Uuid,
        new_token: Uuid,
    ) -> Result<Organization, AppError> {
        let org = self
            .get(org_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Organization not found".to_string()))?;

        if org.status == OrgStatus::Active {
            return Err(AppError::Conflict(
                "CEO has already accepted the invite".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            UPDATE invite_logs
            SET token = $2, sent_at = NOW(), expires_at = $3, status = 'sent', clicked_at = NULL
            WHERE org_id = $1 AND role = 'ceo' AND status IN ('sent', 'clicked')
            "#,
        )
        .bind(org_id)
        .bind(new_token)
        .bind(Utc::now() + Duration::days(INVITE_TTL_DAYS))
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE employees SET invite_token = $2 WHERE org_id = $1 AND role = 'ceo'")
            .bind(org_id)
            .bind(new_token)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE organizations SET invite_token = $2 WHERE id = $1")
            .bind(org_id)
            .bind(new_token)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(org)
    }

    #[tracing::instrument(skip(self), fields(db.table = "organizations", db.operation = "select", db.record_id = %id))]
    pub async fn get(&self, id: Uuid) -> Result<Option<Organization>, AppError> {
        let org = sqlx::query_as::<Postgres, Organization>(&format!(
            "SELECT {} FROM organizations WHERE id = $1",
            ORG_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(org)
    }

    #[tracing::instrument(skip(self), fields(db.table = "organizations", db.operation = "select"))]
    pub async fn list_all(&self) -> Result<Vec<Organization>, AppError> {
        let orgs = sqlx::query_as::<Postgres, Organization>(&format!(
            "SELECT {} FROM organizations ORDER BY created_at DESC",
            ORG_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(orgs)
    }
}
