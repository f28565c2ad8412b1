use quadra_core::models::InviteLog;
use quadra_core::AppError;
use serde::Serialize;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

const INVITE_COLUMNS: &str = "id, email, org_id, department_id, invited_by, role, token, status, \
     sent_at, clicked_at, accepted_at, expires_at";

/// Invite log joined with organization and inviter context.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct InviteWithContext {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub invite: InviteLog,
    pub org_name: Option<String>,
    pub invited_by_name: Option<String>,
    pub invited_by_email: Option<String>,
}

/// Repository for the invite log.
#[derive(Clone)]
pub struct InviteRepository {
    pool: PgPool,
}

impl InviteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Look up an invite that can still be used: status sent or clicked and
    /// not expired.
    #[tracing::instrument(skip(self), fields(db.table = "invite_logs", db.operation = "select"))]
    pub async fn find_live_by_token(&self, token: Uuid) -> Result<Option<InviteLog>, AppError> {
        let invite = sqlx::query_as::<Postgres, InviteLog>(&format!(
            r#"
            SELECT {} FROM invite_logs
            WHERE token = $1 AND status IN ('sent', 'clicked') AND expires_at > NOW()
            "#,
            INVITE_COLUMNS
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(invite)
    }

    /// Newest invite for an email, any status. Used to lazily materialize an
    /// employee on first OTP login.
    #[tracing::instrument(skip(self), fields(db.table = "invite_logs", db.operation = "select"))]
    pub async fn find_latest_by_email(&self, email: &str) -> Result<Option<InviteLog>, AppError> {
        let invite = sqlx::query_as::<Postgres, InviteLog>(&format!(
            r#"
            SELECT {} FROM invite_logs
            WHERE LOWER(email) = LOWER($1)
            ORDER BY sent_at DESC
            LIMIT 1
            "#,
            INVITE_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(invite)
    }

    /// Is there an outstanding (sent) invite for this email?
    #[tracing::instrument(skip(self), fields(db.table = "invite_logs", db.operation = "select"))]
    pub async fn find_sent_by_email(&self, email: &str) -> Result<Option<InviteLog>, AppError> {
        let invite = sqlx::query_as::<Postgres, InviteLog>(&format!(
            "SELECT {} FROM invite_logs WHERE LOWER(email) = LOWER($1) AND status = 'sent' LIMIT 1",
            INVITE_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(invite)
    }

    /// Track that the invite link was visited. Idempotent: only a sent
    /// invite transitions to clicked.
    #[tracing::instrument(skip(self), fields(db.table = "invite_logs", db.operation = "update", db.record_id = %id))]
    pub async fn mark_clicked(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE invite_logs SET status = 'clicked', clicked_at = NOW() WHERE id = $1 AND status = 'sent'",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Full invite history with org and inviter context, newest first.
    #[tracing::instrument(skip(self), fields(db.table = "invite_logs", db.operation = "select"))]
    pub async fn list_with_context(&self) -> Result<Vec<InviteWithContext>, AppError> {
        let invites = sqlx::query_as::<Postgres, InviteWithContext>(
            r#"
            SELECT i.id, i.email, i.org_id, i.department_id, i.invited_by, i.role, i.token,
                   i.status, i.sent_at, i.clicked_at, i.accepted_at, i.expires_at,
                   o.name AS org_name,
                   e.name AS invited_by_name,
                   e.email AS invited_by_email
            FROM invite_logs i
            LEFT JOIN organizations o ON o.id = i.org_id
            LEFT JOIN employees e ON e.id = i.invited_by
            ORDER BY i.sent_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(invites)
    }

    #[tracing::instrument(skip(self), fields(db.table = "invite_logs", db.operation = "select"))]
    pub async fn count_sent(&self) -> Result<i64, AppError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM invite_logs WHERE status = 'sent'")
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}
