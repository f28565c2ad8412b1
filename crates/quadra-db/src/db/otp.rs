use chrono::{Duration, Utc};
use quadra_core::constants::OTP_TTL_MINUTES;
use quadra_core::models::{Otp, OtpPurpose};
use quadra_core::AppError;
use sqlx::{PgPool, Postgres};

const OTP_COLUMNS: &str = "id, email, code, purpose, expires_at, created_at";

/// Repository for one-time codes.
///
/// The document store's TTL reaper has no Postgres equivalent: expiry is
/// enforced by predicate on every lookup, and stale rows are swept
/// opportunistically whenever a new code is issued.
#[derive(Clone)]
pub struct OtpRepository {
    pool: PgPool,
}

impl OtpRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Issue a fresh code, guaranteeing at most one live credential per
    /// (email, purpose): prior codes for the pair are deleted first.
    #[tracing::instrument(skip(self, code), fields(db.table = "otp_codes", db.operation = "insert"))]
    pub async fn issue(
        &self,
        email: &str,
        code: &str,
        purpose: OtpPurpose,
    ) -> Result<Otp, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM otp_codes WHERE LOWER(email) = LOWER($1) AND purpose = $2")
            .bind(email)
            .bind(purpose)
            .execute(&mut *tx)
            .await?;

        // Opportunistic sweep of codes nothing will ever match again.
        sqlx::query("DELETE FROM otp_codes WHERE expires_at <= NOW()")
            .execute(&mut *tx)
            .await?;

        let otp = sqlx::query_as::<Postgres, Otp>(&format!(
            r#"
            INSERT INTO otp_codes (email, code, purpose, expires_at)
            VALUES (LOWER($1), $2, $3, $4)
            RETURNING {}
            "#,
            OTP_COLUMNS
        ))
        .bind(email)
        .bind(code)
        .bind(purpose)
        .bind(Utc::now() + Duration::minutes(OTP_TTL_MINUTES))
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(otp)
    }

    /// Find a still-valid code for (email, code, purpose).
    #[tracing::instrument(skip(self, code), fields(db.table = "otp_codes", db.operation = "select"))]
    pub async fn find_live(
        &self,
        email: &str,
        code: &str,
        purpose: OtpPurpose,
    ) -> Result<Option<Otp>, AppError> {
        let otp = sqlx::query_as::<Postgres, Otp>(&format!(
            r#"
            SELECT {} FROM otp_codes
            WHERE LOWER(email) = LOWER($1) AND code = $2 AND purpose = $3 AND expires_at > NOW()
            "#,
            OTP_COLUMNS
        ))
        .bind(email)
        .bind(code)
        .bind(purpose)
        .fetch_optional(&self.pool)
        .await?;
        Ok(otp)
    }

    /// Consume every code for the pair; verification is single-use.
    #[tracing::instrument(skip(self), fields(db.table = "otp_codes", db.operation = "delete"))]
    pub async fn consume(&self, email: &str, purpose: OtpPurpose) -> Result<(), AppError> {
        sqlx::query("DELETE FROM otp_codes WHERE LOWER(email) = LOWER($1) AND purpose = $2")
            .bind(email)
            .bind(purpose)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
