use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// What an OTP authorizes. A code is scoped to one (email, purpose) pair.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "otp_purpose", rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum OtpPurpose {
    Login,
    Signup,
    Reset,
}

/// Single-use, time-boxed numeric code. At most one live code per
/// (email, purpose): prior rows are deleted before a new one is issued, and
/// verification consumes the code.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Otp {
    pub id: Uuid,
    pub email: String,
    pub code: String,
    pub purpose: OtpPurpose,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Otp {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn expiry_is_inclusive_at_the_boundary() {
        let now = Utc::now();
        let otp = Otp {
            id: Uuid::new_v4(),
            email: "user@example.com".to_string(),
            code: "123456".to_string(),
            purpose: OtpPurpose::Login,
            expires_at: now,
            created_at: now - Duration::minutes(10),
        };
        assert!(otp.is_expired(now));
        assert!(!otp.is_expired(now - Duration::seconds(1)));
    }
}
