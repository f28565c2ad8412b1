use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::employee::Role;

/// Invite lifecycle: sent when issued, clicked when the link is visited,
/// accepted on verification, expired when superseded or timed out.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "invite_log_status", rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum InviteLogStatus {
    Sent,
    Clicked,
    Accepted,
    Expired,
}

/// One invitation of an email into a role/org/department. The token is
/// globally unique and is the sole signup/verification credential. At most
/// one live "sent" record per email at a time; superseded invites are marked
/// expired.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct InviteLog {
    pub id: Uuid,
    pub email: String,
    pub org_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
    pub invited_by: Uuid,
    pub role: Role,
    pub token: Uuid,
    pub status: InviteLogStatus,
    pub sent_at: DateTime<Utc>,
    pub clicked_at: Option<DateTime<Utc>>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
}

impl InviteLog {
    /// A live invite can still be used for signup/verification.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        matches!(
            self.status,
            InviteLogStatus::Sent | InviteLogStatus::Clicked
        ) && self.expires_at > now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn invite(status: InviteLogStatus, expires_in: Duration) -> InviteLog {
        let now = Utc::now();
        InviteLog {
            id: Uuid::new_v4(),
            email: "user@example.com".to_string(),
            org_id: Some(Uuid::new_v4()),
            department_id: None,
            invited_by: Uuid::new_v4(),
            role: Role::User,
            token: Uuid::new_v4(),
            status,
            sent_at: now,
            clicked_at: None,
            accepted_at: None,
            expires_at: now + expires_in,
        }
    }

    #[test]
    fn sent_and_clicked_invites_are_live_until_expiry() {
        let now = Utc::now();
        assert!(invite(InviteLogStatus::Sent, Duration::days(1)).is_live(now));
        assert!(invite(InviteLogStatus::Clicked, Duration::days(1)).is_live(now));
        assert!(!invite(InviteLogStatus::Sent, Duration::seconds(-1)).is_live(now));
    }

    #[test]
    fn accepted_and_expired_invites_are_never_live() {
        let now = Utc::now();
        assert!(!invite(InviteLogStatus::Accepted, Duration::days(1)).is_live(now));
        assert!(!invite(InviteLogStatus::Expired, Duration::days(1)).is_live(now));
    }
}
