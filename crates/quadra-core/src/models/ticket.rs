use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::employee::Role;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "ticket_category", rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum TicketCategory {
    Technical,
    Survey,
    Account,
    Billing,
    Other,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "ticket_priority", rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum TicketPriority {
    Low,
    Medium,
    High,
    Urgent,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "ticket_status", rename_all = "kebab-case"))]
#[serde(rename_all = "kebab-case")]
pub enum TicketStatus {
    Open,
    InProgress,
    Resolved,
    Closed,
}

/// Support ticket. The human-readable number is drawn from a dedicated
/// database sequence at creation, so concurrent creations can never collide.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SupportTicket {
    pub id: Uuid,
    pub ticket_number: String,
    pub subject: String,
    pub category: TicketCategory,
    pub priority: TicketPriority,
    pub status: TicketStatus,
    pub created_by: Uuid,
    pub created_by_role: Role,
    pub org_id: Option<Uuid>,
    pub assigned_to: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

/// One message in a ticket's thread.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct TicketMessage {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub sender: Uuid,
    pub sender_role: Role,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Ticket aggregate as returned by detail endpoints.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TicketWithMessages {
    #[serde(flatten)]
    pub ticket: SupportTicket,
    pub messages: Vec<TicketMessage>,
}

/// `TKT-000123` style display number.
pub fn format_ticket_number(seq: i64) -> String {
    format!("TKT-{:06}", seq)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticket_numbers_are_zero_padded() {
        assert_eq!(format_ticket_number(1), "TKT-000001");
        assert_eq!(format_ticket_number(123), "TKT-000123");
        assert_eq!(format_ticket_number(1_000_000), "TKT-1000000");
    }

    #[test]
    fn ticket_status_uses_kebab_case() {
        assert_eq!(
            serde_json::to_string(&TicketStatus::InProgress).unwrap(),
            "\"in-progress\""
        );
    }
}
