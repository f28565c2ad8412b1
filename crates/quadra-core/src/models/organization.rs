use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Organization status: pending until the invited CEO accepts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "org_status", rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum OrgStatus {
    Pending,
    Active,
}

/// Tenant root. `ceo_id` stays null until the invited CEO verifies their
/// email; activation also flips `status` to active.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    pub ceo_email: String,
    pub ceo_id: Option<Uuid>,
    pub invite_token: Option<Uuid>,
    pub status: OrgStatus,
    pub created_at: DateTime<Utc>,
}
