use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Department within an organization. Scopes employees and survey
/// assignments.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Department {
    pub id: Uuid,
    pub name: String,
    pub org_id: Uuid,
    pub head_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}
