use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "assignment_status", rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    Pending,
    InProgress,
    Completed,
}

/// One employee's obligation to answer one survey. Unique per
/// (survey, employee); created by department fan-out or catch-up enrollment.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SurveyAssignment {
    pub id: Uuid,
    pub survey_id: Uuid,
    pub org_id: Uuid,
    pub department_id: Option<Uuid>,
    pub employee_id: Uuid,
    pub status: AssignmentStatus,
    pub due_date: Option<DateTime<Utc>>,
    pub assigned_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}
