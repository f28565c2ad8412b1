use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::scoring::Band;

/// What the client sends: per-question option indexes, one per aspect.
/// Marks are resolved server-side; clients never see or supply them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct AnswerSelection {
    pub question_id: Uuid,
    pub present_option_index: Option<i32>,
    pub future_option_index: Option<i32>,
}

/// Stored answer: the selections plus the marks resolved at submission time.
/// Drafts persist with zeroed marks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct Answer {
    pub question_id: Uuid,
    #[serde(default)]
    pub question_number: String,
    pub present_option_index: Option<i32>,
    #[serde(default)]
    pub present_creativity_marks: i32,
    #[serde(default)]
    pub present_morality_marks: i32,
    pub future_option_index: Option<i32>,
    #[serde(default)]
    pub future_creativity_marks: i32,
    #[serde(default)]
    pub future_morality_marks: i32,
}

impl Answer {
    /// A draft answer carries the selections only.
    pub fn draft(selection: &AnswerSelection) -> Self {
        Answer {
            question_id: selection.question_id,
            question_number: String::new(),
            present_option_index: selection.present_option_index,
            present_creativity_marks: 0,
            present_morality_marks: 0,
            future_option_index: selection.future_option_index,
            future_creativity_marks: 0,
            future_morality_marks: 0,
        }
    }
}

/// One employee's response to one survey. Unique per (survey, employee);
/// the draft and the final submission share this record (upsert).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SurveyResponse {
    pub id: Uuid,
    pub survey_id: Uuid,
    pub employee_id: Uuid,
    pub org_id: Uuid,
    pub department_id: Option<Uuid>,
    pub answers: Vec<Answer>,
    pub present_creativity_total: i32,
    pub present_morality_total: i32,
    pub present_creativity_percentage: f64,
    pub present_morality_percentage: f64,
    pub present_creativity_band: Band,
    pub present_morality_band: Band,
    pub future_creativity_total: i32,
    pub future_morality_total: i32,
    pub future_creativity_percentage: f64,
    pub future_morality_percentage: f64,
    pub future_creativity_band: Band,
    pub future_morality_band: Band,
    pub is_draft: bool,
    pub submitted_at: DateTime<Utc>,
}
