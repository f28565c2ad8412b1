use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "survey_status", rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum SurveyStatus {
    Draft,
    Active,
    Closed,
}

/// One selectable option. The creativity and morality marks are hidden from
/// respondents; they only ever see the text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct QuestionOption {
    pub text: String,
    #[serde(default)]
    pub creativity_marks: i32,
    #[serde(default)]
    pub morality_marks: i32,
}

/// A question carries two parallel option tables: one answered for the
/// present aspect, one for the future aspect.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct Question {
    pub id: Uuid,
    /// Display ordinal, e.g. "6.01".
    #[serde(default)]
    pub question_number: String,
    pub text: String,
    pub present_options: Vec<QuestionOption>,
    pub future_options: Vec<QuestionOption>,
    #[serde(default = "default_required")]
    pub required: bool,
}

fn default_required() -> bool {
    true
}

/// Survey or template. Templates are admin-authored and org-less
/// (`org_id` null, `is_template` true); org surveys are cloned from them or
/// created directly by a CEO.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Survey {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub org_id: Option<Uuid>,
    pub created_by: Uuid,
    pub questions: Vec<Question>,
    pub is_template: bool,
    pub due_date: Option<DateTime<Utc>>,
    pub status: SurveyStatus,
    pub created_at: DateTime<Utc>,
}

/// Survey stripped of the option marks, safe to hand to a respondent.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SurveyForRespondent {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub questions: Vec<QuestionForRespondent>,
    pub due_date: Option<DateTime<Utc>>,
    pub status: SurveyStatus,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct QuestionForRespondent {
    pub id: Uuid,
    pub question_number: String,
    pub text: String,
    pub present_options: Vec<String>,
    pub future_options: Vec<String>,
    pub required: bool,
}

impl Survey {
    /// Redact option marks for delivery to the answering employee.
    pub fn for_respondent(&self) -> SurveyForRespondent {
        SurveyForRespondent {
            id: self.id,
            title: self.title.clone(),
            description: self.description.clone(),
            questions: self
                .questions
                .iter()
                .map(|q| QuestionForRespondent {
                    id: q.id,
                    question_number: q.question_number.clone(),
                    text: q.text.clone(),
                    present_options: q.present_options.iter().map(|o| o.text.clone()).collect(),
                    future_options: q.future_options.iter().map(|o| o.text.clone()).collect(),
                    required: q.required,
                })
                .collect(),
            due_date: self.due_date,
            status: self.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn respondent_view_omits_marks() {
        let survey = Survey {
            id: Uuid::new_v4(),
            title: "Quarterly pulse".to_string(),
            description: None,
            org_id: None,
            created_by: Uuid::new_v4(),
            questions: vec![Question {
                id: Uuid::new_v4(),
                question_number: "1.01".to_string(),
                text: "How do you approach new problems?".to_string(),
                present_options: vec![QuestionOption {
                    text: "Experiment first".to_string(),
                    creativity_marks: 5,
                    morality_marks: 3,
                }],
                future_options: vec![QuestionOption {
                    text: "Plan carefully".to_string(),
                    creativity_marks: 2,
                    morality_marks: 4,
                }],
                required: true,
            }],
            is_template: true,
            due_date: None,
            status: SurveyStatus::Draft,
            created_at: Utc::now(),
        };

        let view = survey.for_respondent();
        let json = serde_json::to_string(&view).unwrap();
        assert!(!json.contains("marks"));
        assert_eq!(view.questions[0].present_options[0], "Experiment first");
    }
}
