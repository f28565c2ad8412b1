//! Admin reports: per-response scores with bands and quadrants, plus
//! aggregate averages and quadrant distributions. The reporting path totals
//! the marks stored on submitted answers; thresholds match the submission
//! path.

use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use quadra_core::models::Survey;
use quadra_core::scoring::{AspectScore, Quadrant, ScoreCard};
use quadra_core::AppError;
use quadra_db::ResponseWithContext;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
pub struct AspectReport {
    #[serde(flatten)]
    pub score: AspectScore,
    pub quadrant: Quadrant,
}

impl From<AspectScore> for AspectReport {
    fn from(score: AspectScore) -> Self {
        let quadrant = score.quadrant();
        AspectReport { score, quadrant }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ResponseScores {
    pub present: AspectReport,
    pub future: AspectReport,
    pub max_score: i32,
}

impl From<ScoreCard> for ResponseScores {
    fn from(card: ScoreCard) -> Self {
        ResponseScores {
            present: card.present.into(),
            future: card.future.into(),
            max_score: card.max_score,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReportEmployee {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub department: String,
}

#[derive(Debug, Serialize)]
pub struct ResponseReport {
    pub employee: ReportEmployee,
    pub submitted_at: DateTime<Utc>,
    pub scores: ResponseScores,
}

#[derive(Debug, Serialize, Default)]
pub struct AspectAggregate {
    pub avg_creativity_percentage: f64,
    pub avg_morality_percentage: f64,
    pub avg_creativity_total: f64,
    pub avg_morality_total: f64,
    pub quadrant_distribution: BTreeMap<&'static str, i64>,
}

#[derive(Debug, Serialize)]
pub struct AggregateScores {
    pub present: AspectAggregate,
    pub future: AspectAggregate,
}

#[derive(Debug, Serialize)]
pub struct SurveyHeader {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub question_count: usize,
}

#[derive(Debug, Serialize)]
pub struct SurveyReport {
    pub survey: SurveyHeader,
    pub total_responses: usize,
    pub responses: Vec<ResponseReport>,
    pub aggregate_scores: Option<AggregateScores>,
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn score_response(response: &ResponseWithContext, question_count: usize) -> ResponseReport {
    let card = ScoreCard::from_marked_answers(&response.response.answers, question_count);
    ResponseReport {
        employee: ReportEmployee {
            id: response.response.employee_id,
            name: response
                .employee_name
                .clone()
                .unwrap_or_else(|| "Unknown".to_string()),
            email: response
                .employee_email
                .clone()
                .unwrap_or_else(|| "N/A".to_string()),
            department: response
                .department_name
                .clone()
                .unwrap_or_else(|| "N/A".to_string()),
        },
        submitted_at: response.response.submitted_at,
        scores: card.into(),
    }
}

fn aggregate(responses: &[ResponseReport]) -> Option<AggregateScores> {
    if responses.is_empty() {
        return None;
    }
    let n = responses.len() as f64;

    let mut present = AspectAggregate::default();
    let mut future = AspectAggregate::default();

    for report in responses {
        let p = &report.scores.present;
        present.avg_creativity_percentage += p.score.creativity_percentage;
        present.avg_morality_percentage += p.score.morality_percentage;
        present.avg_creativity_total += f64::from(p.score.creativity_total);
        present.avg_morality_total += f64::from(p.score.morality_total);
        *present.quadrant_distribution.entry(p.quadrant.as_str()).or_insert(0) += 1;

        let f = &report.scores.future;
        future.avg_creativity_percentage += f.score.creativity_percentage;
        future.avg_morality_percentage += f.score.morality_percentage;
        future.avg_creativity_total += f64::from(f.score.creativity_total);
        future.avg_morality_total += f64::from(f.score.morality_total);
        *future.quadrant_distribution.entry(f.quadrant.as_str()).or_insert(0) += 1;
    }

    for aspect in [&mut present, &mut future] {
        aspect.avg_creativity_percentage = round1(aspect.avg_creativity_percentage / n);
        aspect.avg_morality_percentage = round1(aspect.avg_morality_percentage / n);
        aspect.avg_creativity_total = round1(aspect.avg_creativity_total / n);
        aspect.avg_morality_total = round1(aspect.avg_morality_total / n);
    }

    Some(AggregateScores { present, future })
}

async fn build_survey_report(
    state: &Arc<AppState>,
    survey: &Survey,
) -> Result<SurveyReport, AppError> {
    let responses = state
        .db
        .responses
        .list_submitted_by_survey_with_context(survey.id)
        .await?;

    let scored: Vec<ResponseReport> = responses
        .iter()
        .map(|r| score_response(r, survey.questions.len()))
        .collect();

    Ok(SurveyReport {
        survey: SurveyHeader {
            id: survey.id,
            title: survey.title.clone(),
            description: survey.description.clone(),
            created_at: survey.created_at,
            question_count: survey.questions.len(),
        },
        total_responses: scored.len(),
        aggregate_scores: aggregate(&scored),
        responses: scored,
    })
}

#[derive(Debug, Serialize)]
pub struct OrganizationReport {
    pub organization: OrganizationHeader,
    pub survey_reports: Vec<SurveyReport>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct OrganizationHeader {
    pub id: Uuid,
    pub name: String,
    pub ceo_email: String,
    pub status: quadra_core::models::OrgStatus,
    pub employee_count: i64,
}

/// Full scoring report across every survey of an organization.
#[utoipa::path(
    get,
    path = "/api/reports/organizations/{id}",
    tag = "reports",
    responses((status = 200))
)]
#[tracing::instrument(skip(state))]
pub async fn organization_report(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let org = state
        .db
        .organizations
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Organization not found".to_string()))?;

    let surveys = state.db.surveys.list_by_org(id).await?;
    let mut survey_reports = Vec::with_capacity(surveys.len());
    for survey in &surveys {
        survey_reports.push(build_survey_report(&state, survey).await?);
    }

    let counts = state.db.analytics.org_counts(id).await?;

    Ok(Json(OrganizationReport {
        organization: OrganizationHeader {
            id: org.id,
            name: org.name,
            ceo_email: org.ceo_email,
            status: org.status,
            employee_count: counts.employees,
        },
        survey_reports,
        generated_at: Utc::now(),
    }))
}

#[derive(Debug, Serialize)]
pub struct SingleSurveyReport {
    #[serde(flatten)]
    pub report: SurveyReport,
    pub generated_at: DateTime<Utc>,
}

/// Scoring report for one survey.
#[utoipa::path(
    get,
    path = "/api/reports/surveys/{id}",
    tag = "reports",
    responses((status = 200))
)]
#[tracing::instrument(skip(state))]
pub async fn survey_report(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let survey = state
        .db
        .surveys
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Survey not found".to_string()))?;

    let report = build_survey_report(&state, &survey).await?;
    Ok(Json(SingleSurveyReport {
        report,
        generated_at: Utc::now(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use quadra_core::models::{Answer, SurveyResponse};
    use quadra_core::scoring::Band;

    fn context_response(
        answers: Vec<Answer>,
        name: &str,
    ) -> ResponseWithContext {
        let now = Utc::now();
        ResponseWithContext {
            response: SurveyResponse {
                id: Uuid::new_v4(),
                survey_id: Uuid::new_v4(),
                employee_id: Uuid::new_v4(),
                org_id: Uuid::new_v4(),
                department_id: None,
                answers,
                present_creativity_total: 0,
                present_morality_total: 0,
                present_creativity_percentage: 0.0,
                present_morality_percentage: 0.0,
                present_creativity_band: Band::Early,
                present_morality_band: Band::Early,
                future_creativity_total: 0,
                future_morality_total: 0,
                future_creativity_percentage: 0.0,
                future_morality_percentage: 0.0,
                future_creativity_band: Band::Early,
                future_morality_band: Band::Early,
                is_draft: false,
                submitted_at: now,
            },
            employee_name: Some(name.to_string()),
            employee_email: Some(format!("{}@example.com", name)),
            survey_title: Some("Pulse".to_string()),
            department_name: None,
        }
    }

    fn answer(pc: i32, pm: i32, fc: i32, fm: i32) -> Answer {
        Answer {
            question_id: Uuid::new_v4(),
            question_number: String::new(),
            present_option_index: Some(0),
            present_creativity_marks: pc,
            present_morality_marks: pm,
            future_option_index: Some(0),
            future_creativity_marks: fc,
            future_morality_marks: fm,
        }
    }

    #[test]
    fn report_scores_from_stored_marks() {
        // 2 questions, max 10 per dimension. Present creativity 6/10 = 60%.
        let response = context_response(vec![answer(3, 2, 5, 5), answer(3, 2, 5, 5)], "ada");
        let report = score_response(&response, 2);
        assert_eq!(report.scores.max_score, 10);
        assert_eq!(report.scores.present.score.creativity_percentage, 60.0);
        // Present: creativity 60% >= 50, morality 40% < 50.
        assert_eq!(report.scores.present.quadrant, Quadrant::UnboundedPower);
        // Future: both 100%.
        assert_eq!(report.scores.future.quadrant, Quadrant::HopeInAction);
    }

    #[test]
    fn aggregate_averages_and_distribution() {
        let responses = vec![
            score_response(&context_response(vec![answer(5, 5, 0, 0)], "a"), 1),
            score_response(&context_response(vec![answer(0, 0, 0, 0)], "b"), 1),
        ];
        let agg = aggregate(&responses).expect("non-empty");
        assert_eq!(agg.present.avg_creativity_percentage, 50.0);
        assert_eq!(agg.present.avg_creativity_total, 2.5);
        assert_eq!(
            agg.present.quadrant_distribution.get("Hope in Action (IGEN Zone)"),
            Some(&1)
        );
        assert_eq!(
            agg.present.quadrant_distribution.get("Extraction Engine"),
            Some(&1)
        );
        assert!(aggregate(&[]).is_none());
    }
}
