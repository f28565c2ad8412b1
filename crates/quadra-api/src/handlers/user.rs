//! Employee routes: the personal dashboard and the draft/submit response
//! lifecycle. Nothing returned here ever includes marks, percentages, or
//! bands; those are visible only to admin reporting.

use crate::auth::models::AuthContext;
use crate::error::{HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use quadra_core::models::{
    Answer, AnswerSelection, AssignmentStatus, SurveyAssignment, SurveyForRespondent,
};
use quadra_core::scoring::{completion_rate, ScoreCard};
use quadra_core::AppError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct PendingSurvey {
    pub assignment_id: Uuid,
    pub survey: SurveyForRespondent,
    pub due_date: Option<DateTime<Utc>>,
    pub status: AssignmentStatus,
    pub days_left: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct CompletedSurvey {
    pub assignment_id: Uuid,
    pub survey: SurveyForRespondent,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserDashboardStats {
    pub total_assigned: usize,
    pub completed: usize,
    pub pending: usize,
    pub completion_rate: i64,
}

#[derive(Debug, Serialize)]
pub struct UserDashboard {
    pub pending: Vec<PendingSurvey>,
    pub completed: Vec<CompletedSurvey>,
    pub stats: UserDashboardStats,
}

fn days_left(due_date: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Option<i64> {
    due_date.map(|due| {
        let seconds = (due - now).num_seconds();
        (seconds as f64 / 86_400.0).ceil() as i64
    })
}

/// Assigned surveys split into open and completed, with summary stats.
#[utoipa::path(get, path = "/api/user/dashboard", tag = "user", responses((status = 200)))]
#[tracing::instrument(skip(state, ctx))]
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
) -> Result<impl IntoResponse, HttpAppError> {
    let assignments = state
        .db
        .assignments
        .list_for_employee(ctx.employee.id)
        .await?;

    let now = Utc::now();
    let total = assignments.len();
    let mut pending = Vec::new();
    let mut completed = Vec::new();

    for (assignment, survey) in assignments {
        match assignment.status {
            AssignmentStatus::Completed => completed.push(CompletedSurvey {
                assignment_id: assignment.id,
                survey: survey.for_respondent(),
                completed_at: assignment.completed_at,
            }),
            AssignmentStatus::Pending | AssignmentStatus::InProgress => {
                pending.push(PendingSurvey {
                    assignment_id: assignment.id,
                    survey: survey.for_respondent(),
                    due_date: assignment.due_date,
                    status: assignment.status,
                    days_left: days_left(assignment.due_date, now),
                })
            }
        }
    }

    let completed_count = completed.len();
    Ok(Json(UserDashboard {
        pending,
        completed,
        stats: UserDashboardStats {
            total_assigned: total,
            completed: completed_count,
            pending: total - completed_count,
            completion_rate: completion_rate(completed_count as i64, total as i64),
        },
    }))
}

#[derive(Debug, Serialize)]
pub struct SurveyToFill {
    pub survey: SurveyForRespondent,
    pub assignment: SurveyAssignment,
    pub draft: Option<Vec<AnswerSelection>>,
}

/// Fetch a survey to fill in. 404 unless it is assigned to the caller; any
/// saved draft comes back as bare selections.
#[utoipa::path(get, path = "/api/user/surveys/{id}", tag = "user", responses((status = 200)))]
#[tracing::instrument(skip(state, ctx))]
pub async fn get_survey(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let assignment = state
        .db
        .assignments
        .find(id, ctx.employee.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Survey not assigned to you".to_string()))?;

    let survey = state
        .db
        .surveys
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Survey not found".to_string()))?;

    let draft = state
        .db
        .responses
        .find(id, ctx.employee.id)
        .await?
        .filter(|r| r.is_draft)
        .map(|r| {
            r.answers
                .iter()
                .map(|a| AnswerSelection {
                    question_id: a.question_id,
                    present_option_index: a.present_option_index,
                    future_option_index: a.future_option_index,
                })
                .collect()
        });

    Ok(Json(SurveyToFill {
        survey: survey.for_respondent(),
        assignment,
        draft,
    }))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AnswersRequest {
    pub answers: Vec<AnswerSelection>,
}

/// Save a draft: selections only, no scoring. The assignment moves to
/// in_progress.
#[utoipa::path(
    post,
    path = "/api/user/surveys/{id}/draft",
    tag = "user",
    responses((status = 200))
)]
#[tracing::instrument(skip(state, ctx, request))]
pub async fn save_draft(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<AnswersRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let org_id = ctx.require_org().map_err(HttpAppError::from)?;

    state
        .db
        .assignments
        .find(id, ctx.employee.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Survey not assigned to you".to_string()))?;

    let answers: Vec<Answer> = request.answers.iter().map(Answer::draft).collect();
    state
        .db
        .responses
        .save_draft(
            id,
            ctx.employee.id,
            org_id,
            ctx.employee.department_id,
            &answers,
        )
        .await?;

    Ok(Json(serde_json::json!({ "message": "Draft saved" })))
}

/// Submit the survey: marks are resolved server-side, the response row is
/// overwritten, and the assignment completes. Idempotent per
/// (survey, employee). The body deliberately reveals nothing about scores.
#[utoipa::path(
    post,
    path = "/api/user/surveys/{id}/submit",
    tag = "user",
    responses((status = 200))
)]
#[tracing::instrument(skip(state, ctx, request))]
pub async fn submit_survey(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<AnswersRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let org_id = ctx.require_org().map_err(HttpAppError::from)?;

    state
        .db
        .assignments
        .find(id, ctx.employee.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Survey not assigned to you".to_string()))?;

    let survey = state
        .db
        .surveys
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Survey not found".to_string()))?;

    let (card, answers) = ScoreCard::from_selections(&survey.questions, &request.answers);

    state
        .db
        .responses
        .submit(
            id,
            ctx.employee.id,
            org_id,
            ctx.employee.department_id,
            &answers,
            &card,
        )
        .await?;

    Ok(Json(serde_json::json!({
        "message": "Survey submitted successfully"
    })))
}

#[derive(Debug, Serialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub survey_title: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

/// Submission history; titles and timestamps only.
#[utoipa::path(get, path = "/api/user/history", tag = "user", responses((status = 200)))]
#[tracing::instrument(skip(state, ctx))]
pub async fn history(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
) -> Result<impl IntoResponse, HttpAppError> {
    let responses = state
        .db
        .responses
        .list_submitted_by_employee(ctx.employee.id)
        .await?;

    let entries: Vec<HistoryEntry> = responses
        .into_iter()
        .map(|r| HistoryEntry {
            id: r.response.id,
            survey_title: r.survey_title,
            submitted_at: r.response.submitted_at,
        })
        .collect();

    Ok(Json(entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn days_left_rounds_up() {
        let now = Utc::now();
        assert_eq!(days_left(None, now), None);
        assert_eq!(days_left(Some(now + Duration::hours(25)), now), Some(2));
        assert_eq!(days_left(Some(now + Duration::hours(1)), now), Some(1));
        assert_eq!(days_left(Some(now - Duration::hours(30)), now), Some(-1));
    }
}
