//! Shared survey routes: template listing and template cloning, plus the
//! question input shape reused by the admin and CEO survey endpoints.

use crate::auth::models::{AuthContext, RoleGate};
use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use quadra_core::models::{Question, QuestionOption, Survey};
use quadra_core::AppError;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

/// Incoming question payload; ids are assigned server-side.
#[derive(Debug, Deserialize, ToSchema)]
pub struct QuestionInput {
    #[serde(default)]
    pub question_number: String,
    pub text: String,
    #[serde(default)]
    pub present_options: Vec<OptionInput>,
    #[serde(default)]
    pub future_options: Vec<OptionInput>,
    #[serde(default = "default_required")]
    pub required: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OptionInput {
    pub text: String,
    #[serde(default)]
    pub creativity_marks: i32,
    #[serde(default)]
    pub morality_marks: i32,
}

fn default_required() -> bool {
    true
}

impl From<OptionInput> for QuestionOption {
    fn from(input: OptionInput) -> Self {
        QuestionOption {
            text: input.text,
            creativity_marks: input.creativity_marks,
            morality_marks: input.morality_marks,
        }
    }
}

impl From<QuestionInput> for Question {
    fn from(input: QuestionInput) -> Self {
        Question {
            id: Uuid::new_v4(),
            question_number: input.question_number,
            text: input.text,
            present_options: input.present_options.into_iter().map(Into::into).collect(),
            future_options: input.future_options.into_iter().map(Into::into).collect(),
            required: input.required,
        }
    }
}

pub fn questions_from_inputs(inputs: Vec<QuestionInput>) -> Vec<Question> {
    inputs.into_iter().map(Into::into).collect()
}

/// Admin-authored templates, visible to any authenticated caller.
#[utoipa::path(
    get,
    path = "/api/surveys/templates",
    tag = "surveys",
    responses((status = 200, body = [Survey]))
)]
#[tracing::instrument(skip(state, _ctx))]
pub async fn list_templates(
    State(state): State<Arc<AppState>>,
    _ctx: AuthContext,
) -> Result<impl IntoResponse, HttpAppError> {
    let templates = state.db.surveys.list_templates().await?;
    Ok(Json(templates))
}

/// Clone a template into the caller's organization as a draft survey.
/// CEO or admin only.
#[utoipa::path(
    post,
    path = "/api/surveys/templates/{id}/clone",
    tag = "surveys",
    responses((status = 201, body = Survey))
)]
#[tracing::instrument(skip(state, ctx))]
pub async fn clone_template(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    if !RoleGate::CeoOrAdmin.permits(ctx.role()) {
        return Err(AppError::Forbidden("Access denied".to_string()).into());
    }
    let org_id = ctx.require_org().map_err(HttpAppError::from)?;

    let template = state
        .db
        .surveys
        .get_template(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Template not found".to_string()))?;

    let survey = state
        .db
        .surveys
        .create(
            &template.title,
            template.description.as_deref(),
            Some(org_id),
            ctx.employee.id,
            &template.questions,
            false,
            None,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(survey)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_inputs_get_fresh_ids_and_keep_marks() {
        let questions = questions_from_inputs(vec![QuestionInput {
            question_number: "2.03".to_string(),
            text: "How do you weigh risk?".to_string(),
            present_options: vec![OptionInput {
                text: "Boldly".to_string(),
                creativity_marks: 5,
                morality_marks: 1,
            }],
            future_options: vec![],
            required: true,
        }]);

        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].question_number, "2.03");
        assert_eq!(questions[0].present_options[0].creativity_marks, 5);
        assert!(questions[0].future_options.is_empty());
    }
}
