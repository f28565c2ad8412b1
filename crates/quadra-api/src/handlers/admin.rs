//! Admin routes: organization provisioning, survey templates, invites,
//! dashboard, and mark-level drill-downs. Everything here sits behind the
//! admin role gate.

use crate::error::{HttpAppError, ValidatedJson};
use crate::handlers::surveys::{questions_from_inputs, QuestionInput};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use quadra_core::models::{Department, Employee, Organization, Survey};
use quadra_core::scoring::completion_rate;
use quadra_core::AppError;
use quadra_db::{InviteWithContext, ResponseWithContext};
use quadra_services::generate_invite_token;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::models::AuthContext;

#[derive(Debug, serde::Deserialize, ToSchema)]
pub struct CreateOrganizationRequest {
    pub name: String,
    pub ceo_email: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateOrganizationResponse {
    pub org: Organization,
    pub invite_token: Uuid,
    pub email_sent: bool,
    pub signup_link: String,
    pub message: String,
}

/// Create an organization and invite its CEO. Mail failure degrades the
/// response instead of failing it: the signup link is returned for manual
/// sharing.
#[utoipa::path(
    post,
    path = "/api/admin/organizations",
    tag = "admin",
    responses((status = 201, body = CreateOrganizationResponse))
)]
#[tracing::instrument(skip(state, ctx, request))]
pub async fn create_organization(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    ValidatedJson(request): ValidatedJson<CreateOrganizationRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let name = request.name.trim();
    let ceo_email = request.ceo_email.trim().to_lowercase();
    if name.is_empty() || ceo_email.is_empty() {
        return Err(AppError::InvalidInput(
            "Organization name and CEO email are required".to_string(),
        )
        .into());
    }

    if state
        .db
        .employees
        .find_accepted_by_email(&ceo_email)
        .await?
        .is_some()
    {
        return Err(
            AppError::Conflict("This email already has an active account".to_string()).into(),
        );
    }

    let invite_token = generate_invite_token();
    let org = state
        .db
        .organizations
        .provision(name, &ceo_email, ctx.employee.id, invite_token)
        .await?;

    let signup_link = format!("{}/signup?token={}", state.config.frontend_url, invite_token);

    let email_sent = match &state.email {
        Some(email) => match email.send_ceo_invite(&ceo_email, invite_token, name).await {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(error = %err, email = %ceo_email, "CEO invite email failed");
                false
            }
        },
        None => false,
    };

    let message = if email_sent {
        format!("Organization created and invitation sent to {}", ceo_email)
    } else {
        format!(
            "Organization created. Email failed - share this link manually: {}",
            signup_link
        )
    };

    Ok((
        StatusCode::CREATED,
        Json(CreateOrganizationResponse {
            org,
            invite_token,
            email_sent,
            signup_link,
            message,
        }),
    ))
}

/// Rotate and resend a pending CEO invite.
#[utoipa::path(
    post,
    path = "/api/admin/organizations/{id}/resend-invite",
    tag = "admin",
    responses((status = 200))
)]
#[tracing::instrument(skip(state))]
pub async fn resend_ceo_invite(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let token = generate_invite_token();
    let org = state.db.organizations.rotate_ceo_invite(id, token).await?;

    let email = state
        .email
        .as_ref()
        .ok_or_else(|| AppError::Email("Mail transport is not configured".to_string()))?;
    email.send_ceo_invite(&org.ceo_email, token, &org.name).await?;

    Ok(Json(serde_json::json!({
        "message": "Invitation resent successfully"
    })))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrgStats {
    pub employees: i64,
    pub departments: i64,
    pub surveys: i64,
    pub completion_rate: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrganizationWithStats {
    #[serde(flatten)]
    pub org: Organization,
    pub stats: OrgStats,
}

/// All organizations with headline stats.
#[utoipa::path(
    get,
    path = "/api/admin/organizations",
    tag = "admin",
    responses((status = 200, body = [OrganizationWithStats]))
)]
#[tracing::instrument(skip(state))]
pub async fn list_organizations(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    let orgs = state.db.organizations.list_all().await?;

    let mut result = Vec::with_capacity(orgs.len());
    for org in orgs {
        let counts = state.db.analytics.org_counts(org.id).await?;
        result.push(OrganizationWithStats {
            org,
            stats: OrgStats {
                employees: counts.employees,
                departments: counts.departments,
                surveys: counts.surveys,
                completion_rate: completion_rate(counts.completed, counts.assignments),
            },
        });
    }

    Ok(Json(result))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrganizationDetail {
    pub org: Organization,
    pub departments: Vec<Department>,
    pub employees: Vec<Employee>,
    pub surveys: Vec<Survey>,
    pub stats: OrganizationDetailStats,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrganizationDetailStats {
    pub total_employees: i64,
    pub active_employees: i64,
    pub total_surveys: i64,
    pub total_assignments: i64,
    pub completed_assignments: i64,
    pub pending_assignments: i64,
}

/// Organization drill-down.
#[utoipa::path(
    get,
    path = "/api/admin/organizations/{id}",
    tag = "admin",
    responses((status = 200, body = OrganizationDetail))
)]
#[tracing::instrument(skip(state))]
pub async fn get_organization(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let org = state
        .db
        .organizations
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Organization not found".to_string()))?;

    let departments = state.db.departments.list_by_org(id).await?;
    let employees = state.db.employees.list_by_org(id).await?;
    let surveys = state.db.surveys.list_by_org(id).await?;
    let counts = state.db.analytics.org_counts(id).await?;
    let (active_employees, _) = state.db.analytics.org_employee_split(id).await?;

    let stats = OrganizationDetailStats {
        total_employees: counts.employees,
        active_employees,
        total_surveys: counts.surveys,
        total_assignments: counts.assignments,
        completed_assignments: counts.completed,
        pending_assignments: counts.assignments - counts.completed,
    };

    Ok(Json(OrganizationDetail {
        org,
        departments,
        employees,
        surveys,
        stats,
    }))
}

#[derive(Debug, serde::Deserialize, ToSchema)]
pub struct TemplateRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub questions: Vec<QuestionInput>,
}

/// Create a survey template.
#[utoipa::path(
    post,
    path = "/api/admin/surveys/template",
    tag = "admin",
    responses((status = 201, body = Survey))
)]
#[tracing::instrument(skip(state, ctx, request))]
pub async fn create_template(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    ValidatedJson(request): ValidatedJson<TemplateRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    if request.title.trim().is_empty() {
        return Err(AppError::InvalidInput("Title is required".to_string()).into());
    }

    let questions = questions_from_inputs(request.questions);
    let survey = state
        .db
        .surveys
        .create(
            request.title.trim(),
            request.description.as_deref(),
            None,
            ctx.employee.id,
            &questions,
            true,
            None,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(survey)))
}

/// All templates.
#[utoipa::path(
    get,
    path = "/api/admin/surveys/templates",
    tag = "admin",
    responses((status = 200, body = [Survey]))
)]
#[tracing::instrument(skip(state))]
pub async fn list_templates(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    let templates = state.db.surveys.list_templates().await?;
    Ok(Json(templates))
}

/// One template.
#[utoipa::path(
    get,
    path = "/api/admin/surveys/templates/{id}",
    tag = "admin",
    responses((status = 200, body = Survey))
)]
#[tracing::instrument(skip(state))]
pub async fn get_template(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let template = state
        .db
        .surveys
        .get_template(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Template not found".to_string()))?;
    Ok(Json(template))
}

/// Replace a template's title, description and questions.
#[utoipa::path(
    put,
    path = "/api/admin/surveys/templates/{id}",
    tag = "admin",
    responses((status = 200, body = Survey))
)]
#[tracing::instrument(skip(state, request))]
pub async fn update_template(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<TemplateRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let questions = questions_from_inputs(request.questions);
    let template = state
        .db
        .surveys
        .update_template(
            id,
            request.title.trim(),
            request.description.as_deref(),
            &questions,
        )
        .await?
        .ok_or_else(|| AppError::NotFound("Template not found".to_string()))?;
    Ok(Json(template))
}

/// Delete a template.
#[utoipa::path(
    delete,
    path = "/api/admin/surveys/templates/{id}",
    tag = "admin",
    responses((status = 200))
)]
#[tracing::instrument(skip(state))]
pub async fn delete_template(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    if !state.db.surveys.delete_template(id).await? {
        return Err(AppError::NotFound("Template not found".to_string()).into());
    }
    Ok(Json(serde_json::json!({
        "message": "Template deleted successfully"
    })))
}

/// Full invite history with context, newest first.
#[utoipa::path(get, path = "/api/admin/invites", tag = "admin", responses((status = 200)))]
#[tracing::instrument(skip(state))]
pub async fn list_invites(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<InviteWithContext>>, HttpAppError> {
    let invites = state.db.invites.list_with_context().await?;
    Ok(Json(invites))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminDashboardStats {
    pub total_orgs: i64,
    pub active_orgs: i64,
    pub total_employees: i64,
    pub total_templates: i64,
    pub total_surveys: i64,
    pub pending_invites: i64,
    pub total_responses: i64,
}

#[derive(Debug, Serialize)]
pub struct AdminDashboard {
    pub stats: AdminDashboardStats,
    pub recent_activity: Vec<RecentActivity>,
}

#[derive(Debug, Serialize)]
pub struct RecentActivity {
    pub id: Uuid,
    pub employee_name: Option<String>,
    pub employee_email: Option<String>,
    pub survey_title: Option<String>,
    pub submitted_at: chrono::DateTime<chrono::Utc>,
}

/// Platform dashboard: global counts and the latest submissions.
#[utoipa::path(get, path = "/api/admin/dashboard", tag = "admin", responses((status = 200)))]
#[tracing::instrument(skip(state))]
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    let counts = state.db.analytics.global_counts().await?;
    let pending_invites = state.db.invites.count_sent().await?;
    let recent = state.db.responses.recent_submissions(10).await?;

    Ok(Json(AdminDashboard {
        stats: AdminDashboardStats {
            total_orgs: counts.organizations,
            active_orgs: counts.active_organizations,
            total_employees: counts.non_admin_employees,
            total_templates: counts.templates,
            total_surveys: counts.surveys,
            pending_invites,
            total_responses: counts.responses,
        },
        recent_activity: recent
            .into_iter()
            .map(|r| RecentActivity {
                id: r.response.id,
                employee_name: r.employee_name,
                employee_email: r.employee_email,
                survey_title: r.survey_title,
                submitted_at: r.response.submitted_at,
            })
            .collect(),
    }))
}

#[derive(Debug, Serialize)]
pub struct UserMarks {
    pub id: Uuid,
    pub employee_name: Option<String>,
    pub employee_email: Option<String>,
    pub survey_title: Option<String>,
    pub department_name: Option<String>,
    pub present_creativity_total: i32,
    pub present_morality_total: i32,
    pub future_creativity_total: i32,
    pub future_morality_total: i32,
    pub total_marks: i32,
    pub submitted_at: chrono::DateTime<chrono::Utc>,
}

impl From<ResponseWithContext> for UserMarks {
    fn from(r: ResponseWithContext) -> Self {
        let response = r.response;
        UserMarks {
            id: response.id,
            employee_name: r.employee_name,
            employee_email: r.employee_email,
            survey_title: r.survey_title,
            department_name: r.department_name,
            present_creativity_total: response.present_creativity_total,
            present_morality_total: response.present_morality_total,
            future_creativity_total: response.future_creativity_total,
            future_morality_total: response.future_morality_total,
            total_marks: response.present_creativity_total
                + response.present_morality_total
                + response.future_creativity_total
                + response.future_morality_total,
            submitted_at: response.submitted_at,
        }
    }
}

/// Per-response mark totals for an organization. Marks are admin-only.
#[utoipa::path(
    get,
    path = "/api/admin/organizations/{id}/user-marks",
    tag = "admin",
    responses((status = 200))
)]
#[tracing::instrument(skip(state))]
pub async fn org_user_marks(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let responses = state
        .db
        .responses
        .list_submitted_by_org_with_context(id)
        .await?;
    let marks: Vec<UserMarks> = responses.into_iter().map(Into::into).collect();
    Ok(Json(marks))
}

/// Full response detail, marks included.
#[utoipa::path(
    get,
    path = "/api/admin/responses/{id}",
    tag = "admin",
    responses((status = 200))
)]
#[tracing::instrument(skip(state))]
pub async fn get_response(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ResponseWithContext>, HttpAppError> {
    let response = state
        .db
        .responses
        .get_with_context(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Response not found".to_string()))?;
    Ok(Json(response))
}

#[derive(Debug, Serialize)]
pub struct UserSurveyResult {
    pub id: Uuid,
    pub survey_title: Option<String>,
    pub creativity_marks: i32,
    pub morality_marks: i32,
    pub total_marks: i32,
    pub submitted_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize)]
pub struct UserDetailSummary {
    pub total_surveys: usize,
    pub total_creativity_marks: i32,
    pub total_morality_marks: i32,
    pub total_marks: i32,
    pub average_creativity: i32,
    pub average_morality: i32,
}

#[derive(Debug, Serialize)]
pub struct UserDetail {
    pub user: Employee,
    pub survey_results: Vec<UserSurveyResult>,
    pub summary: UserDetailSummary,
}

/// One employee with all their submitted results and cross-survey totals.
#[utoipa::path(get, path = "/api/admin/users/{id}", tag = "admin", responses((status = 200)))]
#[tracing::instrument(skip(state))]
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let user = state
        .db
        .employees
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let responses = state.db.responses.list_submitted_by_employee(id).await?;

    let mut total_creativity = 0;
    let mut total_morality = 0;
    let survey_results: Vec<UserSurveyResult> = responses
        .into_iter()
        .map(|r| {
            let creativity =
                r.response.present_creativity_total + r.response.future_creativity_total;
            let morality = r.response.present_morality_total + r.response.future_morality_total;
            total_creativity += creativity;
            total_morality += morality;
            UserSurveyResult {
                id: r.response.id,
                survey_title: r.survey_title,
                creativity_marks: creativity,
                morality_marks: morality,
                total_marks: creativity + morality,
                submitted_at: r.response.submitted_at,
            }
        })
        .collect();

    let count = survey_results.len();
    let average = |total: i32| -> i32 {
        if count == 0 {
            0
        } else {
            (f64::from(total) / count as f64).round() as i32
        }
    };

    Ok(Json(UserDetail {
        summary: UserDetailSummary {
            total_surveys: count,
            total_creativity_marks: total_creativity,
            total_morality_marks: total_morality,
            total_marks: total_creativity + total_morality,
            average_creativity: average(total_creativity),
            average_morality: average(total_morality),
        },
        user,
        survey_results,
    }))
}
