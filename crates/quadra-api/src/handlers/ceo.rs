//! CEO routes: departments, employee invites, org surveys, assignment
//! fan-out, and survey analytics. Every operation is scoped to the caller's
//! own organization; client-supplied org ids are never accepted.

use crate::auth::models::AuthContext;
use crate::error::{HttpAppError, ValidatedJson};
use crate::handlers::surveys::{questions_from_inputs, QuestionInput};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use quadra_core::models::{
    AssignmentStatus, Department, Employee, InviteStatus, Survey, SurveyAssignment, SurveyStatus,
};
use quadra_core::scoring::completion_rate;
use quadra_core::AppError;
use quadra_db::{DepartmentEmployeeCounts, EmployeeWithDepartment};
use quadra_services::generate_invite_token;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

fn valid_email(email: &str) -> bool {
    let email = email.trim();
    !email.is_empty()
        && email.contains('@')
        && email.split('@').nth(1).is_some_and(|d| d.contains('.'))
}

// ---- Dashboard ----

#[derive(Debug, Serialize, ToSchema)]
pub struct CeoDashboardStats {
    pub total_employees: i64,
    pub pending_invites: i64,
    pub total_departments: i64,
    pub total_surveys: i64,
    pub completion_rate: i64,
}

#[derive(Debug, Serialize)]
pub struct DepartmentCompletion {
    pub id: Uuid,
    pub name: String,
    pub employees: i64,
    pub total: i64,
    pub completed: i64,
    pub rate: i64,
}

#[derive(Debug, Serialize)]
pub struct CeoDashboard {
    pub stats: CeoDashboardStats,
    pub department_stats: Vec<DepartmentCompletion>,
    pub recent_surveys: Vec<Survey>,
}

/// Org overview: headline stats and per-department completion.
#[utoipa::path(get, path = "/api/ceo/dashboard", tag = "ceo", responses((status = 200)))]
#[tracing::instrument(skip(state, ctx))]
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
) -> Result<impl IntoResponse, HttpAppError> {
    let org_id = ctx.require_org().map_err(HttpAppError::from)?;

    let (accepted, pending) = state.db.analytics.org_employee_split(org_id).await?;
    let counts = state.db.analytics.org_counts(org_id).await?;
    let departments = state.db.departments.list_by_org(org_id).await?;
    let surveys = state.db.surveys.list_by_org(org_id).await?;

    let mut department_stats = Vec::with_capacity(departments.len());
    for dept in &departments {
        let dept_counts = state.db.analytics.department_counts(dept.id).await?;
        department_stats.push(DepartmentCompletion {
            id: dept.id,
            name: dept.name.clone(),
            employees: dept_counts.accepted_employees,
            total: dept_counts.assignments,
            completed: dept_counts.completed,
            rate: completion_rate(dept_counts.completed, dept_counts.assignments),
        });
    }

    Ok(Json(CeoDashboard {
        stats: CeoDashboardStats {
            total_employees: accepted,
            pending_invites: pending,
            total_departments: departments.len() as i64,
            total_surveys: counts.surveys,
            completion_rate: completion_rate(counts.completed, counts.assignments),
        },
        department_stats,
        recent_surveys: surveys.into_iter().take(5).collect(),
    }))
}

// ---- Departments ----

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateDepartmentRequest {
    pub name: String,
}

/// Create a department in the caller's org.
#[utoipa::path(
    post,
    path = "/api/ceo/departments",
    tag = "ceo",
    responses((status = 201, body = Department))
)]
#[tracing::instrument(skip(state, ctx, request))]
pub async fn create_department(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    ValidatedJson(request): ValidatedJson<CreateDepartmentRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let org_id = ctx.require_org().map_err(HttpAppError::from)?;
    let name = request.name.trim();
    if name.is_empty() {
        return Err(AppError::InvalidInput("Department name is required".to_string()).into());
    }

    let dept = state.db.departments.create(org_id, name).await?;
    Ok((StatusCode::CREATED, Json(dept)))
}

/// Departments of the org with per-status employee counts.
#[utoipa::path(get, path = "/api/ceo/departments", tag = "ceo", responses((status = 200)))]
#[tracing::instrument(skip(state, ctx))]
pub async fn list_departments(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
) -> Result<Json<Vec<DepartmentEmployeeCounts>>, HttpAppError> {
    let org_id = ctx.require_org().map_err(HttpAppError::from)?;
    let departments = state.db.departments.list_with_counts(org_id).await?;
    Ok(Json(departments))
}

#[derive(Debug, Serialize)]
pub struct DepartmentEmployees {
    pub department: Department,
    pub employees: Vec<Employee>,
}

/// User-role employees of one department.
#[utoipa::path(
    get,
    path = "/api/ceo/departments/{id}/employees",
    tag = "ceo",
    responses((status = 200))
)]
#[tracing::instrument(skip(state, ctx))]
pub async fn department_employees(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let org_id = ctx.require_org().map_err(HttpAppError::from)?;
    let department = state
        .db
        .departments
        .get(org_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Department not found".to_string()))?;

    let employees = state.db.employees.list_users_by_department(id).await?;
    Ok(Json(DepartmentEmployees {
        department,
        employees,
    }))
}

// ---- Employee invites ----

#[derive(Debug, Deserialize, ToSchema)]
pub struct InviteRequest {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub department_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct InviteResponse {
    pub employee: Employee,
    pub message: String,
}

/// Invite one employee. Role, org and department are locked at this point.
#[utoipa::path(post, path = "/api/ceo/invite", tag = "ceo", responses((status = 201)))]
#[tracing::instrument(skip(state, ctx, request))]
pub async fn invite_employee(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    ValidatedJson(request): ValidatedJson<InviteRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let org_id = ctx.require_org().map_err(HttpAppError::from)?;
    let email = request.email.trim().to_lowercase();
    if !valid_email(&email) {
        return Err(AppError::InvalidInput("Malformed email".to_string()).into());
    }

    if state
        .db
        .employees
        .find_accepted_by_email(&email)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("This email already has an account".to_string()).into());
    }
    if state.db.invites.find_sent_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict(
            "An invitation is already pending for this email".to_string(),
        )
        .into());
    }

    let department = match request.department_id {
        Some(department_id) => Some(
            state
                .db
                .departments
                .get(org_id, department_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Department not found".to_string()))?,
        ),
        None => None,
    };
    let org = state
        .db
        .organizations
        .get(org_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Organization not found".to_string()))?;

    let token = generate_invite_token();
    let employee = state
        .db
        .employees
        .invite_user(
            request.name.as_deref().unwrap_or("Employee"),
            &email,
            org_id,
            request.department_id,
            ctx.employee.id,
            token,
        )
        .await?;

    let email_service = state
        .email
        .as_ref()
        .ok_or_else(|| AppError::Email("Mail transport is not configured".to_string()))?;
    email_service
        .send_user_invite(
            &email,
            token,
            &org.name,
            department.as_ref().map(|d| d.name.as_str()),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(InviteResponse {
            employee,
            message: format!("Invitation sent to {}", email),
        }),
    ))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BatchInviteRequest {
    pub employees: Vec<InviteRequest>,
}

#[derive(Debug, Serialize)]
pub struct BatchInviteOutcome {
    pub email: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BatchInviteSummary {
    pub total: usize,
    pub invited: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Debug, Serialize)]
pub struct BatchInviteResponse {
    pub results: Vec<BatchInviteOutcome>,
    pub summary: BatchInviteSummary,
    pub message: String,
}

/// Batch invite. Items are processed one at a time; each reports
/// invited/skipped/failed with a reason.
#[utoipa::path(post, path = "/api/ceo/invite/batch", tag = "ceo", responses((status = 200)))]
#[tracing::instrument(skip(state, ctx, request))]
pub async fn batch_invite(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    ValidatedJson(request): ValidatedJson<BatchInviteRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let org_id = ctx.require_org().map_err(HttpAppError::from)?;
    if request.employees.is_empty() {
        return Err(AppError::InvalidInput("No employees provided".to_string()).into());
    }

    let org = state
        .db
        .organizations
        .get(org_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Organization not found".to_string()))?;

    let total = request.employees.len();
    let mut results = Vec::with_capacity(total);
    let (mut invited, mut skipped, mut failed) = (0usize, 0usize, 0usize);

    for item in request.employees {
        let email = item.email.trim().to_lowercase();
        if !valid_email(&email) {
            results.push(BatchInviteOutcome {
                email: if email.is_empty() { "invalid".to_string() } else { email },
                status: "failed",
                reason: Some("Invalid email format".to_string()),
                name: None,
                department: None,
            });
            failed += 1;
            continue;
        }

        let outcome = invite_one(&state, &ctx, org_id, &org.name, &email, &item).await;
        match outcome {
            Ok(department_name) => {
                results.push(BatchInviteOutcome {
                    email,
                    status: "invited",
                    reason: None,
                    name: item.name.clone(),
                    department: department_name,
                });
                invited += 1;
            }
            Err(AppError::Conflict(reason)) => {
                results.push(BatchInviteOutcome {
                    email,
                    status: "skipped",
                    reason: Some(reason),
                    name: None,
                    department: None,
                });
                skipped += 1;
            }
            Err(err) => {
                tracing::warn!(email = %email, error = %err, "Batch invite item failed");
                results.push(BatchInviteOutcome {
                    email,
                    status: "failed",
                    reason: Some(err.to_string()),
                    name: None,
                    department: None,
                });
                failed += 1;
            }
        }
    }

    Ok(Json(BatchInviteResponse {
        results,
        summary: BatchInviteSummary {
            total,
            invited,
            skipped,
            failed,
        },
        message: format!(
            "Successfully invited {} employee(s). {} skipped, {} failed.",
            invited, skipped, failed
        ),
    }))
}

async fn invite_one(
    state: &Arc<AppState>,
    ctx: &AuthContext,
    org_id: Uuid,
    org_name: &str,
    email: &str,
    item: &InviteRequest,
) -> Result<Option<String>, AppError> {
    if state
        .db
        .employees
        .find_accepted_by_email(email)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(
            "User already has an active account".to_string(),
        ));
    }
    if state.db.invites.find_sent_by_email(email).await?.is_some() {
        return Err(AppError::Conflict("Invitation already pending".to_string()));
    }

    let department = match item.department_id {
        Some(department_id) => state.db.departments.get(org_id, department_id).await?,
        None => None,
    };

    let token = generate_invite_token();
    state
        .db
        .employees
        .invite_user(
            item.name.as_deref().unwrap_or("Employee"),
            email,
            org_id,
            department.as_ref().map(|d| d.id),
            ctx.employee.id,
            token,
        )
        .await?;

    let email_service = state
        .email
        .as_ref()
        .ok_or_else(|| AppError::Email("Mail transport is not configured".to_string()))?;
    email_service
        .send_user_invite(
            email,
            token,
            org_name,
            department.as_ref().map(|d| d.name.as_str()),
        )
        .await?;

    Ok(department.map(|d| d.name))
}

/// Rotate and resend a pending employee invite.
#[utoipa::path(
    post,
    path = "/api/ceo/invite/{id}/resend",
    tag = "ceo",
    responses((status = 200))
)]
#[tracing::instrument(skip(state, ctx))]
pub async fn resend_invite(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let org_id = ctx.require_org().map_err(HttpAppError::from)?;

    let employee = state
        .db
        .employees
        .get_user_in_org(org_id, id)
        .await?
        .filter(|e| e.invite_status == InviteStatus::Pending)
        .ok_or_else(|| {
            AppError::NotFound("Employee not found or already accepted".to_string())
        })?;

    let org = state
        .db
        .organizations
        .get(org_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Organization not found".to_string()))?;
    let department = match employee.department_id {
        Some(department_id) => state.db.departments.get_by_id(department_id).await?,
        None => None,
    };

    let token = generate_invite_token();
    state
        .db
        .employees
        .rotate_user_invite(employee.id, &employee.email, token)
        .await?;

    let email_service = state
        .email
        .as_ref()
        .ok_or_else(|| AppError::Email("Mail transport is not configured".to_string()))?;
    email_service
        .send_user_invite(
            &employee.email,
            token,
            &org.name,
            department.as_ref().map(|d| d.name.as_str()),
        )
        .await?;

    Ok(Json(serde_json::json!({
        "message": "Invitation resent successfully"
    })))
}

// ---- Employees ----

/// User-role employees of the org with department names.
#[utoipa::path(get, path = "/api/ceo/employees", tag = "ceo", responses((status = 200)))]
#[tracing::instrument(skip(state, ctx))]
pub async fn list_employees(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
) -> Result<Json<Vec<EmployeeWithDepartment>>, HttpAppError> {
    let org_id = ctx.require_org().map_err(HttpAppError::from)?;
    let employees = state.db.employees.list_users_by_org(org_id).await?;
    Ok(Json(employees))
}

/// Remove an employee and all their assignments, responses, and invites.
#[utoipa::path(
    delete,
    path = "/api/ceo/employees/{id}",
    tag = "ceo",
    responses((status = 200))
)]
#[tracing::instrument(skip(state, ctx))]
pub async fn delete_employee(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let org_id = ctx.require_org().map_err(HttpAppError::from)?;

    let employee = state
        .db
        .employees
        .get_user_in_org(org_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Employee not found".to_string()))?;

    state
        .db
        .employees
        .delete_cascade(employee.id, &employee.email)
        .await?;

    Ok(Json(serde_json::json!({
        "message": "Employee deleted successfully"
    })))
}

// ---- Surveys ----

#[derive(Debug, Deserialize, ToSchema)]
pub struct FromTemplateRequest {
    pub template_id: Uuid,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

/// Clone a template into the org with a due date.
#[utoipa::path(
    post,
    path = "/api/ceo/surveys/from-template",
    tag = "ceo",
    responses((status = 201, body = Survey))
)]
#[tracing::instrument(skip(state, ctx, request))]
pub async fn survey_from_template(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    ValidatedJson(request): ValidatedJson<FromTemplateRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let org_id = ctx.require_org().map_err(HttpAppError::from)?;

    let template = state
        .db
        .surveys
        .get_template(request.template_id)
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
            request.due_date,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(survey)))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSurveyRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub questions: Vec<QuestionInput>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

/// Create an org survey directly.
#[utoipa::path(
    post,
    path = "/api/ceo/surveys",
    tag = "ceo",
    responses((status = 201, body = Survey))
)]
#[tracing::instrument(skip(state, ctx, request))]
pub async fn create_survey(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    ValidatedJson(request): ValidatedJson<CreateSurveyRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let org_id = ctx.require_org().map_err(HttpAppError::from)?;
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
            Some(org_id),
            ctx.employee.id,
            &questions,
            false,
            request.due_date,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(survey)))
}

#[derive(Debug, Serialize)]
pub struct AssignedDepartment {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct SurveyWithAssignments {
    #[serde(flatten)]
    pub survey: Survey,
    pub assigned_departments: Vec<AssignedDepartment>,
    pub total_assigned: i64,
    pub completed_count: i64,
}

/// Org surveys with their rollout state.
#[utoipa::path(get, path = "/api/ceo/surveys", tag = "ceo", responses((status = 200)))]
#[tracing::instrument(skip(state, ctx))]
pub async fn list_surveys(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
) -> Result<impl IntoResponse, HttpAppError> {
    let org_id = ctx.require_org().map_err(HttpAppError::from)?;
    let surveys = state.db.surveys.list_by_org(org_id).await?;

    let mut result = Vec::with_capacity(surveys.len());
    for survey in surveys {
        let departments = state.db.assignments.assigned_departments(survey.id).await?;
        let counts = state.db.analytics.survey_counts(survey.id).await?;
        result.push(SurveyWithAssignments {
            survey,
            assigned_departments: departments
                .into_iter()
                .map(|(id, name)| AssignedDepartment { id, name })
                .collect(),
            total_assigned: counts.assignments,
            completed_count: counts.completed,
        });
    }

    Ok(Json(result))
}

/// Delete an org survey and everything hanging off it.
#[utoipa::path(
    delete,
    path = "/api/ceo/surveys/{id}",
    tag = "ceo",
    responses((status = 200))
)]
#[tracing::instrument(skip(state, ctx))]
pub async fn delete_survey(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let org_id = ctx.require_org().map_err(HttpAppError::from)?;

    state
        .db
        .surveys
        .get_org_survey(org_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Survey not found".to_string()))?;

    state.db.surveys.delete_with_children(id).await?;
    Ok(Json(serde_json::json!({
        "message": "Survey deleted successfully"
    })))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignSurveyRequest {
    pub department_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct AssignSurveyResponse {
    pub assignments: Vec<SurveyAssignment>,
    pub skipped: Vec<String>,
    pub message: String,
}

/// Fan a survey out to departments: one assignment per user-role employee
/// (any invite status) not already assigned. Notification mail goes only to
/// accepted employees among the newly assigned, best-effort. The survey
/// flips to active.
#[utoipa::path(
    post,
    path = "/api/ceo/surveys/{id}/assign",
    tag = "ceo",
    responses((status = 200))
)]
#[tracing::instrument(skip(state, ctx, request))]
pub async fn assign_survey(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<AssignSurveyRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let org_id = ctx.require_org().map_err(HttpAppError::from)?;

    let survey = state
        .db
        .surveys
        .get_org_survey(org_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Survey not found".to_string()))?;

    let mut assignments = Vec::new();
    let mut skipped = Vec::new();

    for department_id in &request.department_ids {
        // Departments outside the caller's org are silently skipped.
        if state
            .db
            .departments
            .get(org_id, *department_id)
            .await?
            .is_none()
        {
            tracing::warn!(department_id = %department_id, "Assign skipped unknown department");
            continue;
        }

        let employees = state
            .db
            .employees
            .list_users_by_department(*department_id)
            .await?;

        for employee in employees {
            let created = state
                .db
                .assignments
                .create_if_missing(
                    survey.id,
                    org_id,
                    Some(*department_id),
                    employee.id,
                    survey.due_date,
                )
                .await?;

            match created {
                Some(assignment) => {
                    if employee.invite_status == InviteStatus::Accepted {
                        if let Some(email) = &state.email {
                            if let Err(err) = email
                                .send_survey_notification(
                                    &employee.email,
                                    &survey.title,
                                    survey.due_date,
                                )
                                .await
                            {
                                tracing::warn!(
                                    email = %employee.email,
                                    error = %err,
                                    "Survey notification email failed"
                                );
                            }
                        }
                    }
                    assignments.push(assignment);
                }
                None => skipped.push(employee.email),
            }
        }
    }

    if survey.status != SurveyStatus::Active {
        state
            .db
            .surveys
            .set_status(survey.id, SurveyStatus::Active)
            .await?;
    }

    let message = format!("Survey assigned to {} employees", assignments.len());
    Ok(Json(AssignSurveyResponse {
        assignments,
        skipped,
        message,
    }))
}

/// Catch-up sync: enroll employees added to already-assigned departments
/// after the fan-out.
#[utoipa::path(
    post,
    path = "/api/ceo/surveys/sync-assignments",
    tag = "ceo",
    responses((status = 200))
)]
#[tracing::instrument(skip(state, ctx))]
pub async fn sync_assignments(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
) -> Result<impl IntoResponse, HttpAppError> {
    let org_id = ctx.require_org().map_err(HttpAppError::from)?;
    let created = state.db.assignments.sync_missing_for_org(org_id).await?;
    Ok(Json(serde_json::json!({
        "message": format!("Synced {} new survey assignments", created)
    })))
}

#[derive(Debug, Serialize)]
pub struct DepartmentBreakdown {
    pub total: i64,
    pub completed: i64,
}

#[derive(Debug, Serialize)]
pub struct EmployeeCompletion {
    pub id: Option<Uuid>,
    pub name: String,
    pub email: String,
    pub department: String,
    pub status: AssignmentStatus,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct SurveyAnalytics {
    pub survey: SurveyAnalyticsHeader,
    pub total_assigned: usize,
    pub completed: usize,
    pub pending: usize,
    pub completion_rate: i64,
    pub by_department: BTreeMap<String, DepartmentBreakdown>,
    pub employees: Vec<EmployeeCompletion>,
}

#[derive(Debug, Serialize)]
pub struct SurveyAnalyticsHeader {
    pub title: String,
    pub description: Option<String>,
}

/// Completion analytics for one survey. Marks never appear here.
#[utoipa::path(
    get,
    path = "/api/ceo/surveys/{id}/analytics",
    tag = "ceo",
    responses((status = 200))
)]
#[tracing::instrument(skip(state, ctx))]
pub async fn survey_analytics(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let org_id = ctx.require_org().map_err(HttpAppError::from)?;

    let survey = state
        .db
        .surveys
        .get_org_survey(org_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Survey not found".to_string()))?;

    let assignments = state.db.assignments.list_by_survey_with_context(id).await?;

    let total = assignments.len();
    let completed = assignments
        .iter()
        .filter(|a| a.assignment.status == AssignmentStatus::Completed)
        .count();

    let mut by_department: BTreeMap<String, DepartmentBreakdown> = BTreeMap::new();
    for item in &assignments {
        let dept = item
            .department_name
            .clone()
            .unwrap_or_else(|| "Unknown".to_string());
        let entry = by_department.entry(dept).or_insert(DepartmentBreakdown {
            total: 0,
            completed: 0,
        });
        entry.total += 1;
        if item.assignment.status == AssignmentStatus::Completed {
            entry.completed += 1;
        }
    }

    let employees = assignments
        .iter()
        .map(|item| EmployeeCompletion {
            id: Some(item.assignment.employee_id),
            name: item
                .employee_name
                .clone()
                .unwrap_or_else(|| "Unknown".to_string()),
            email: item.employee_email.clone().unwrap_or_default(),
            department: item
                .department_name
                .clone()
                .unwrap_or_else(|| "Unknown".to_string()),
            status: item.assignment.status,
            completed_at: item.assignment.completed_at,
        })
        .collect();

    Ok(Json(SurveyAnalytics {
        survey: SurveyAnalyticsHeader {
            title: survey.title,
            description: survey.description,
        },
        total_assigned: total,
        completed,
        pending: total - completed,
        completion_rate: completion_rate(completed as i64, total as i64),
        by_department,
        employees,
    }))
}
