//! Analytics: platform-wide counts for admins, org-level breakdowns and the
//! submission trend for CEOs. All figures are recomputed from current
//! collection state on every request.

use crate::auth::models::AuthContext;
use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use quadra_core::scoring::completion_rate;
use quadra_db::TrendPoint;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

const TREND_DAYS: i32 = 7;

#[derive(Debug, Serialize, ToSchema)]
pub struct GlobalStats {
    pub total_organizations: i64,
    pub total_employees: i64,
    pub total_surveys: i64,
    pub total_responses: i64,
    pub avg_completion_rate: i64,
}

#[derive(Debug, Serialize)]
pub struct OrgBreakdown {
    pub org_id: Uuid,
    pub name: String,
    pub employees: i64,
    pub surveys: i64,
    pub completion_rate: i64,
}

#[derive(Debug, Serialize)]
pub struct GlobalAnalytics {
    pub global_stats: GlobalStats,
    pub org_breakdown: Vec<OrgBreakdown>,
}

/// Platform totals and per-org completion, admin only.
#[utoipa::path(get, path = "/api/analytics/global", tag = "analytics", responses((status = 200)))]
#[tracing::instrument(skip(state))]
pub async fn global_analytics(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    let counts = state.db.analytics.global_counts().await?;
    let orgs = state.db.organizations.list_all().await?;

    let mut org_breakdown = Vec::with_capacity(orgs.len());
    for org in orgs {
        let org_counts = state.db.analytics.org_counts(org.id).await?;
        org_breakdown.push(OrgBreakdown {
            org_id: org.id,
            name: org.name,
            employees: org_counts.employees,
            surveys: org_counts.surveys,
            completion_rate: completion_rate(org_counts.completed, org_counts.assignments),
        });
    }

    Ok(Json(GlobalAnalytics {
        global_stats: GlobalStats {
            total_organizations: counts.organizations,
            total_employees: counts.employees,
            total_surveys: counts.surveys,
            total_responses: counts.responses,
            avg_completion_rate: completion_rate(counts.completed, counts.assignments),
        },
        org_breakdown,
    }))
}

#[derive(Debug, Serialize)]
pub struct DepartmentStat {
    pub dept_id: Uuid,
    pub name: String,
    pub employees: i64,
    pub assigned: i64,
    pub completed: i64,
    pub completion_rate: i64,
}

#[derive(Debug, Serialize)]
pub struct SurveyStat {
    pub survey_id: Uuid,
    pub title: String,
    pub assigned: i64,
    pub completed: i64,
    pub completion_rate: i64,
}

#[derive(Debug, Serialize)]
pub struct OrgAnalytics {
    pub department_stats: Vec<DepartmentStat>,
    pub survey_stats: Vec<SurveyStat>,
    pub completion_trend: Vec<TrendPoint>,
}

/// Org analytics for the caller's organization: per-department and
/// per-survey completion plus the 7-day submission trend.
#[utoipa::path(
    get,
    path = "/api/analytics/organization",
    tag = "analytics",
    responses((status = 200))
)]
#[tracing::instrument(skip(state, ctx))]
pub async fn organization_analytics(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
) -> Result<impl IntoResponse, HttpAppError> {
    let org_id = ctx.require_org().map_err(HttpAppError::from)?;

    let departments = state.db.departments.list_by_org(org_id).await?;
    let mut department_stats = Vec::with_capacity(departments.len());
    for dept in departments {
        let counts = state.db.analytics.department_counts(dept.id).await?;
        department_stats.push(DepartmentStat {
            dept_id: dept.id,
            name: dept.name,
            employees: counts.employees,
            assigned: counts.assignments,
            completed: counts.completed,
            completion_rate: completion_rate(counts.completed, counts.assignments),
        });
    }

    let surveys = state.db.surveys.list_by_org(org_id).await?;
    let mut survey_stats = Vec::with_capacity(surveys.len());
    for survey in surveys {
        let counts = state.db.analytics.survey_counts(survey.id).await?;
        survey_stats.push(SurveyStat {
            survey_id: survey.id,
            title: survey.title,
            assigned: counts.assignments,
            completed: counts.completed,
            completion_rate: completion_rate(counts.completed, counts.assignments),
        });
    }

    let completion_trend = state
        .db
        .analytics
        .completion_trend(org_id, TREND_DAYS)
        .await?;

    Ok(Json(OrgAnalytics {
        department_stats,
        survey_stats,
        completion_trend,
    }))
}
