//! Route configuration and setup
//!
//! One router per role area, each carrying exactly one role gate; the merged
//! protected router sits behind the bearer-token auth middleware.

use crate::auth::middleware::{auth_middleware, require_admin, require_ceo, AuthState};
use crate::handlers;
use crate::state::AppState;
use axum::{
    http::HeaderValue,
    routing::{delete, get, patch, post},
    Json, Router,
};
use quadra_core::Config;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;
    let auth_state = Arc::new(AuthState {
        jwt: state.jwt.clone(),
        employees: state.db.employees.clone(),
    });

    let public_routes = public_routes(state.clone());
    let protected_routes = protected_routes(state).layer(axum::middleware::from_fn_with_state(
        auth_state,
        auth_middleware,
    ));

    let app = public_routes
        .merge(protected_routes)
        .merge(
            utoipa_rapidoc::RapiDoc::new("/api/openapi.json")
                .path("/docs"),
        )
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    Ok(app)
}

fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let cors = if config.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins
            .iter()
            .map(|o| o.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow::anyhow!("Invalid CORS origin: {}", e))?;
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    };
    Ok(cors)
}

/// Public routes (no authentication required)
fn public_routes(state: Arc<AppState>) -> Router<()> {
    Router::new()
        .route("/api/health", get(handlers::health::health_check))
        .route(
            "/api/auth/login/send-otp",
            post(handlers::auth::login_send_otp),
        )
        .route(
            "/api/auth/login/verify-otp",
            post(handlers::auth::login_verify_otp),
        )
        .route("/api/auth/resend-otp", post(handlers::auth::resend_otp))
        .route(
            "/api/auth/verify-invite/{token}",
            get(handlers::auth::verify_invite),
        )
        .route(
            "/api/auth/signup/send-otp",
            post(handlers::auth::signup_send_otp),
        )
        .route(
            "/api/auth/signup/verify-otp",
            post(handlers::auth::signup_verify_otp),
        )
        .route("/api/auth/google", get(handlers::auth::google_login))
        .route(
            "/api/auth/google/callback",
            get(handlers::auth::google_callback),
        )
        .route("/api/chatbot/chat", post(handlers::chatbot::chat))
        .route(
            "/api/chatbot/quick-replies",
            get(handlers::chatbot::quick_replies),
        )
        .route(
            "/api/openapi.json",
            get(|| async { Json(crate::api_doc::openapi_spec()) }),
        )
        .with_state(state)
}

/// Protected routes (require authentication).
fn protected_routes(state: Arc<AppState>) -> Router<()> {
    Router::new()
        .route("/api/auth/me", get(handlers::auth::me))
        .merge(admin_routes())
        .merge(ceo_routes())
        .merge(user_routes())
        .merge(survey_routes())
        .merge(analytics_routes())
        .merge(support_routes())
        .with_state(state)
}

/// Admin-only routes.
fn admin_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/admin/organizations",
            post(handlers::admin::create_organization).get(handlers::admin::list_organizations),
        )
        .route(
            "/api/admin/organizations/{id}",
            get(handlers::admin::get_organization),
        )
        .route(
            "/api/admin/organizations/{id}/resend-invite",
            post(handlers::admin::resend_ceo_invite),
        )
        .route(
            "/api/admin/organizations/{id}/user-marks",
            get(handlers::admin::org_user_marks),
        )
        .route(
            "/api/admin/surveys/template",
            post(handlers::admin::create_template),
        )
        .route(
            "/api/admin/surveys/templates",
            get(handlers::admin::list_templates),
        )
        .route(
            "/api/admin/surveys/templates/{id}",
            get(handlers::admin::get_template)
                .put(handlers::admin::update_template)
                .delete(handlers::admin::delete_template),
        )
        .route("/api/admin/invites", get(handlers::admin::list_invites))
        .route("/api/admin/dashboard", get(handlers::admin::dashboard))
        .route(
            "/api/admin/responses/{id}",
            get(handlers::admin::get_response),
        )
        .route("/api/admin/users/{id}", get(handlers::admin::get_user))
        .merge(
            Router::new()
                .route(
                    "/api/reports/organizations/{id}",
                    get(handlers::reports::organization_report),
                )
                .route(
                    "/api/reports/surveys/{id}",
                    get(handlers::reports::survey_report),
                ),
        )
        .route_layer(axum::middleware::from_fn(require_admin))
}

/// CEO-or-admin routes, all scoped to the caller's org.
fn ceo_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/ceo/dashboard", get(handlers::ceo::dashboard))
        .route(
            "/api/ceo/departments",
            post(handlers::ceo::create_department).get(handlers::ceo::list_departments),
        )
        .route(
            "/api/ceo/departments/{id}/employees",
            get(handlers::ceo::department_employees),
        )
        .route("/api/ceo/invite", post(handlers::ceo::invite_employee))
        .route("/api/ceo/invite/batch", post(handlers::ceo::batch_invite))
        .route(
            "/api/ceo/invite/{id}/resend",
            post(handlers::ceo::resend_invite),
        )
        .route("/api/ceo/employees", get(handlers::ceo::list_employees))
        .route(
            "/api/ceo/employees/{id}",
            delete(handlers::ceo::delete_employee),
        )
        .route(
            "/api/ceo/surveys/templates",
            get(handlers::surveys::list_templates),
        )
        .route(
            "/api/ceo/surveys/from-template",
            post(handlers::ceo::survey_from_template),
        )
        .route(
            "/api/ceo/surveys",
            post(handlers::ceo::create_survey).get(handlers::ceo::list_surveys),
        )
        .route(
            "/api/ceo/surveys/sync-assignments",
            post(handlers::ceo::sync_assignments),
        )
        .route(
            "/api/ceo/surveys/{id}",
            delete(handlers::ceo::delete_survey),
        )
        .route(
            "/api/ceo/surveys/{id}/assign",
            post(handlers::ceo::assign_survey),
        )
        .route(
            "/api/ceo/surveys/{id}/analytics",
            get(handlers::ceo::survey_analytics),
        )
        .route_layer(axum::middleware::from_fn(require_ceo))
}

/// Any authenticated employee.
fn user_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/user/dashboard", get(handlers::user::dashboard))
        .route("/api/user/surveys/{id}", get(handlers::user::get_survey))
        .route(
            "/api/user/surveys/{id}/draft",
            post(handlers::user::save_draft),
        )
        .route(
            "/api/user/surveys/{id}/submit",
            post(handlers::user::submit_survey),
        )
        .route("/api/user/history", get(handlers::user::history))
}

/// Shared survey routes (template browsing and cloning).
fn survey_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/surveys/templates",
            get(handlers::surveys::list_templates),
        )
        .route(
            "/api/surveys/templates/{id}/clone",
            post(handlers::surveys::clone_template),
        )
}

/// Analytics: global is admin-only, organization is ceo-or-admin.
fn analytics_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(
            Router::new()
                .route(
                    "/api/analytics/global",
                    get(handlers::analytics::global_analytics),
                )
                .route_layer(axum::middleware::from_fn(require_admin)),
        )
        .merge(
            Router::new()
                .route(
                    "/api/analytics/organization",
                    get(handlers::analytics::organization_analytics),
                )
                .route_layer(axum::middleware::from_fn(require_ceo)),
        )
}

/// Support: ticket CRUD for everyone, workflow routes for admins.
fn support_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/support/tickets",
            post(handlers::support::create_ticket).get(handlers::support::list_tickets),
        )
        .route(
            "/api/support/tickets/{id}",
            get(handlers::support::get_ticket),
        )
        .route(
            "/api/support/tickets/{id}/messages",
            post(handlers::support::add_message),
        )
        .merge(
            Router::new()
                .route(
                    "/api/support/admin/tickets",
                    get(handlers::support::admin_list_tickets),
                )
                .route(
                    "/api/support/admin/tickets/{id}",
                    patch(handlers::support::admin_update_ticket),
                )
                .route_layer(axum::middleware::from_fn(require_admin)),
        )
}
