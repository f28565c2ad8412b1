//! Application state.
//!
//! All repositories and outbound services are constructed once at startup
//! and injected into handlers through `Arc<AppState>`. Optional services
//! (mail, OAuth, chat) are `None` when unconfigured and the affected
//! endpoints degrade per the error contract.

use quadra_core::Config;
use quadra_db::{
    AnalyticsRepository, AssignmentRepository, DepartmentRepository, EmployeeRepository,
    InviteRepository, OrganizationRepository, OtpRepository, ResponseRepository, SurveyRepository,
    TicketRepository,
};
use quadra_services::{ChatService, EmailService, GoogleOAuthService};
use sqlx::PgPool;
use std::sync::Arc;

use crate::auth::jwt::JwtService;

/// Database pool and all repositories.
#[derive(Clone)]
pub struct DbState {
    pub pool: PgPool,
    pub organizations: OrganizationRepository,
    pub departments: DepartmentRepository,
    pub employees: EmployeeRepository,
    pub invites: InviteRepository,
    pub otps: OtpRepository,
    pub surveys: SurveyRepository,
    pub assignments: AssignmentRepository,
    pub responses: ResponseRepository,
    pub tickets: TicketRepository,
    pub analytics: AnalyticsRepository,
}

impl DbState {
    pub fn new(pool: PgPool) -> Self {
        Self {
            organizations: OrganizationRepository::new(pool.clone()),
            departments: DepartmentRepository::new(pool.clone()),
            employees: EmployeeRepository::new(pool.clone()),
            invites: InviteRepository::new(pool.clone()),
            otps: OtpRepository::new(pool.clone()),
            surveys: SurveyRepository::new(pool.clone()),
            assignments: AssignmentRepository::new(pool.clone()),
            responses: ResponseRepository::new(pool.clone()),
            tickets: TicketRepository::new(pool.clone()),
            analytics: AnalyticsRepository::new(pool.clone()),
            pool,
        }
    }
}

/// Main application state: aggregates repositories, services and config.
#[derive(Clone)]
pub struct AppState {
    pub db: DbState,
    pub jwt: JwtService,
    pub email: Option<EmailService>,
    pub chat: Option<ChatService>,
    pub google: Option<GoogleOAuthService>,
    pub config: Config,
    pub is_production: bool,
}

impl axum::extract::FromRef<Arc<AppState>> for DbState {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.db.clone()
    }
}

fn _assert_app_state_send_sync() {
    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}
    assert_send::<AppState>();
    assert_sync::<AppState>();
}
