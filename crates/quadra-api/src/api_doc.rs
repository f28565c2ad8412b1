//! OpenAPI documentation, served at /api/openapi.json with a RapiDoc UI
//! under /docs.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use quadra_core::models;
use quadra_core::scoring;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Quadra API",
        version = "0.1.0",
        description = "Multi-tenant survey administration backend: organizations, invite-driven onboarding, survey assignment, scoring, reporting, and support."
    ),
    paths(
        handlers::health::health_check,
        handlers::auth::login_send_otp,
        handlers::auth::login_verify_otp,
        handlers::auth::resend_otp,
        handlers::auth::verify_invite,
        handlers::auth::signup_send_otp,
        handlers::auth::signup_verify_otp,
        handlers::auth::google_login,
        handlers::auth::google_callback,
        handlers::auth::me,
        handlers::admin::create_organization,
        handlers::admin::resend_ceo_invite,
        handlers::admin::list_organizations,
        handlers::admin::get_organization,
        handlers::admin::create_template,
        handlers::admin::list_templates,
        handlers::admin::get_template,
        handlers::admin::update_template,
        handlers::admin::delete_template,
        handlers::admin::list_invites,
        handlers::admin::dashboard,
        handlers::admin::org_user_marks,
        handlers::admin::get_response,
        handlers::admin::get_user,
        handlers::ceo::dashboard,
        handlers::ceo::create_department,
        handlers::ceo::list_departments,
        handlers::ceo::department_employees,
        handlers::ceo::invite_employee,
        handlers::ceo::batch_invite,
        handlers::ceo::resend_invite,
        handlers::ceo::list_employees,
        handlers::ceo::delete_employee,
        handlers::ceo::survey_from_template,
        handlers::ceo::create_survey,
        handlers::ceo::list_surveys,
        handlers::ceo::delete_survey,
        handlers::ceo::assign_survey,
        handlers::ceo::sync_assignments,
        handlers::ceo::survey_analytics,
        handlers::user::dashboard,
        handlers::user::get_survey,
        handlers::user::save_draft,
        handlers::user::submit_survey,
        handlers::user::history,
        handlers::surveys::list_templates,
        handlers::surveys::clone_template,
        handlers::analytics::global_analytics,
        handlers::analytics::organization_analytics,
        handlers::reports::organization_report,
        handlers::reports::survey_report,
        handlers::support::create_ticket,
        handlers::support::list_tickets,
        handlers::support::get_ticket,
        handlers::support::add_message,
        handlers::support::admin_list_tickets,
        handlers::support::admin_update_ticket,
        handlers::chatbot::chat,
        handlers::chatbot::quick_replies,
    ),
    components(schemas(
        error::ErrorResponse,
        models::Organization,
        models::OrgStatus,
        models::Department,
        models::Employee,
        models::Role,
        models::InviteStatus,
        models::InviteLog,
        models::InviteLogStatus,
        models::Otp,
        models::OtpPurpose,
        models::Survey,
        models::SurveyStatus,
        models::Question,
        models::QuestionOption,
        models::SurveyForRespondent,
        models::QuestionForRespondent,
        models::SurveyAssignment,
        models::AssignmentStatus,
        models::AnswerSelection,
        models::Answer,
        models::SurveyResponse,
        models::SupportTicket,
        models::TicketMessage,
        models::TicketWithMessages,
        models::TicketCategory,
        models::TicketPriority,
        models::TicketStatus,
        scoring::Band,
        scoring::Quadrant,
        scoring::AspectScore,
        scoring::ScoreCard,
    )),
    tags(
        (name = "health"),
        (name = "auth"),
        (name = "admin"),
        (name = "ceo"),
        (name = "user"),
        (name = "surveys"),
        (name = "analytics"),
        (name = "reports"),
        (name = "support"),
        (name = "chatbot"),
    )
)]
pub struct ApiDoc;

pub fn openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
