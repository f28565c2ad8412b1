//! Authentication: OTP login, invite verification, signup, OAuth, /me.
//!
//! The OTP flow is the primary login for every role. An email without an
//! employee row but with an invite log materializes its employee lazily on
//! the first send-otp call; the first successful verification flips both the
//! employee and the invite to accepted and runs catch-up enrollment.

use crate::auth::models::AuthContext;
use crate::error::{HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect},
    Json,
};
use quadra_core::models::{Employee, InviteStatus, OtpPurpose, Role};
use quadra_core::AppError;
use quadra_services::generate_otp;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct SendOtpRequest {
    pub email: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ResendOtpRequest {
    pub email: String,
    #[serde(rename = "type")]
    pub purpose: OtpPurpose,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SignupSendOtpRequest {
    pub token: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SignupVerifyRequest {
    pub token: Uuid,
    pub otp: String,
    pub name: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct OAuthCallbackQuery {
    pub code: Option<String>,
}

/// Caller-facing account summary; never includes marks or hashes.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub org_id: Option<Uuid>,
}

impl From<&Employee> for UserSummary {
    fn from(employee: &Employee) -> Self {
        UserSummary {
            id: employee.id,
            name: employee.name.clone(),
            email: employee.email.clone(),
            role: employee.role,
            org_id: employee.org_id,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    pub token: String,
    pub user: UserSummary,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

fn normalize_email(email: &str) -> Result<String, AppError> {
    let email = email.trim().to_lowercase();
    if email.is_empty() {
        return Err(AppError::InvalidInput("Email is required".to_string()));
    }
    if !email.contains('@') || !email.split('@').nth(1).is_some_and(|d| d.contains('.')) {
        return Err(AppError::InvalidInput("Malformed email".to_string()));
    }
    Ok(email)
}

/// Send a login OTP. Works for every employee in the directory; an invited
/// email without an employee row gets one materialized from its newest
/// invite first.
#[utoipa::path(
    post,
    path = "/api/auth/login/send-otp",
    tag = "auth",
    responses((status = 200, body = MessageResponse))
)]
#[tracing::instrument(skip(state, request))]
pub async fn login_send_otp(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<SendOtpRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let email = normalize_email(&request.email).map_err(HttpAppError::from)?;

    let employee = match state.db.employees.find_by_email(&email).await? {
        Some(employee) => employee,
        None => {
            let invite = state
                .db
                .invites
                .find_latest_by_email(&email)
                .await?
                .ok_or_else(|| {
                    AppError::InvalidInput(
                        "No account found with this email. Please contact your administrator for an invitation."
                            .to_string(),
                    )
                })?;
            state.db.employees.materialize_from_invite(&invite).await?
        }
    };

    let otp = generate_otp();
    state
        .db
        .otps
        .issue(&employee.email, &otp, OtpPurpose::Login)
        .await?;

    let email_service = state
        .email
        .as_ref()
        .ok_or_else(|| AppError::Email("Mail transport is not configured".to_string()))?;
    email_service
        .send_otp(&employee.email, &otp, OtpPurpose::Login)
        .await?;

    Ok(Json(MessageResponse {
        message: "OTP sent to your email".to_string(),
        email: Some(employee.email),
    }))
}

/// Verify a login OTP; consumes the code and logs the employee in. A first
/// verification accepts the invite, backfills department assignments, and
/// activates the organization for a CEO.
#[utoipa::path(
    post,
    path = "/api/auth/login/verify-otp",
    tag = "auth",
    responses((status = 200, body = TokenResponse))
)]
#[tracing::instrument(skip(state, request))]
pub async fn login_verify_otp(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<VerifyOtpRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let email = normalize_email(&request.email).map_err(HttpAppError::from)?;

    state
        .db
        .otps
        .find_live(&email, &request.otp, OtpPurpose::Login)
        .await?
        .ok_or_else(|| AppError::InvalidInput("Invalid or expired OTP".to_string()))?;

    let employee = state
        .db
        .employees
        .find_by_email(&email)
        .await?
        .ok_or_else(|| AppError::InvalidInput("User not found".to_string()))?;

    // Single use: every login code for this email is gone after this.
    state.db.otps.consume(&email, OtpPurpose::Login).await?;

    let employee = if employee.invite_status == InviteStatus::Pending {
        state.db.employees.accept_on_verification(employee.id).await?
    } else {
        employee
    };

    state.db.employees.touch_last_login(employee.id).await?;

    let token = state.jwt.issue(&employee)?;
    Ok(Json(TokenResponse {
        user: UserSummary::from(&employee),
        token,
    }))
}

/// Re-issue an OTP for any purpose, invalidating prior codes first.
#[utoipa::path(
    post,
    path = "/api/auth/resend-otp",
    tag = "auth",
    responses((status = 200, body = MessageResponse))
)]
#[tracing::instrument(skip(state, request))]
pub async fn resend_otp(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<ResendOtpRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let email = normalize_email(&request.email).map_err(HttpAppError::from)?;

    let otp = generate_otp();
    state.db.otps.issue(&email, &otp, request.purpose).await?;

    let email_service = state
        .email
        .as_ref()
        .ok_or_else(|| AppError::Email("Mail transport is not configured".to_string()))?;
    email_service.send_otp(&email, &otp, request.purpose).await?;

    Ok(Json(MessageResponse {
        message: "OTP resent successfully".to_string(),
        email: None,
    }))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VerifyInviteResponse {
    pub valid: bool,
    pub email: String,
    pub role: Role,
    pub org_name: String,
    pub department_name: Option<String>,
}

/// Validate an invite token for the signup page; transitions sent -> clicked.
#[utoipa::path(
    get,
    path = "/api/auth/verify-invite/{token}",
    tag = "auth",
    responses((status = 200, body = VerifyInviteResponse))
)]
#[tracing::instrument(skip(state))]
pub async fn verify_invite(
    State(state): State<Arc<AppState>>,
    Path(token): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let invite = state
        .db
        .invites
        .find_live_by_token(token)
        .await?
        .ok_or_else(|| {
            AppError::InvalidInput("Invalid or expired invitation link".to_string())
        })?;

    // Idempotent when already clicked or accepted.
    state.db.invites.mark_clicked(invite.id).await?;

    let org_name = match invite.org_id {
        Some(org_id) => state
            .db
            .organizations
            .get(org_id)
            .await?
            .map(|o| o.name)
            .unwrap_or_else(|| "Organization".to_string()),
        None => "Organization".to_string(),
    };
    let department_name = match invite.department_id {
        Some(department_id) => state
            .db
            .departments
            .get_by_id(department_id)
            .await?
            .map(|d| d.name),
        None => None,
    };

    Ok(Json(VerifyInviteResponse {
        valid: true,
        email: invite.email,
        role: invite.role,
        org_name,
        department_name,
    }))
}

/// Send a signup OTP against a live invite token.
#[utoipa::path(
    post,
    path = "/api/auth/signup/send-otp",
    tag = "auth",
    responses((status = 200, body = MessageResponse))
)]
#[tracing::instrument(skip(state, request))]
pub async fn signup_send_otp(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<SignupSendOtpRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let invite = state
        .db
        .invites
        .find_live_by_token(request.token)
        .await?
        .ok_or_else(|| AppError::InvalidInput("Invalid or expired invitation".to_string()))?;

    if state
        .db
        .employees
        .find_accepted_by_email(&invite.email)
        .await?
        .is_some()
    {
        return Err(
            AppError::Conflict("Account already exists. Please login.".to_string()).into(),
        );
    }

    let otp = generate_otp();
    state
        .db
        .otps
        .issue(&invite.email, &otp, OtpPurpose::Signup)
        .await?;

    let email_service = state
        .email
        .as_ref()
        .ok_or_else(|| AppError::Email("Mail transport is not configured".to_string()))?;
    email_service
        .send_otp(&invite.email, &otp, OtpPurpose::Signup)
        .await?;

    Ok(Json(MessageResponse {
        message: "OTP sent to your email".to_string(),
        email: Some(invite.email),
    }))
}

/// Complete signup: verify the OTP, set name and password, accept the
/// invite, and log the new account in.
#[utoipa::path(
    post,
    path = "/api/auth/signup/verify-otp",
    tag = "auth",
    responses((status = 201, body = TokenResponse))
)]
#[tracing::instrument(skip(state, request))]
pub async fn signup_verify_otp(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<SignupVerifyRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    if request.name.trim().is_empty() {
        return Err(AppError::InvalidInput("Name is required".to_string()).into());
    }
    if request.password.len() < 8 {
        return Err(
            AppError::InvalidInput("Password must be at least 8 characters".to_string()).into(),
        );
    }

    let invite = state
        .db
        .invites
        .find_live_by_token(request.token)
        .await?
        .ok_or_else(|| AppError::InvalidInput("Invalid or expired invitation".to_string()))?;

    state
        .db
        .otps
        .find_live(&invite.email, &request.otp, OtpPurpose::Signup)
        .await?
        .ok_or_else(|| AppError::InvalidInput("Invalid or expired OTP".to_string()))?;
    state.db.otps.consume(&invite.email, OtpPurpose::Signup).await?;

    let password_hash = bcrypt::hash(&request.password, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;

    let employee = state
        .db
        .employees
        .complete_signup(&invite, request.name.trim(), &password_hash)
        .await?;

    let token = state.jwt.issue(&employee)?;
    Ok((
        StatusCode::CREATED,
        Json(TokenResponse {
            user: UserSummary::from(&employee),
            token,
        }),
    ))
}

/// Redirect to the Google consent screen.
#[utoipa::path(get, path = "/api/auth/google", tag = "auth", responses((status = 307)))]
pub async fn google_login(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    let google = state.google.as_ref().ok_or_else(|| {
        AppError::ExternalService("Google OAuth is not configured".to_string())
    })?;
    Ok(Redirect::temporary(&google.authorize_url()))
}

/// OAuth callback: exchange the code and log in an existing employee. There
/// is no OAuth self-signup; unknown emails bounce back to the login page.
#[utoipa::path(get, path = "/api/auth/google/callback", tag = "auth", responses((status = 307)))]
#[tracing::instrument(skip(state, query))]
pub async fn google_callback(
    State(state): State<Arc<AppState>>,
    Query(query): Query<OAuthCallbackQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let google = state.google.as_ref().ok_or_else(|| {
        AppError::ExternalService("Google OAuth is not configured".to_string())
    })?;
    let code = query
        .code
        .ok_or_else(|| AppError::InvalidInput("Missing authorization code".to_string()))?;

    let profile = google.exchange_code(&code).await?;

    let Some(employee) = state.db.employees.find_by_email(&profile.email).await? else {
        tracing::warn!(email = %profile.email, "OAuth login for unknown email");
        return Ok(Redirect::temporary(&format!(
            "{}/login?error=no_account",
            state.config.frontend_url
        )));
    };

    state
        .db
        .employees
        .set_google_identity(employee.id, &profile.sub)
        .await?;

    let token = state.jwt.issue(&employee)?;
    Ok(Redirect::temporary(&format!(
        "{}/auth/callback?token={}",
        state.config.frontend_url, token
    )))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    pub user: UserSummary,
}

/// Current caller's account summary.
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "auth",
    responses((status = 200, body = MeResponse))
)]
pub async fn me(ctx: AuthContext) -> Json<MeResponse> {
    Json(MeResponse {
        user: UserSummary::from(&ctx.employee),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_email_lowercases_and_trims() {
        assert_eq!(
            normalize_email("  CEO@Example.COM ").unwrap(),
            "ceo@example.com"
        );
    }

    #[test]
    fn normalize_email_rejects_garbage() {
        assert!(normalize_email("").is_err());
        assert!(normalize_email("   ").is_err());
        assert!(normalize_email("not-an-email").is_err());
        assert!(normalize_email("user@nodot").is_err());
    }
}
