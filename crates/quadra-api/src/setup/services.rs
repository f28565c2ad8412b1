//! Service and repository construction.

use crate::auth::jwt::JwtService;
use crate::state::{AppState, DbState};
use anyhow::Result;
use quadra_core::Config;
use quadra_services::{ChatService, EmailService, GoogleOAuthService};
use sqlx::PgPool;
use std::sync::Arc;

/// Build every repository and outbound service into the shared state.
pub async fn initialize_services(config: &Config, pool: PgPool) -> Result<Arc<AppState>> {
    let db = DbState::new(pool);

    // Optional platform admin seed, so a fresh deployment can log in.
    if let Some(admin_email) = &config.admin_email {
        let admin_name = config.admin_name.as_deref().unwrap_or("Platform Admin");
        db.employees.ensure_admin(admin_name, admin_email).await?;
    }

    let jwt = JwtService::new(&config.jwt_secret, config.jwt_expiry_hours);

    let email = EmailService::from_config(config);
    if email.is_none() {
        tracing::warn!("SMTP not configured; invite and OTP mail will fail until it is");
    }

    let chat = ChatService::from_config(config);
    if chat.is_none() {
        tracing::info!("Chat API key not configured; chatbot endpoint disabled");
    }

    let google = GoogleOAuthService::from_config(config);
    if google.is_none() {
        tracing::info!("Google OAuth not configured; OAuth login disabled");
    }

    let is_production = config.is_production();
    Ok(Arc::new(AppState {
        db,
        jwt,
        email,
        chat,
        google,
        config: config.clone(),
        is_production,
    }))
}
