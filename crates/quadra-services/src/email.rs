//! Email service for invitation, OTP, and survey-notification mail via SMTP.

use chrono::{DateTime, Utc};
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Arc;
use tracing::info;

use quadra_core::models::OtpPurpose;
use quadra_core::{AppError, Config};

/// Email service for all outbound mail. Constructed once at startup;
/// `from_config` returns `None` when SMTP is not configured, and callers
/// degrade per the error-handling contract.
#[derive(Clone)]
pub struct EmailService {
    mailer: Arc<AsyncSmtpTransport<Tokio1Executor>>,
    from: String,
    frontend_url: String,
}

impl EmailService {
    /// Create email service from config. Returns `None` if SMTP is not
    /// configured.
    pub fn from_config(config: &Config) -> Option<Self> {
        let host = config.smtp_host.as_deref()?;
        let from = config.smtp_from.clone()?;
        let port = config.smtp_port.unwrap_or(587);

        let mailer = if config.smtp_tls {
            let b = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host).ok()?;
            let b = b.port(port);
            let b = if let (Some(u), Some(p)) = (&config.smtp_user, &config.smtp_password) {
                b.credentials(Credentials::new(u.clone(), p.clone()))
            } else {
                b
            };
            tracing::info!(host = %host, port = port, "Email service initialized (SMTP with STARTTLS)");
            b.build()
        } else {
            let b = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host).port(port);
            let b = if let (Some(u), Some(p)) = (&config.smtp_user, &config.smtp_password) {
                b.credentials(Credentials::new(u.clone(), p.clone()))
            } else {
                b
            };
            tracing::info!(host = %host, port = port, "Email service initialized (SMTP)");
            b.build()
        };

        Some(Self {
            mailer: Arc::new(mailer),
            from,
            frontend_url: config.frontend_url.clone(),
        })
    }

    /// Signup link embedded in invite mail; also surfaced to the caller when
    /// delivery fails so the invite can be shared manually.
    pub fn signup_link(&self, token: uuid::Uuid) -> String {
        format!("{}/signup?token={}", self.frontend_url, token)
    }

    async fn send_html(&self, to: &str, subject: &str, body_html: String) -> Result<(), AppError> {
        let to_addr: Mailbox = to
            .parse()
            .map_err(|_| AppError::InvalidInput(format!("Invalid recipient address: {}", to)))?;
        let from_addr: Mailbox = self
            .from
            .parse()
            .map_err(|e| AppError::Email(format!("Invalid SMTP_FROM: {}", e)))?;

        let email = Message::builder()
            .from(from_addr)
            .to(to_addr)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(body_html)
            .map_err(|e| AppError::Email(e.to_string()))?;

        self.mailer
            .send(email)
            .await
            .map_err(|e| AppError::Email(e.to_string()))?;
        info!(to = %to, subject = %subject, "Email sent");
        Ok(())
    }

    /// OTP mail; subject and intro vary by purpose.
    pub async fn send_otp(
        &self,
        to: &str,
        otp: &str,
        purpose: OtpPurpose,
    ) -> Result<(), AppError> {
        let (subject, intro) = match purpose {
            OtpPurpose::Login => (
                "Your Login OTP - Quadra",
                "Use this OTP to login to your account",
            ),
            OtpPurpose::Signup => (
                "Verify Your Email - Quadra",
                "Use this OTP to verify your email and complete registration",
            ),
            OtpPurpose::Reset => (
                "Password Reset OTP - Quadra",
                "Use this OTP to reset your password",
            ),
        };

        let body = format!(
            r#"<div style="font-family: Arial, sans-serif; max-width: 500px; margin: 0 auto; padding: 20px;">
  <h2 style="text-align: center;">Quadra</h2>
  <div style="background: #f3f4f6; padding: 30px; border-radius: 10px; text-align: center;">
    <p>{intro}</p>
    <div style="font-size: 32px; letter-spacing: 8px; font-weight: bold;">{otp}</div>
    <p style="font-size: 14px;">This OTP expires in 10 minutes</p>
  </div>
  <p style="font-size: 12px; text-align: center;">If you didn't request this, please ignore this email.</p>
</div>"#
        );

        self.send_html(to, subject, body).await
    }

    /// CEO invitation (admin-initiated).
    pub async fn send_ceo_invite(
        &self,
        to: &str,
        token: uuid::Uuid,
        org_name: &str,
    ) -> Result<(), AppError> {
        let signup_url = self.signup_link(token);
        let subject = format!("You're invited as CEO of {} - Quadra", org_name);
        let body = format!(
            r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
  <h1 style="text-align: center;">Quadra</h1>
  <h2>You've been invited as CEO of {org_name}</h2>
  <p>As CEO, you will be able to manage departments, invite employees, create and assign surveys, and view analytics and reports.</p>
  <p><a href="{signup_url}">Accept Invitation &amp; Sign Up</a></p>
  <p style="font-size: 14px;">Or copy this link: {signup_url}</p>
  <p style="font-size: 12px;">This invitation expires in 7 days. If you didn't expect this, please ignore this email.</p>
</div>"#
        );
        self.send_html(to, &subject, body).await
    }

    /// Employee invitation (CEO-initiated).
    pub async fn send_user_invite(
        &self,
        to: &str,
        token: uuid::Uuid,
        org_name: &str,
        department_name: Option<&str>,
    ) -> Result<(), AppError> {
        let signup_url = self.signup_link(token);
        let subject = format!("You're invited to join {} - Quadra", org_name);
        let department_line = department_name
            .map(|d| format!("<p>Department: <strong>{}</strong></p>", d))
            .unwrap_or_default();
        let body = format!(
            r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
  <h1 style="text-align: center;">Quadra</h1>
  <h2>You've been invited to join {org_name}</h2>
  {department_line}
  <p>As a team member, you will be able to participate in organizational surveys, track your progress, and save drafts.</p>
  <p><a href="{signup_url}">Accept Invitation &amp; Sign Up</a></p>
  <p style="font-size: 14px;">Or copy this link: {signup_url}</p>
  <p style="font-size: 12px;">This invitation expires in 7 days. If you didn't expect this, please ignore this email.</p>
</div>"#
        );
        self.send_html(to, &subject, body).await
    }

    /// New-assignment notification. Callers treat failures as best-effort.
    pub async fn send_survey_notification(
        &self,
        to: &str,
        survey_title: &str,
        due_date: Option<DateTime<Utc>>,
    ) -> Result<(), AppError> {
        let subject = format!("New Survey Assigned: {}", survey_title);
        let due = due_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "No deadline".to_string());
        let body = format!(
            r#"<div style="font-family: Arial, sans-serif; max-width: 500px; margin: 0 auto; padding: 20px;">
  <h2 style="text-align: center;">Quadra</h2>
  <div style="background: #fef3c7; padding: 30px; border-radius: 10px;">
    <h3>New Survey Assigned</h3>
    <p style="font-size: 18px;"><strong>{survey_title}</strong></p>
    <p>Due Date: <strong>{due}</strong></p>
    <p><a href="{frontend}/dashboard">Go to Dashboard</a></p>
  </div>
</div>"#,
            frontend = self.frontend_url
        );
        self.send_html(to, &subject, body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn smtp_config() -> Config {
        Config {
            server_port: 5000,
            environment: "development".to_string(),
            cors_origins: vec![],
            database_url: "postgresql://localhost/quadra".to_string(),
            db_max_connections: 5,
            db_timeout_seconds: 30,
            jwt_secret: "0123456789abcdef0123456789abcdef".to_string(),
            jwt_expiry_hours: 24,
            frontend_url: "https://app.example.com".to_string(),
            smtp_host: Some("smtp.example.com".to_string()),
            smtp_port: Some(587),
            smtp_user: None,
            smtp_password: None,
            smtp_from: Some("Quadra <noreply@example.com>".to_string()),
            smtp_tls: true,
            google_client_id: None,
            google_client_secret: None,
            google_redirect_url: None,
            chat_api_key: None,
            chat_model: "gemini-1.5-flash".to_string(),
            admin_email: None,
            admin_name: None,
        }
    }

    #[test]
    fn from_config_returns_none_without_smtp_host() {
        let mut config = smtp_config();
        config.smtp_host = None;
        assert!(EmailService::from_config(&config).is_none());
    }

    #[test]
    fn signup_link_embeds_token_under_frontend_url() {
        let service = EmailService::from_config(&smtp_config()).expect("smtp configured");
        let token = uuid::Uuid::new_v4();
        assert_eq!(
            service.signup_link(token),
            format!("https://app.example.com/signup?token={}", token)
        );
    }
}
