//! Google OAuth login: consent redirect, code exchange, and profile fetch.
//!
//! Only existing employees may log in this way; there is no OAuth
//! self-signup. The API layer matches the verified email against the
//! directory and issues the same bearer token as the OTP flow.

use serde::Deserialize;
use std::time::Duration;

use quadra_core::{AppError, Config};

const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Verified profile fields we need from Google.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleProfile {
    /// Google's stable subject identifier.
    pub sub: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Clone)]
pub struct GoogleOAuthService {
    client_id: String,
    client_secret: String,
    redirect_url: String,
    client: reqwest::Client,
}

impl GoogleOAuthService {
    /// Returns `None` when the OAuth client is not configured.
    pub fn from_config(config: &Config) -> Option<Self> {
        let client_id = config.google_client_id.clone()?;
        let client_secret = config.google_client_secret.clone()?;
        let redirect_url = config.google_redirect_url.clone().unwrap_or_else(|| {
            format!(
                "http://localhost:{}/api/auth/google/callback",
                config.server_port
            )
        });
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .ok()?;
        tracing::info!(redirect_url = %redirect_url, "Google OAuth service initialized");
        Some(Self {
            client_id,
            client_secret,
            redirect_url,
            client,
        })
    }

    /// Consent-screen URL the login redirect points at.
    pub fn authorize_url(&self) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}",
            AUTH_URL,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_url),
            urlencoding::encode("openid email profile"),
        )
    }

    /// Exchange the callback code for the verified profile.
    pub async fn exchange_code(&self, code: &str) -> Result<GoogleProfile, AppError> {
        let token: TokenResponse = self
            .client
            .post(TOKEN_URL)
            .form(&[
                ("code", code),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("redirect_uri", self.redirect_url.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("OAuth token exchange failed: {}", e)))?
            .error_for_status()
            .map_err(|e| AppError::Unauthorized(format!("OAuth code rejected: {}", e)))?
            .json()
            .await
            .map_err(|e| AppError::ExternalService(format!("Invalid token response: {}", e)))?;

        let profile: GoogleProfile = self
            .client
            .get(USERINFO_URL)
            .bearer_auth(&token.access_token)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Profile fetch failed: {}", e)))?
            .error_for_status()
            .map_err(|e| AppError::ExternalService(format!("Profile fetch rejected: {}", e)))?
            .json()
            .await
            .map_err(|e| AppError::ExternalService(format!("Invalid profile response: {}", e)))?;

        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorize_url_carries_client_and_redirect() {
        let config = Config {
            server_port: 5000,
            environment: "development".to_string(),
            cors_origins: vec![],
            database_url: "postgresql://localhost/quadra".to_string(),
            db_max_connections: 5,
            db_timeout_seconds: 30,
            jwt_secret: "0123456789abcdef0123456789abcdef".to_string(),
            jwt_expiry_hours: 24,
            frontend_url: "http://localhost:3000".to_string(),
            smtp_host: None,
            smtp_port: None,
            smtp_user: None,
            smtp_password: None,
            smtp_from: None,
            smtp_tls: true,
            google_client_id: Some("client-id".to_string()),
            google_client_secret: Some("client-secret".to_string()),
            google_redirect_url: Some("https://api.example.com/api/auth/google/callback".to_string()),
            chat_api_key: None,
            chat_model: "gemini-1.5-flash".to_string(),
            admin_email: None,
            admin_name: None,
        };
        let service = GoogleOAuthService::from_config(&config).expect("oauth configured");
        let url = service.authorize_url();
        assert!(url.starts_with(AUTH_URL));
        assert!(url.contains("client_id=client-id"));
        assert!(url.contains(&urlencoding::encode(
            "https://api.example.com/api/auth/google/callback"
        ).into_owned()));
        assert!(url.contains("response_type=code"));
    }
}
