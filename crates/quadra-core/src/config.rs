//! Configuration module
//!
//! Environment-driven configuration for the API process. Everything external
//! (database, token signing, SMTP, OAuth, AI completion) is configured here
//! and injected at startup; nothing reads the environment at request time.

use std::env;

const DEFAULT_PORT: u16 = 5000;
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const JWT_EXPIRY_HOURS: i64 = 24;
const DEFAULT_FRONTEND_URL: &str = "http://localhost:3000";
const DEFAULT_CHAT_MODEL: &str = "gemini-1.5-flash";

#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub environment: String,
    pub cors_origins: Vec<String>,
    // Database
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    // Token signing
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
    // Links embedded in outbound mail and OAuth redirects
    pub frontend_url: String,
    // SMTP (optional; mail is disabled when the host is unset)
    pub smtp_host: Option<String>,
    pub smtp_port: Option<u16>,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_from: Option<String>,
    pub smtp_tls: bool,
    // Google OAuth (optional)
    pub google_client_id: Option<String>,
    pub google_client_secret: Option<String>,
    pub google_redirect_url: Option<String>,
    // Generative-AI chat completion (optional)
    pub chat_api_key: Option<String>,
    pub chat_model: String,
    // Optional platform admin seeded on startup
    pub admin_email: Option<String>,
    pub admin_name: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        // Best-effort .env loading; a missing file is not an error.
        let _ = dotenvy::dotenv();

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let config = Config {
            server_port: parse_env("PORT", DEFAULT_PORT)?,
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            cors_origins: env::var("CORS_ORIGINS")
                .unwrap_or_default()
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            database_url,
            db_max_connections: parse_env("DB_MAX_CONNECTIONS", MAX_CONNECTIONS)?,
            db_timeout_seconds: parse_env("DB_TIMEOUT_SECONDS", CONNECTION_TIMEOUT_SECS)?,
            jwt_secret,
            jwt_expiry_hours: parse_env("JWT_EXPIRY_HOURS", JWT_EXPIRY_HOURS)?,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| DEFAULT_FRONTEND_URL.to_string()),
            smtp_host: env::var("SMTP_HOST").ok(),
            smtp_port: parse_opt_env("SMTP_PORT")?,
            smtp_user: env::var("SMTP_USER").ok(),
            smtp_password: env::var("SMTP_PASSWORD").ok(),
            smtp_from: env::var("SMTP_FROM").ok(),
            smtp_tls: env::var("SMTP_TLS")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
            google_client_id: env::var("GOOGLE_CLIENT_ID").ok(),
            google_client_secret: env::var("GOOGLE_CLIENT_SECRET").ok(),
            google_redirect_url: env::var("GOOGLE_REDIRECT_URL").ok(),
            chat_api_key: env::var("CHAT_API_KEY").ok(),
            chat_model: env::var("CHAT_MODEL").unwrap_or_else(|_| DEFAULT_CHAT_MODEL.to_string()),
            admin_email: env::var("ADMIN_EMAIL").ok(),
            admin_name: env::var("ADMIN_NAME").ok(),
        };

        Ok(config)
    }

    /// Fail fast on configuration that would only surface mid-request.
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters");
        }
        if self.jwt_expiry_hours <= 0 {
            anyhow::bail!("JWT_EXPIRY_HOURS must be positive");
        }
        if self.smtp_host.is_some() && self.smtp_from.is_none() {
            anyhow::bail!("SMTP_FROM is required when SMTP_HOST is set");
        }
        if self.google_client_id.is_some() != self.google_client_secret.is_some() {
            anyhow::bail!("GOOGLE_CLIENT_ID and GOOGLE_CLIENT_SECRET must be set together");
        }
        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn mail_enabled(&self) -> bool {
        self.smtp_host.is_some()
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T, anyhow::Error> {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| anyhow::anyhow!("{} has an invalid value: {}", key, raw)),
        Err(_) => Ok(default),
    }
}

fn parse_opt_env<T: std::str::FromStr>(key: &str) -> Result<Option<T>, anyhow::Error> {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| anyhow::anyhow!("{} has an invalid value: {}", key, raw)),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            server_port: DEFAULT_PORT,
            environment: "development".to_string(),
            cors_origins: vec![],
            database_url: "postgresql://localhost/quadra".to_string(),
            db_max_connections: MAX_CONNECTIONS,
            db_timeout_seconds: CONNECTION_TIMEOUT_SECS,
            jwt_secret: "0123456789abcdef0123456789abcdef".to_string(),
            jwt_expiry_hours: JWT_EXPIRY_HOURS,
            frontend_url: DEFAULT_FRONTEND_URL.to_string(),
            smtp_host: None,
            smtp_port: None,
            smtp_user: None,
            smtp_password: None,
            smtp_from: None,
            smtp_tls: true,
            google_client_id: None,
            google_client_secret: None,
            google_redirect_url: None,
            chat_api_key: None,
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            admin_email: None,
            admin_name: None,
        }
    }

    #[test]
    fn validate_rejects_short_jwt_secret() {
        let mut config = base_config();
        config.jwt_secret = "short".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_requires_smtp_from_with_host() {
        let mut config = base_config();
        config.smtp_host = Some("smtp.example.com".to_string());
        assert!(config.validate().is_err());
        config.smtp_from = Some("Quadra <noreply@example.com>".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_requires_paired_oauth_credentials() {
        let mut config = base_config();
        config.google_client_id = Some("client-id".to_string());
        assert!(config.validate().is_err());
        config.google_client_secret = Some("client-secret".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn is_production_matches_environment() {
        let mut config = base_config();
        assert!(!config.is_production());
        config.environment = "Production".to_string();
        assert!(config.is_production());
    }
}
