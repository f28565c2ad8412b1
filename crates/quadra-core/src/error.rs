//! Error types module
//!
//! This module provides the core error types used throughout the Quadra
//! application. All errors are unified under the `AppError` enum which can
//! represent database, validation, authorization, and outbound-service
//! failures.
//!
//! The `Database` variant and `From<sqlx::Error>` are gated behind the `sqlx`
//! feature so that the core crate stays storage-agnostic by default.

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like auth failures
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented.
/// This trait allows errors to self-describe their HTTP response characteristics.
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "NOT_FOUND")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the client
    fn suggested_action(&self) -> Option<&'static str>;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden in production
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[cfg(not(feature = "sqlx"))]
    #[error("Database error: {0}")]
    Database(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Duplicate invite / existing account. Surfaced as 400 per the public
    /// API contract, not 409.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Email delivery failed: {0}")]
    Email(String),

    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        match self {
            AppError::InvalidInput(_) | AppError::Conflict(_) => 400,
            AppError::Unauthorized(_) => 401,
            AppError::Forbidden(_) => 403,
            AppError::NotFound(_) => 404,
            AppError::ExternalService(_) => 503,
            AppError::Database(_)
            | AppError::Email(_)
            | AppError::Internal(_)
            | AppError::InternalWithSource { .. } => 500,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::InvalidInput(_) => "INVALID_INPUT",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::Email(_) => "EMAIL_DELIVERY_FAILED",
            AppError::ExternalService(_) => "EXTERNAL_SERVICE_ERROR",
            AppError::Internal(_) | AppError::InternalWithSource { .. } => "INTERNAL_ERROR",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::Database(_) | AppError::Email(_) | AppError::ExternalService(_)
        )
    }

    fn suggested_action(&self) -> Option<&'static str> {
        match self {
            AppError::Unauthorized(_) => Some("Re-authenticate and retry"),
            AppError::ExternalService(_) => Some("Retry later"),
            _ => None,
        }
    }

    fn client_message(&self) -> String {
        match self {
            // Hide driver-level detail from clients; the message is logged.
            AppError::Database(_) => "A storage error occurred".to_string(),
            other => other.to_string(),
        }
    }

    fn is_sensitive(&self) -> bool {
        matches!(
            self,
            AppError::Database(_) | AppError::Internal(_) | AppError::InternalWithSource { .. }
        )
    }

    fn log_level(&self) -> LogLevel {
        match self {
            AppError::InvalidInput(_) | AppError::NotFound(_) | AppError::Conflict(_) => {
                LogLevel::Debug
            }
            AppError::Unauthorized(_)
            | AppError::Forbidden(_)
            | AppError::Email(_)
            | AppError::ExternalService(_) => LogLevel::Warn,
            AppError::Database(_)
            | AppError::Internal(_)
            | AppError::InternalWithSource { .. } => LogLevel::Error,
        }
    }
}

impl AppError {
    /// Short variant name used in structured log fields.
    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::Database(_) => "Database",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::Unauthorized(_) => "Unauthorized",
            AppError::Forbidden(_) => "Forbidden",
            AppError::NotFound(_) => "NotFound",
            AppError::Conflict(_) => "Conflict",
            AppError::Email(_) => "Email",
            AppError::ExternalService(_) => "ExternalService",
            AppError::Internal(_) => "Internal",
            AppError::InternalWithSource { .. } => "InternalWithSource",
        }
    }

    /// Full internal message including source chain where present.
    pub fn detailed_message(&self) -> String {
        match self {
            AppError::InternalWithSource { message, source } => {
                format!("{}: {}", message, source)
            }
            other => other.to_string(),
        }
    }
}

#[cfg(feature = "sqlx")]
impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        match err {
            SqlxError::RowNotFound => AppError::NotFound("Record not found".to_string()),
            other => AppError::Database(other),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_the_api_contract() {
        assert_eq!(AppError::InvalidInput("x".into()).http_status_code(), 400);
        // Duplicate invite / existing account is a 400, not a 409.
        assert_eq!(AppError::Conflict("dup".into()).http_status_code(), 400);
        assert_eq!(AppError::Unauthorized("t".into()).http_status_code(), 401);
        assert_eq!(AppError::Forbidden("r".into()).http_status_code(), 403);
        assert_eq!(AppError::NotFound("id".into()).http_status_code(), 404);
        assert_eq!(AppError::Internal("boom".into()).http_status_code(), 500);
        assert_eq!(
            AppError::ExternalService("ai".into()).http_status_code(),
            503
        );
    }

    #[test]
    fn internal_errors_are_sensitive() {
        assert!(AppError::Internal("secret".into()).is_sensitive());
        assert!(!AppError::NotFound("survey".into()).is_sensitive());
    }

    #[test]
    fn log_levels_match_severity() {
        assert_eq!(
            AppError::InvalidInput("x".into()).log_level(),
            LogLevel::Debug
        );
        assert_eq!(
            AppError::Unauthorized("x".into()).log_level(),
            LogLevel::Warn
        );
        assert_eq!(AppError::Internal("x".into()).log_level(), LogLevel::Error);
    }
}
