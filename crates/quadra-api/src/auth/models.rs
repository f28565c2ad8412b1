//! Authenticated-request context and the role predicate.

use crate::error::ErrorResponse;
use axum::extract::FromRequestParts;
use axum::http::{request::Parts, StatusCode};
use axum::Json;
use quadra_core::models::{Employee, Role};
use quadra_core::AppError;
use uuid::Uuid;

/// The single authorization predicate. Route areas declare one gate; there
/// is no per-route role branching anywhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleGate {
    AdminOnly,
    /// Admin passes every gate below its own.
    CeoOrAdmin,
    Authenticated,
}

impl RoleGate {
    pub fn permits(&self, role: Role) -> bool {
        match self {
            RoleGate::AdminOnly => role == Role::Admin,
            RoleGate::CeoOrAdmin => matches!(role, Role::Admin | Role::Ceo),
            RoleGate::Authenticated => true,
        }
    }

    pub fn denial_message(&self) -> &'static str {
        match self {
            RoleGate::AdminOnly => "Admin access required",
            RoleGate::CeoOrAdmin => "CEO access required",
            RoleGate::Authenticated => "Access denied",
        }
    }
}

/// Caller context resolved by the auth middleware and stored in request
/// extensions: the full employee row behind the bearer token.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub employee: Employee,
}

impl AuthContext {
    pub fn role(&self) -> Role {
        self.employee.role
    }

    /// Tenant scope for CEO/user operations. Client-supplied org ids are
    /// never accepted; this is the only source.
    pub fn require_org(&self) -> Result<Uuid, AppError> {
        self.employee
            .org_id
            .ok_or_else(|| AppError::Forbidden("No organization scope".to_string()))
    }
}

impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or_else(|| {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(ErrorResponse {
                        error: "Missing authentication context".to_string(),
                        details: None,
                        error_type: None,
                        code: "UNAUTHORIZED".to_string(),
                        recoverable: false,
                        suggested_action: Some("Check authentication token".to_string()),
                    }),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_gate_predicate_table() {
        assert!(RoleGate::AdminOnly.permits(Role::Admin));
        assert!(!RoleGate::AdminOnly.permits(Role::Ceo));
        assert!(!RoleGate::AdminOnly.permits(Role::User));

        assert!(RoleGate::CeoOrAdmin.permits(Role::Admin));
        assert!(RoleGate::CeoOrAdmin.permits(Role::Ceo));
        assert!(!RoleGate::CeoOrAdmin.permits(Role::User));

        assert!(RoleGate::Authenticated.permits(Role::Admin));
        assert!(RoleGate::Authenticated.permits(Role::Ceo));
        assert!(RoleGate::Authenticated.permits(Role::User));
    }
}
