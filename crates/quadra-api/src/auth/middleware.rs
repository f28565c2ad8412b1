//! Bearer-token authentication and role gating.
//!
//! `auth_middleware` resolves the token to an Employee row and stores an
//! [`AuthContext`] in request extensions. The role middlewares apply one
//! [`RoleGate`] per route area.

use crate::auth::jwt::JwtService;
use crate::auth::models::{AuthContext, RoleGate};
use crate::error::HttpAppError;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use quadra_core::AppError;
use quadra_db::EmployeeRepository;
use std::sync::Arc;

#[derive(Clone)]
pub struct AuthState {
    pub jwt: JwtService,
    pub employees: EmployeeRepository,
}

pub async fn auth_middleware(
    State(auth_state): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
    {
        Some(token) => token,
        None => {
            return HttpAppError(AppError::Unauthorized("Access denied".to_string()))
                .into_response();
        }
    };

    let claims = match auth_state.jwt.verify(token) {
        Ok(claims) => claims,
        Err(err) => return HttpAppError(err).into_response(),
    };

    let employee = match auth_state.employees.find_by_id(claims.sub).await {
        Ok(Some(employee)) if employee.is_active => employee,
        Ok(_) => {
            return HttpAppError(AppError::Unauthorized("User not found".to_string()))
                .into_response();
        }
        Err(err) => return HttpAppError(err).into_response(),
    };

    request.extensions_mut().insert(AuthContext { employee });
    next.run(request).await
}

async fn enforce(gate: RoleGate, ctx: AuthContext, request: Request, next: Next) -> Response {
    if !gate.permits(ctx.role()) {
        return HttpAppError(AppError::Forbidden(gate.denial_message().to_string()))
            .into_response();
    }
    next.run(request).await
}

pub async fn require_admin(ctx: AuthContext, request: Request, next: Next) -> Response {
    enforce(RoleGate::AdminOnly, ctx, request, next).await
}

pub async fn require_ceo(ctx: AuthContext, request: Request, next: Next) -> Response {
    enforce(RoleGate::CeoOrAdmin, ctx, request, next).await
}
