//! Support ticketing: creation, threads, and the admin workflow.

use crate::auth::models::AuthContext;
use crate::error::{HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use quadra_core::models::{
    Role, TicketCategory, TicketPriority, TicketStatus, TicketWithMessages,
};
use quadra_core::AppError;
use quadra_db::{TicketFilter, TicketListItem, TicketStats};
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTicketRequest {
    pub subject: String,
    #[serde(default)]
    pub category: Option<TicketCategory>,
    #[serde(default)]
    pub priority: Option<TicketPriority>,
    pub message: String,
}

/// Open a ticket. The display number comes from a monotonic sequence; the
/// first message is part of the same transaction.
#[utoipa::path(post, path = "/api/support/tickets", tag = "support", responses((status = 200)))]
#[tracing::instrument(skip(state, ctx, request))]
pub async fn create_ticket(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    ValidatedJson(request): ValidatedJson<CreateTicketRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let subject = request.subject.trim();
    let message = request.message.trim();
    if subject.is_empty() || message.is_empty() {
        return Err(
            AppError::InvalidInput("Subject and message are required".to_string()).into(),
        );
    }

    // Admin tickets are platform-level; everyone else files under their org.
    let org_id = if ctx.role() == Role::Admin {
        None
    } else {
        ctx.employee.org_id
    };

    let ticket = state
        .db
        .tickets
        .create(
            subject,
            request.category.unwrap_or(TicketCategory::Other),
            request.priority.unwrap_or(TicketPriority::Medium),
            ctx.employee.id,
            ctx.role(),
            org_id,
            message,
        )
        .await?;

    Ok(Json(ticket))
}

/// Caller's tickets; admins see everything.
#[utoipa::path(get, path = "/api/support/tickets", tag = "support", responses((status = 200)))]
#[tracing::instrument(skip(state, ctx))]
pub async fn list_tickets(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
) -> Result<Json<Vec<TicketListItem>>, HttpAppError> {
    let tickets = if ctx.role() == Role::Admin {
        state.db.tickets.list_all(&TicketFilter::default()).await?
    } else {
        state.db.tickets.list_for_creator(ctx.employee.id).await?
    };
    Ok(Json(tickets))
}

fn check_access(ctx: &AuthContext, created_by: Uuid) -> Result<(), AppError> {
    if ctx.role() != Role::Admin && created_by != ctx.employee.id {
        return Err(AppError::Forbidden("Access denied".to_string()));
    }
    Ok(())
}

/// Ticket detail with the full message thread. Creator or admin only.
#[utoipa::path(
    get,
    path = "/api/support/tickets/{id}",
    tag = "support",
    responses((status = 200))
)]
#[tracing::instrument(skip(state, ctx))]
pub async fn get_ticket(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<TicketWithMessages>, HttpAppError> {
    let ticket = state
        .db
        .tickets
        .get_with_messages(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Ticket not found".to_string()))?;

    check_access(&ctx, ticket.ticket.created_by).map_err(HttpAppError::from)?;
    Ok(Json(ticket))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddMessageRequest {
    pub message: String,
}

/// Append a message to a ticket thread. An admin's reply on an open ticket
/// moves it to in-progress.
#[utoipa::path(
    post,
    path = "/api/support/tickets/{id}/messages",
    tag = "support",
    responses((status = 200))
)]
#[tracing::instrument(skip(state, ctx, request))]
pub async fn add_message(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<AddMessageRequest>,
) -> Result<Json<TicketWithMessages>, HttpAppError> {
    let message = request.message.trim();
    if message.is_empty() {
        return Err(AppError::InvalidInput("Message is required".to_string()).into());
    }

    let ticket = state
        .db
        .tickets
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Ticket not found".to_string()))?;
    check_access(&ctx, ticket.created_by).map_err(HttpAppError::from)?;

    state
        .db
        .tickets
        .add_message(id, ctx.employee.id, ctx.role(), message)
        .await?;

    let updated = state
        .db
        .tickets
        .get_with_messages(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Ticket not found".to_string()))?;
    Ok(Json(updated))
}

#[derive(Debug, Deserialize)]
pub struct AdminTicketQuery {
    #[serde(default)]
    pub status: Option<TicketStatus>,
    #[serde(default)]
    pub priority: Option<TicketPriority>,
}

#[derive(Debug, Serialize)]
pub struct AdminTicketsResponse {
    pub tickets: Vec<TicketListItem>,
    pub stats: TicketStats,
}

/// Admin overview: filtered ticket list plus tallies.
#[utoipa::path(
    get,
    path = "/api/support/admin/tickets",
    tag = "support",
    responses((status = 200))
)]
#[tracing::instrument(skip(state))]
pub async fn admin_list_tickets(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AdminTicketQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let filter = TicketFilter {
        status: query.status,
        priority: query.priority,
    };
    let tickets = state.db.tickets.list_all(&filter).await?;
    let stats = state.db.tickets.stats().await?;
    Ok(Json(AdminTicketsResponse { tickets, stats }))
}

/// Distinguishes an absent field from an explicit null, so PATCH can clear
/// the assignee.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTicketRequest {
    #[serde(default)]
    pub status: Option<TicketStatus>,
    #[serde(default)]
    pub priority: Option<TicketPriority>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<Uuid>)]
    pub assigned_to: Option<Option<Uuid>>,
}

/// Admin workflow update: status, priority, assignee. Resolved or closed
/// stamps resolved_at.
#[utoipa::path(
    patch,
    path = "/api/support/admin/tickets/{id}",
    tag = "support",
    responses((status = 200))
)]
#[tracing::instrument(skip(state, request))]
pub async fn admin_update_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateTicketRequest>,
) -> Result<Json<TicketWithMessages>, HttpAppError> {
    state
        .db
        .tickets
        .update(id, request.status, request.priority, request.assigned_to)
        .await?
        .ok_or_else(|| AppError::NotFound("Ticket not found".to_string()))?;

    let updated = state
        .db
        .tickets
        .get_with_messages(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Ticket not found".to_string()))?;
    Ok(Json(updated))
}
