//! Chatbot proxy: canned platform prompt plus trimmed history relayed to the
//! generative-AI completion API, and a static quick-reply list.

use crate::error::{HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use quadra_core::AppError;
use quadra_services::ChatTurn;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    #[schema(value_type = Vec<Object>)]
    pub conversation_history: Vec<ChatTurn>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ChatResponse {
    pub reply: String,
    pub timestamp: DateTime<Utc>,
}

/// Relay one message to the completion API. 503 when unconfigured.
#[utoipa::path(
    post,
    path = "/api/chatbot/chat",
    tag = "chatbot",
    responses((status = 200, body = ChatResponse))
)]
#[tracing::instrument(skip(state, request))]
pub async fn chat(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<ChatRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    if request.message.trim().is_empty() {
        return Err(AppError::InvalidInput("Message is required".to_string()).into());
    }

    let chat = state.chat.as_ref().ok_or_else(|| {
        AppError::ExternalService("AI service not configured".to_string())
    })?;

    let reply = chat
        .reply(request.message.trim(), &request.conversation_history)
        .await?;

    Ok(Json(ChatResponse {
        reply,
        timestamp: Utc::now(),
    }))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct QuickReply {
    pub id: u32,
    pub text: &'static str,
    pub icon: &'static str,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct QuickRepliesResponse {
    pub replies: Vec<QuickReply>,
}

/// Static suggested prompts.
#[utoipa::path(
    get,
    path = "/api/chatbot/quick-replies",
    tag = "chatbot",
    responses((status = 200, body = QuickRepliesResponse))
)]
pub async fn quick_replies() -> impl IntoResponse {
    Json(QuickRepliesResponse {
        replies: vec![
            QuickReply { id: 1, text: "How do I complete a survey?", icon: "📝" },
            QuickReply { id: 2, text: "What are the user roles?", icon: "👥" },
            QuickReply { id: 3, text: "How does scoring work?", icon: "📊" },
            QuickReply { id: 4, text: "How to invite employees?", icon: "✉️" },
            QuickReply { id: 5, text: "What are performance bands?", icon: "🎯" },
            QuickReply { id: 6, text: "How to create surveys?", icon: "📋" },
        ],
    })
}
