//! Generative-AI chat completion proxy.
//!
//! Relays a canned platform system prompt plus trimmed recent conversation
//! history to the completion API and returns the text reply. Constructed
//! once from config; absent when no API key is configured.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use quadra_core::constants::CHAT_HISTORY_TURNS;
use quadra_core::{AppError, Config};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// System prompt describing the platform to the assistant.
const SYSTEM_CONTEXT: &str = r#"You are the Quadra Survey Assistant, a helpful AI chatbot for the Quadra survey platform.

PLATFORM OVERVIEW:
Quadra is an enterprise survey management platform designed for organizations to assess creativity and morality aspects across their workforce.

KEY FEATURES:
1. Role-Based Access: three user roles - Admin, CEO, and Employee
2. Survey Templates: admins create reusable survey templates with questions
3. Survey Structure: each question has Present Aspect and Future Aspect options
4. Scoring System: options carry hidden creativity and morality marks
5. Department Management: CEOs organize employees into departments
6. Survey Assignment: CEOs assign surveys to departments
7. Analytics & Reports: reporting with performance bands (Early, Emerging, Leading) and quadrants
8. Support System: built-in ticketing for user support

USER ROLES:
- Admin: creates organizations, invites CEOs, manages survey templates, views all reports
- CEO: manages departments, invites employees, creates and assigns surveys, views organization analytics
- Employee: completes assigned surveys, views a personal dashboard, tracks progress

AUTHENTICATION:
- OTP-based email login, Google OAuth, and invite-only registration

Be friendly, concise, and helpful. If users ask about features not mentioned here, politely direct them to support."#;

/// One prior turn of the conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    /// "user" or "assistant".
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

#[derive(Clone)]
pub struct ChatService {
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl ChatService {
    /// Returns `None` when no API key is configured; the chat endpoint then
    /// reports the service as unavailable.
    pub fn from_config(config: &Config) -> Option<Self> {
        let api_key = config.chat_api_key.clone()?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .ok()?;
        tracing::info!(model = %config.chat_model, "Chat completion service initialized");
        Some(Self {
            api_key,
            model: config.chat_model.clone(),
            client,
        })
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            API_BASE,
            self.model,
            urlencoding::encode(&self.api_key)
        )
    }

    /// Send one user message with trimmed history; returns the text reply.
    pub async fn reply(&self, message: &str, history: &[ChatTurn]) -> Result<String, AppError> {
        let prompt = build_prompt(message, history);
        let request = GenerateRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(self.generate_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Chat completion failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, body = %body, "Chat completion API error");
            return Err(AppError::ExternalService(format!(
                "Chat completion API returned {}",
                status
            )));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AppError::ExternalService(format!("Invalid completion response: {}", e)))?;

        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::ExternalService("Empty completion response".to_string()))?;

        Ok(text)
    }
}

/// Flatten the system context, the last few turns, and the new message into
/// one prompt.
fn build_prompt(message: &str, history: &[ChatTurn]) -> String {
    let mut prompt = String::from(SYSTEM_CONTEXT);
    prompt.push_str("\n\n");

    let start = history.len().saturating_sub(CHAT_HISTORY_TURNS);
    for turn in &history[start..] {
        let speaker = if turn.role == "user" { "User" } else { "Assistant" };
        prompt.push_str(&format!("{}: {}\n", speaker, turn.content));
    }

    prompt.push_str(&format!("User: {}\nAssistant:", message));
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(role: &str, content: &str) -> ChatTurn {
        ChatTurn {
            role: role.to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn prompt_contains_system_context_and_message() {
        let prompt = build_prompt("How does scoring work?", &[]);
        assert!(prompt.starts_with(SYSTEM_CONTEXT));
        assert!(prompt.ends_with("User: How does scoring work?\nAssistant:"));
    }

    #[test]
    fn prompt_keeps_only_recent_history() {
        let history: Vec<ChatTurn> = (0..8)
            .map(|i| turn(if i % 2 == 0 { "user" } else { "assistant" }, &format!("turn {}", i)))
            .collect();
        let prompt = build_prompt("latest", &history);
        // Only the last five turns survive trimming.
        assert!(!prompt.contains("turn 2"));
        assert!(prompt.contains("turn 3"));
        assert!(prompt.contains("turn 7"));
        assert!(prompt.contains("Assistant: turn 7"));
    }
}
