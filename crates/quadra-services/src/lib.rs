//! Quadra outbound services
//!
//! Explicitly constructed collaborators injected into the request-handling
//! layer: SMTP mail, Google OAuth, generative-AI chat completion, and
//! credential generation. Each service is built once from config at startup;
//! optional services construct to `None` when unconfigured and the API
//! degrades accordingly.

pub mod chat;
pub mod credentials;
pub mod email;
pub mod google;

pub use chat::{ChatService, ChatTurn};
pub use credentials::{generate_invite_token, generate_otp};
pub use email::EmailService;
pub use google::{GoogleOAuthService, GoogleProfile};
