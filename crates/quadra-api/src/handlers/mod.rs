pub mod admin;
pub mod analytics;
pub mod auth;
pub mod ceo;
pub mod chatbot;
pub mod health;
pub mod reports;
pub mod support;
pub mod surveys;
pub mod user;
