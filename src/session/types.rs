//! Session value types and errors

use super::transcript::{serialize_timestamp, Message};
use chrono::{DateTime, Local};
use serde::Serialize;
use thiserror::Error;

/// Welcome line shown while the transcript is empty
pub const GREETING: &str =
    "Hello there 👋 I'm here to assist you. Start typing or speaking to chat with the model.";

/// Canned prompts offered next to the input box
pub const QUICK_PROMPTS: &[&str] = &[
    "What's the weather like?",
    "Tell me a joke",
    "How do I make a cake?",
];

/// Colour scheme selected by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn parse(choice: &str) -> Result<Theme, ValidationError> {
        match choice.trim().to_ascii_lowercase().as_str() {
            "dark" => Ok(Theme::Dark),
            "light" => Ok(Theme::Light),
            _ => Err(ValidationError::UnknownTheme(choice.to_string())),
        }
    }
}

/// One free-text feedback submission
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedbackEntry {
    pub feedback: String,
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: DateTime<Local>,
}

/// The fixed login tuple. A placeholder check, not a security boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            username: "user".to_string(),
            email: "user@example.com".to_string(),
            password: "password123".to_string(),
        }
    }
}

impl Credentials {
    pub fn matches(&self, username: &str, email: &str, password: &str) -> bool {
        self.username == username && self.email == email && self.password == password
    }
}

/// Rejected user input; state is left unchanged
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter some text before submitting")]
    EmptyInput,
    #[error("Rating must be between 1 and 5, got {0}")]
    RatingOutOfRange(u8),
    #[error("Unknown theme: {0}")]
    UnknownTheme(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Invalid username, email, or password")]
    InvalidCredentials,
    #[error("Please log in first")]
    NotAuthenticated,
}

/// Read-only view of the whole session, for rendering
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub authenticated: bool,
    pub pending_input: Option<String>,
    pub response_in_progress: bool,
    pub messages: Vec<Message>,
    pub feedback: Vec<FeedbackEntry>,
    pub rating: Option<u8>,
    pub theme: Theme,
    pub model_label: &'static str,
    pub model_id: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub greeting: Option<&'static str>,
}
