//! API request and response types

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SelectModelRequest {
    pub model: String,
}

#[derive(Debug, Deserialize)]
pub struct SelectThemeRequest {
    pub theme: String,
}

/// Recorded speech, base64-encoded
#[derive(Debug, Deserialize)]
pub struct SpeechRequest {
    pub audio: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub feedback: String,
}

#[derive(Debug, Deserialize)]
pub struct RatingRequest {
    pub rating: u8,
}

/// Uploaded file with base64-encoded contents
#[derive(Debug, Deserialize)]
pub struct UploadRequest {
    pub name: String,
    #[serde(default)]
    pub media_type: Option<String>,
    pub data: String,
}

/// Model metadata for the picker
#[derive(Debug, Serialize)]
pub struct ModelInfo {
    pub label: &'static str,
    pub id: &'static str,
    pub description: &'static str,
    pub context_window: usize,
    /// Whether a provider is configured for this model
    pub available: bool,
}

#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub models: Vec<ModelInfo>,
    pub default: &'static str,
    pub selected: &'static str,
}

#[derive(Debug, Serialize)]
pub struct QuickPromptsResponse {
    pub prompts: &'static [&'static str],
    pub greeting: &'static str,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
