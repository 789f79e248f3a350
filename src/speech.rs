//! Speech-to-text
//!
//! Audio is captured by the front-end and uploaded as WAV bytes; this module
//! turns it into text with the provider's Whisper endpoint.

use crate::llm::{LlmConfig, DEFAULT_BASE_URL};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

const TRANSCRIPTION_MODEL: &str = "whisper-large-v3-turbo";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpeechError {
    #[error("Sorry, I could not understand the audio")]
    UnknownAudio,
    #[error("Speech recognition unavailable: {0}")]
    ServiceUnavailable(String),
}

/// Whisper transcription over the `OpenAI`-compatible audio API
#[derive(Clone)]
pub struct WhisperTranscriber {
    client: Client,
    api_key: Option<String>,
    endpoint: String,
}

impl WhisperTranscriber {
    pub fn new(config: &LlmConfig) -> Result<Self, SpeechError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SpeechError::ServiceUnavailable(e.to_string()))?;

        let base = config
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/');

        Ok(Self {
            client,
            api_key: config.groq_api_key.clone(),
            endpoint: format!("{base}/audio/transcriptions"),
        })
    }

    /// Transcribe one recording
    pub async fn transcribe(&self, audio: &[u8]) -> Result<String, SpeechError> {
        if audio.is_empty() {
            return Err(SpeechError::UnknownAudio);
        }
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| SpeechError::ServiceUnavailable("GROQ_API_KEY is not set".into()))?;

        let part = Part::bytes(audio.to_vec())
            .file_name("speech.wav")
            .mime_str("audio/wav")
            .map_err(|e| SpeechError::ServiceUnavailable(e.to_string()))?;
        let form = Form::new()
            .text("model", TRANSCRIPTION_MODEL)
            .text("response_format", "json")
            .part("file", part);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| SpeechError::ServiceUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, body = %body, "Transcription request failed");
            return Err(SpeechError::ServiceUnavailable(format!("HTTP {status}")));
        }

        let transcription: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| SpeechError::ServiceUnavailable(e.to_string()))?;

        recognized_text(&transcription.text)
    }
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    #[serde(default)]
    text: String,
}

fn recognized_text(text: &str) -> Result<String, SpeechError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(SpeechError::UnknownAudio);
    }
    Ok(text.to_string())
}
