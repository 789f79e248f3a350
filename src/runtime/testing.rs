//! Mock implementations for testing
//!
//! These mocks enable pipeline and runtime tests without real I/O.

use super::traits::*;
use crate::llm::{ChatModel, LlmError, LlmRequest, LlmResponse};
use crate::pipeline::{PipelineObserver, RevealChunk};
use crate::search::SearchError;
use crate::session::Message;
use crate::speech::SpeechError;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::sync::Notify;

// ============================================================================
// Mock Model Client
// ============================================================================

/// Mock model client that returns queued responses
#[derive(Default)]
pub struct MockModelClient {
    responses: Mutex<VecDeque<Result<LlmResponse, LlmError>>>,
    /// Record of all requests made
    requests: Mutex<Vec<(ChatModel, LlmRequest)>>,
}

impl MockModelClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful response
    pub fn queue_response(&self, response: LlmResponse) {
        self.responses.lock().unwrap().push_back(Ok(response));
    }

    /// Queue an error response
    pub fn queue_error(&self, error: LlmError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub fn recorded_requests(&self) -> Vec<(ChatModel, LlmRequest)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelClient for MockModelClient {
    async fn complete(
        &self,
        model: ChatModel,
        request: &LlmRequest,
    ) -> Result<LlmResponse, LlmError> {
        self.requests.lock().unwrap().push((model, request.clone()));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::network("No mock response queued")))
    }
}

// ============================================================================
// Gated Model Client (holds a reply open until released)
// ============================================================================

/// Model client whose replies block until `release` is called
pub struct GatedModelClient {
    gate: Notify,
    started: Notify,
    reply: String,
}

impl GatedModelClient {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            gate: Notify::new(),
            started: Notify::new(),
            reply: reply.into(),
        }
    }

    /// Wait until a request has reached the gate
    pub async fn wait_started(&self) {
        self.started.notified().await;
    }

    /// Let one waiting request through
    pub fn release(&self) {
        self.gate.notify_one();
    }
}

#[async_trait]
impl ModelClient for GatedModelClient {
    async fn complete(
        &self,
        _model: ChatModel,
        _request: &LlmRequest,
    ) -> Result<LlmResponse, LlmError> {
        self.started.notify_one();
        self.gate.notified().await;
        Ok(LlmResponse::text(self.reply.clone()))
    }
}

// ============================================================================
// Mock Reference Finder
// ============================================================================

pub struct MockReferenceFinder {
    result: Result<Vec<String>, SearchError>,
    pub queries: Mutex<Vec<String>>,
}

impl MockReferenceFinder {
    pub fn with_links(links: &[&str]) -> Self {
        Self {
            result: Ok(links.iter().map(ToString::to_string).collect()),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            result: Err(SearchError::Status(503)),
            queries: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ReferenceFinder for MockReferenceFinder {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>, SearchError> {
        self.queries.lock().unwrap().push(query.to_string());
        self.result
            .clone()
            .map(|links| links.into_iter().take(limit).collect())
    }
}

// ============================================================================
// Mock Speech Recognizer
// ============================================================================

#[derive(Default)]
pub struct MockSpeechRecognizer {
    results: Mutex<VecDeque<Result<String, SpeechError>>>,
}

impl MockSpeechRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_text(&self, text: impl Into<String>) {
        self.results.lock().unwrap().push_back(Ok(text.into()));
    }

    pub fn queue_error(&self, error: SpeechError) {
        self.results.lock().unwrap().push_back(Err(error));
    }
}

#[async_trait]
impl SpeechRecognizer for MockSpeechRecognizer {
    async fn recognize(&self, _audio: &[u8]) -> Result<String, SpeechError> {
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(SpeechError::UnknownAudio))
    }
}

// ============================================================================
// Gated Speech Recognizer (holds a transcription open until released)
// ============================================================================

pub struct GatedSpeechRecognizer {
    gate: Notify,
    started: Notify,
    text: String,
}

impl GatedSpeechRecognizer {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            gate: Notify::new(),
            started: Notify::new(),
            text: text.into(),
        }
    }

    pub async fn wait_started(&self) {
        self.started.notified().await;
    }

    pub fn release(&self) {
        self.gate.notify_one();
    }
}

#[async_trait]
impl SpeechRecognizer for GatedSpeechRecognizer {
    async fn recognize(&self, _audio: &[u8]) -> Result<String, SpeechError> {
        self.started.notify_one();
        self.gate.notified().await;
        Ok(self.text.clone())
    }
}

// ============================================================================
// Recording Observer
// ============================================================================

#[derive(Default)]
pub struct RecordingObserver {
    messages: Mutex<Vec<Message>>,
    reveals: Mutex<Vec<RevealChunk>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.messages.lock().unwrap().clone()
    }

    pub fn reveals(&self) -> Vec<RevealChunk> {
        self.reveals.lock().unwrap().clone()
    }
}

impl PipelineObserver for RecordingObserver {
    fn on_message(&self, message: &Message) {
        self.messages.lock().unwrap().push(message.clone());
    }

    fn on_reveal(&self, chunk: &RevealChunk) {
        self.reveals.lock().unwrap().push(chunk.clone());
    }
}
