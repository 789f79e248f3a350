//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the pipeline and runtime with mock
//! implementations.

use crate::llm::{ChatModel, LlmError, LlmRequest, LlmResponse};
use crate::search::SearchError;
use crate::speech::SpeechError;
use async_trait::async_trait;

/// Client for chat completions against a chosen model
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn complete(
        &self,
        model: ChatModel,
        request: &LlmRequest,
    ) -> Result<LlmResponse, LlmError>;
}

/// Finds web links related to a query
#[async_trait]
pub trait ReferenceFinder: Send + Sync {
    /// Return at most `limit` absolute URLs
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>, SearchError>;
}

/// Turns recorded audio into text
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    async fn recognize(&self, audio: &[u8]) -> Result<String, SpeechError>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: ModelClient + ?Sized> ModelClient for Arc<T> {
    async fn complete(
        &self,
        model: ChatModel,
        request: &LlmRequest,
    ) -> Result<LlmResponse, LlmError> {
        (**self).complete(model, request).await
    }
}

#[async_trait]
impl<T: ReferenceFinder + ?Sized> ReferenceFinder for Arc<T> {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>, SearchError> {
        (**self).search(query, limit).await
    }
}

#[async_trait]
impl<T: SpeechRecognizer + ?Sized> SpeechRecognizer for Arc<T> {
    async fn recognize(&self, audio: &[u8]) -> Result<String, SpeechError> {
        (**self).recognize(audio).await
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

use crate::llm::ModelRegistry;
use crate::search::DuckDuckGoSearch;
use crate::speech::WhisperTranscriber;
use std::sync::Arc;

/// Adapter to use `ModelRegistry` as `ModelClient`
pub struct RegistryModelClient {
    registry: Arc<ModelRegistry>,
}

impl RegistryModelClient {
    pub fn new(registry: Arc<ModelRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl ModelClient for RegistryModelClient {
    async fn complete(
        &self,
        model: ChatModel,
        request: &LlmRequest,
    ) -> Result<LlmResponse, LlmError> {
        let llm = self
            .registry
            .get(model)
            .or_else(|| self.registry.default())
            .ok_or_else(|| LlmError::auth("No model service configured; set GROQ_API_KEY"))?;
        tracing::debug!(
            model = llm.model_id(),
            context_window = llm.context_window(),
            "Dispatching completion"
        );
        llm.complete(request).await
    }
}

#[async_trait]
impl ReferenceFinder for DuckDuckGoSearch {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>, SearchError> {
        DuckDuckGoSearch::search(self, query, limit).await
    }
}

#[async_trait]
impl SpeechRecognizer for WhisperTranscriber {
    async fn recognize(&self, audio: &[u8]) -> Result<String, SpeechError> {
        self.transcribe(audio).await
    }
}
