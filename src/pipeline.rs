//! Response pipeline
//!
//! Turns one user utterance into one assistant reply: record the utterance,
//! ask the model, attach web references, reveal the answer sentence by
//! sentence, then record the reply. Exclusive access is proven by the
//! `PipelinePermit` passed to [`ResponsePipeline::run`].

mod references;
mod reveal;

pub use references::format_reference_block;
pub use reveal::{IncrementalReveal, RevealChunk};

use crate::llm::{ChatModel, LlmError, LlmRequest};
use crate::runtime::{ModelClient, ReferenceFinder};
use crate::session::{expand_shortcodes, Message, PipelinePermit, Role, SessionController};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Links requested from the reference finder per reply
pub const DEFAULT_REFERENCE_LIMIT: usize = 3;

/// Pause between reveal chunks
pub const DEFAULT_REVEAL_DELAY: Duration = Duration::from_millis(300);

const SYSTEM_PREAMBLE: &str = "You are a friendly assistant. Answer conversationally and \
keep replies concise unless the user asks for detail.";

#[derive(Debug, Clone, Copy)]
pub struct PipelineSettings {
    pub reference_limit: usize,
    pub reveal_delay: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            reference_limit: DEFAULT_REFERENCE_LIMIT,
            reveal_delay: DEFAULT_REVEAL_DELAY,
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum PipelineError {
    #[error("Error: {0}")]
    Model(#[from] LlmError),
}

/// Receives pipeline progress as it happens
pub trait PipelineObserver: Send + Sync {
    /// A message was appended to the transcript
    fn on_message(&self, message: &Message);

    /// The next reveal step of the reply in progress
    fn on_reveal(&self, chunk: &RevealChunk);
}

pub struct ResponsePipeline<M, R> {
    controller: Arc<SessionController>,
    model_client: M,
    reference_finder: R,
    settings: PipelineSettings,
}

impl<M, R> ResponsePipeline<M, R>
where
    M: ModelClient,
    R: ReferenceFinder,
{
    pub fn new(
        controller: Arc<SessionController>,
        model_client: M,
        reference_finder: R,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            controller,
            model_client,
            reference_finder,
            settings,
        }
    }

    /// Run one exchange. The guard is released when `permit` drops at the end
    /// of this call, on every path.
    pub async fn run(
        &self,
        permit: PipelinePermit,
        input: &str,
        model: ChatModel,
        observer: &dyn PipelineObserver,
    ) -> Result<Message, PipelineError> {
        let _permit = permit;

        let user_message = self.controller.append_message(Role::User, input);
        observer.on_message(&user_message);

        let request = LlmRequest::single_turn(Some(SYSTEM_PREAMBLE), input);
        let response = match self.model_client.complete(model, &request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(
                    model = model.api_name(),
                    error = %e,
                    retryable = e.kind.is_retryable(),
                    "Model request failed; pending input kept for retry"
                );
                return Err(e.into());
            }
        };

        let links = self.find_references(input).await;
        let combined = format!(
            "{}{}",
            response.text,
            format_reference_block(&links, self.settings.reference_limit)
        );
        let reply = expand_shortcodes(&combined);

        self.reveal(&reply, observer).await;

        let assistant_message = self.controller.append_message(Role::Assistant, &reply);
        observer.on_message(&assistant_message);
        self.controller.clear_pending_input();

        tracing::info!(
            model = model.api_name(),
            references = links.len(),
            chars = assistant_message.content.len(),
            "Reply delivered"
        );
        Ok(assistant_message)
    }

    async fn find_references(&self, input: &str) -> Vec<String> {
        match self
            .reference_finder
            .search(input, self.settings.reference_limit)
            .await
        {
            Ok(links) => links,
            Err(e) => {
                tracing::warn!(error = %e, "Reference search failed; replying without references");
                Vec::new()
            }
        }
    }

    async fn reveal(&self, text: &str, observer: &dyn PipelineObserver) {
        let mut chunks = IncrementalReveal::new(text).peekable();
        while let Some(chunk) = chunks.next() {
            observer.on_reveal(&chunk);
            if chunks.peek().is_some() && !self.settings.reveal_delay.is_zero() {
                tokio::time::sleep(self.settings.reveal_delay).await;
            }
        }
    }
}
