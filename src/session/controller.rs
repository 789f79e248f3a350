//! Session controller
//!
//! Single owner of session-scoped state. Every field is private and changes
//! only through the methods below, so callers always see a serialized view
//! between commands.

use super::transcript::{Message, Role, Transcript};
use super::types::{
    Credentials, FeedbackEntry, SessionSnapshot, Theme, ValidationError, GREETING,
};
use crate::llm::ChatModel;
use chrono::Local;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

const MIN_RATING: u8 = 1;
const MAX_RATING: u8 = 5;

#[derive(Debug, Default)]
struct SessionFields {
    authenticated: bool,
    pending_input: Option<String>,
    transcript: Transcript,
    feedback_log: Vec<FeedbackEntry>,
    rating: Option<u8>,
    theme: Theme,
    selected_model: ChatModel,
}

/// Process-wide session state for one interactive session
#[derive(Debug)]
pub struct SessionController {
    credentials: Credentials,
    /// Pipeline guard. Test-and-set must stay atomic.
    response_in_progress: AtomicBool,
    fields: Mutex<SessionFields>,
}

impl SessionController {
    pub fn new(credentials: Credentials, default_model: ChatModel) -> Self {
        Self {
            credentials,
            response_in_progress: AtomicBool::new(false),
            fields: Mutex::new(SessionFields {
                selected_model: default_model,
                ..SessionFields::default()
            }),
        }
    }

    fn fields(&self) -> MutexGuard<'_, SessionFields> {
        self.fields.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ==================== Authentication ====================

    /// Check the login tuple. Success is permanent for the session; failure
    /// changes nothing.
    pub fn set_authenticated(&self, username: &str, email: &str, password: &str) -> bool {
        if !self.credentials.matches(username, email, password) {
            return false;
        }
        self.fields().authenticated = true;
        true
    }

    pub fn is_authenticated(&self) -> bool {
        self.fields().authenticated
    }

    // ==================== Pending input ====================

    pub fn set_pending_input(&self, text: impl Into<String>) {
        self.fields().pending_input = Some(text.into());
    }

    pub fn pending_input(&self) -> Option<String> {
        self.fields().pending_input.clone()
    }

    pub fn clear_pending_input(&self) {
        self.fields().pending_input = None;
    }

    // ==================== Pipeline guard ====================

    /// Returns true and marks a response in progress iff none was. Only
    /// reachable through `acquire_permit`, whose drop is the sole release.
    fn try_acquire_pipeline(&self) -> bool {
        self.response_in_progress
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn release_pipeline(&self) {
        self.response_in_progress.store(false, Ordering::Release);
    }

    pub fn is_response_in_progress(&self) -> bool {
        self.response_in_progress.load(Ordering::Acquire)
    }

    /// Acquire the guard as a permit that releases it when dropped
    pub fn acquire_permit(self: &Arc<Self>) -> Option<PipelinePermit> {
        self.try_acquire_pipeline().then(|| PipelinePermit {
            controller: Arc::clone(self),
        })
    }

    // ==================== Transcript ====================

    /// Expand emoji shorthand, stamp the time and append
    pub fn append_message(&self, role: Role, content: &str) -> Message {
        let mut fields = self.fields();
        let message = fields.transcript.append(Message::new(role, content)).clone();
        tracing::debug!(role = role.label(), position = fields.transcript.len(), "Message appended");
        message
    }

    // ==================== Feedback & rating ====================

    pub fn submit_feedback(&self, text: &str) -> Result<FeedbackEntry, ValidationError> {
        if text.trim().is_empty() {
            return Err(ValidationError::EmptyInput);
        }
        let entry = FeedbackEntry {
            feedback: text.to_string(),
            timestamp: Local::now(),
        };
        self.fields().feedback_log.push(entry.clone());
        Ok(entry)
    }

    /// Store the latest rating; earlier values are overwritten
    pub fn submit_rating(&self, value: u8) -> Result<(), ValidationError> {
        if !(MIN_RATING..=MAX_RATING).contains(&value) {
            return Err(ValidationError::RatingOutOfRange(value));
        }
        self.fields().rating = Some(value);
        Ok(())
    }

    // ==================== Settings ====================

    pub fn select_theme(&self, theme: Theme) {
        self.fields().theme = theme;
    }

    /// Select a model by picker label; unknown labels select the default
    pub fn select_model(&self, choice: &str) -> ChatModel {
        let model = ChatModel::from_label(choice);
        self.fields().selected_model = model;
        model
    }

    pub fn selected_model(&self) -> ChatModel {
        self.fields().selected_model
    }

    // ==================== Rendering ====================

    /// Read-only view for rendering. Before login this is the login screen:
    /// settings only, with no conversation state.
    pub fn snapshot(&self) -> SessionSnapshot {
        let fields = self.fields();
        if !fields.authenticated {
            return SessionSnapshot {
                authenticated: false,
                pending_input: None,
                response_in_progress: false,
                messages: Vec::new(),
                feedback: Vec::new(),
                rating: None,
                theme: fields.theme,
                model_label: fields.selected_model.label(),
                model_id: fields.selected_model.api_name(),
                greeting: None,
            };
        }

        let greeting = (fields.transcript.is_empty() && fields.pending_input.is_none())
            .then_some(GREETING);

        SessionSnapshot {
            authenticated: fields.authenticated,
            pending_input: fields.pending_input.clone(),
            response_in_progress: self.is_response_in_progress(),
            messages: fields.transcript.all(),
            feedback: fields.feedback_log.clone(),
            rating: fields.rating,
            theme: fields.theme,
            model_label: fields.selected_model.label(),
            model_id: fields.selected_model.api_name(),
            greeting,
        }
    }
}

#[cfg(test)]
impl SessionController {
    pub fn transcript(&self) -> Vec<Message> {
        self.fields().transcript.all()
    }

    pub fn transcript_len(&self) -> usize {
        self.fields().transcript.len()
    }

    pub fn feedback_log(&self) -> Vec<FeedbackEntry> {
        self.fields().feedback_log.clone()
    }

    pub fn rating(&self) -> Option<u8> {
        self.fields().rating
    }

    pub fn theme(&self) -> Theme {
        self.fields().theme
    }
}

/// Exclusive right to run the response pipeline. Dropping it releases the
/// guard, including on early returns and unwinding.
#[derive(Debug)]
pub struct PipelinePermit {
    controller: Arc<SessionController>,
}

impl Drop for PipelinePermit {
    fn drop(&mut self) {
        self.controller.release_pipeline();
    }
}
