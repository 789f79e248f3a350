//! Presentation commands and their replies

use crate::ingest::{IngestError, IngestOutcome, UploadedFile};
use crate::session::{AuthError, FeedbackEntry, Theme, ValidationError};
use crate::speech::SpeechError;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::oneshot;

/// A user action forwarded by the presentation layer
#[derive(Debug)]
pub enum Command {
    Login {
        username: String,
        email: String,
        password: String,
    },
    SelectModel {
        choice: String,
    },
    SelectTheme {
        theme: String,
    },
    /// Recorded audio from the front-end, usually WAV
    StartSpeechInput {
        audio: Vec<u8>,
    },
    SubmitInput {
        text: String,
    },
    /// Re-run the pending input left behind by a failed reply
    RetryPending,
    SubmitFeedback {
        text: String,
    },
    SubmitRating {
        value: u8,
    },
    UploadFile {
        file: UploadedFile,
    },
}

impl Command {
    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Command::Login { .. } => "login",
            Command::SelectModel { .. } => "select_model",
            Command::SelectTheme { .. } => "select_theme",
            Command::StartSpeechInput { .. } => "start_speech_input",
            Command::SubmitInput { .. } => "submit_input",
            Command::RetryPending => "retry_pending",
            Command::SubmitFeedback { .. } => "submit_feedback",
            Command::SubmitRating { .. } => "submit_rating",
            Command::UploadFile { .. } => "upload_file",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommandReply {
    LoggedIn,
    ModelSelected {
        label: &'static str,
        model_id: &'static str,
    },
    ThemeSelected {
        theme: Theme,
    },
    /// A reply run was started for `input`
    Accepted {
        input: String,
    },
    FeedbackRecorded {
        entry: FeedbackEntry,
    },
    RatingRecorded {
        value: u8,
    },
    Ingested {
        outcome: IngestOutcome,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Speech(#[from] SpeechError),
    #[error(transparent)]
    Ingest(#[from] IngestError),
    #[error("A response is already being generated")]
    Busy,
    #[error("There is no pending input to retry")]
    NothingPending,
    #[error("Session runtime is not running")]
    RuntimeStopped,
}

pub type CommandResult = Result<CommandReply, CommandError>;

/// A command paired with the channel its reply goes back on
#[derive(Debug)]
pub struct CommandEnvelope {
    pub command: Command,
    pub reply: oneshot::Sender<CommandResult>,
}
