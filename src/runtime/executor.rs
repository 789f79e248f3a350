//! Session runtime executor

use super::command::{Command, CommandEnvelope, CommandError, CommandReply, CommandResult};
use super::traits::{ModelClient, ReferenceFinder, SpeechRecognizer};
use super::{NoticeLevel, UiEvent};

use crate::ingest::{ingest, UploadedFile};
use crate::pipeline::{PipelineObserver, ResponsePipeline, RevealChunk};
use crate::session::{AuthError, Message, PipelinePermit, SessionController, Theme, ValidationError};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};

/// Command loop for one session. Handles one command at a time; reply runs
/// and speech recognition are spawned so the loop stays responsive while
/// they are in flight.
pub struct SessionRuntime<M, R, S>
where
    M: ModelClient + 'static,
    R: ReferenceFinder + 'static,
    S: SpeechRecognizer + 'static,
{
    controller: Arc<SessionController>,
    pipeline: Arc<ResponsePipeline<M, R>>,
    speech: Arc<S>,
    /// Weak so the loop still ends once every `RuntimeHandle` is dropped
    command_tx: mpsc::WeakSender<CommandEnvelope>,
    command_rx: mpsc::Receiver<CommandEnvelope>,
    broadcast_tx: broadcast::Sender<UiEvent>,
}

impl<M, R, S> SessionRuntime<M, R, S>
where
    M: ModelClient + 'static,
    R: ReferenceFinder + 'static,
    S: SpeechRecognizer + 'static,
{
    pub fn new(
        controller: Arc<SessionController>,
        pipeline: ResponsePipeline<M, R>,
        speech: S,
        command_tx: mpsc::WeakSender<CommandEnvelope>,
        command_rx: mpsc::Receiver<CommandEnvelope>,
        broadcast_tx: broadcast::Sender<UiEvent>,
    ) -> Self {
        Self {
            controller,
            pipeline: Arc::new(pipeline),
            speech: Arc::new(speech),
            command_tx,
            command_rx,
            broadcast_tx,
        }
    }

    pub async fn run(mut self) {
        tracing::info!("Starting session runtime");

        while let Some(CommandEnvelope { command, reply }) = self.command_rx.recv().await {
            match self.authorize(&command) {
                Ok(()) => self.handle(command, reply),
                Err(e) => respond(command.name(), reply, Err(e)),
            }
        }

        tracing::info!("Session runtime stopped");
    }

    /// Every command but Login needs an authenticated session
    fn authorize(&self, command: &Command) -> Result<(), CommandError> {
        if matches!(command, Command::Login { .. }) || self.controller.is_authenticated() {
            Ok(())
        } else {
            Err(AuthError::NotAuthenticated.into())
        }
    }

    fn handle(&self, command: Command, reply: oneshot::Sender<CommandResult>) {
        let name = command.name();
        let result = match command {
            Command::Login {
                username,
                email,
                password,
            } => self.login(&username, &email, &password),
            Command::SelectModel { choice } => {
                let model = self.controller.select_model(&choice);
                self.publish_snapshot();
                Ok(CommandReply::ModelSelected {
                    label: model.label(),
                    model_id: model.api_name(),
                })
            }
            Command::SelectTheme { theme } => self.select_theme(&theme),
            // Answered by the recognition task once the audio is transcribed
            Command::StartSpeechInput { audio } => {
                self.spawn_recognition(audio, reply);
                return;
            }
            Command::SubmitInput { text } => self.submit_input(text),
            Command::RetryPending => self.retry_pending(),
            Command::SubmitFeedback { text } => self.submit_feedback(&text),
            Command::SubmitRating { value } => self.submit_rating(value),
            Command::UploadFile { file } => self.upload(file),
        };
        respond(name, reply, result);
    }

    fn login(&self, username: &str, email: &str, password: &str) -> CommandResult {
        if !self.controller.set_authenticated(username, email, password) {
            return Err(AuthError::InvalidCredentials.into());
        }
        tracing::info!(username = %username, "User logged in");
        self.notice(NoticeLevel::Info, "Login successful!");
        self.publish_snapshot();
        Ok(CommandReply::LoggedIn)
    }

    fn select_theme(&self, choice: &str) -> CommandResult {
        let theme = Theme::parse(choice)?;
        self.controller.select_theme(theme);
        self.publish_snapshot();
        Ok(CommandReply::ThemeSelected { theme })
    }

    fn submit_feedback(&self, text: &str) -> CommandResult {
        let entry = self.controller.submit_feedback(text)?;
        self.notice(NoticeLevel::Info, "Feedback submitted!");
        Ok(CommandReply::FeedbackRecorded { entry })
    }

    fn submit_rating(&self, value: u8) -> CommandResult {
        self.controller.submit_rating(value)?;
        self.notice(NoticeLevel::Info, "Rating submitted!");
        Ok(CommandReply::RatingRecorded { value })
    }

    fn submit_input(&self, text: String) -> CommandResult {
        if text.trim().is_empty() {
            return Err(ValidationError::EmptyInput.into());
        }
        let permit = self.controller.acquire_permit().ok_or(CommandError::Busy)?;
        self.controller.set_pending_input(text.clone());
        self.spawn_pipeline(permit, text.clone());
        Ok(CommandReply::Accepted { input: text })
    }

    fn retry_pending(&self) -> CommandResult {
        let permit = self.controller.acquire_permit().ok_or(CommandError::Busy)?;
        let text = self
            .controller
            .pending_input()
            .ok_or(CommandError::NothingPending)?;
        self.spawn_pipeline(permit, text.clone());
        Ok(CommandReply::Accepted { input: text })
    }

    /// Transcribe off the loop, then feed the text back in as `SubmitInput`
    /// so it is serialized with every other command. The caller's reply
    /// travels with it.
    fn spawn_recognition(&self, audio: Vec<u8>, reply: oneshot::Sender<CommandResult>) {
        let speech = Arc::clone(&self.speech);
        let command_tx = self.command_tx.clone();
        let broadcast_tx = self.broadcast_tx.clone();

        tokio::spawn(async move {
            let text = match speech.recognize(&audio).await {
                Ok(text) => text,
                Err(e) => {
                    send_notice(&broadcast_tx, NoticeLevel::Error, &e.to_string());
                    respond("start_speech_input", reply, Err(e.into()));
                    return;
                }
            };
            send_notice(&broadcast_tx, NoticeLevel::Info, &format!("Recognized: {text}"));

            let envelope = CommandEnvelope {
                command: Command::SubmitInput { text },
                reply,
            };
            let Some(command_tx) = command_tx.upgrade() else {
                let _ = envelope.reply.send(Err(CommandError::RuntimeStopped));
                return;
            };
            if let Err(mpsc::error::SendError(envelope)) = command_tx.send(envelope).await {
                let _ = envelope.reply.send(Err(CommandError::RuntimeStopped));
            }
        });
    }

    fn upload(&self, file: UploadedFile) -> CommandResult {
        let name = file.name.clone();
        let outcome = ingest(file)?;
        tracing::info!(name = %name, "Upload ingested");
        Ok(CommandReply::Ingested { outcome })
    }

    fn spawn_pipeline(&self, permit: PipelinePermit, input: String) {
        let pipeline = Arc::clone(&self.pipeline);
        let broadcast_tx = self.broadcast_tx.clone();
        let model = self.controller.selected_model();

        tokio::spawn(async move {
            let _ = broadcast_tx.send(UiEvent::Working { running: true });
            let observer = BroadcastObserver {
                broadcast_tx: broadcast_tx.clone(),
            };

            if let Err(e) = pipeline.run(permit, &input, model, &observer).await {
                let _ = broadcast_tx.send(UiEvent::Notice {
                    level: NoticeLevel::Error,
                    message: e.to_string(),
                });
            }

            let _ = broadcast_tx.send(UiEvent::Working { running: false });
        });
    }

    fn publish_snapshot(&self) {
        let _ = self.broadcast_tx.send(UiEvent::Init {
            snapshot: self.controller.snapshot(),
        });
    }

    fn notice(&self, level: NoticeLevel, message: &str) {
        send_notice(&self.broadcast_tx, level, message);
    }
}

fn send_notice(broadcast_tx: &broadcast::Sender<UiEvent>, level: NoticeLevel, message: &str) {
    let _ = broadcast_tx.send(UiEvent::Notice {
        level,
        message: message.to_string(),
    });
}

fn respond(command: &'static str, reply: oneshot::Sender<CommandResult>, result: CommandResult) {
    match &result {
        Ok(_) => tracing::debug!(command, "Command handled"),
        Err(e) => tracing::info!(command, error = %e, "Command rejected"),
    }
    // The caller may have gone away; nothing to do then
    let _ = reply.send(result);
}

/// Forwards pipeline progress to UI subscribers
struct BroadcastObserver {
    broadcast_tx: broadcast::Sender<UiEvent>,
}

impl PipelineObserver for BroadcastObserver {
    fn on_message(&self, message: &Message) {
        let _ = self.broadcast_tx.send(UiEvent::Message {
            message: message.clone(),
        });
    }

    fn on_reveal(&self, chunk: &RevealChunk) {
        let _ = self.broadcast_tx.send(UiEvent::Reveal {
            chunk: chunk.clone(),
        });
    }
}
