//! Session runtime
//!
//! Owns the command loop that serializes user actions against the session
//! and fans progress out to UI subscribers.

mod command;
mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use command::{Command, CommandEnvelope, CommandError, CommandReply, CommandResult};
pub use executor::SessionRuntime;
pub use traits::*;

use crate::pipeline::{PipelineSettings, ResponsePipeline, RevealChunk};
use crate::session::{Message, SessionController, SessionSnapshot};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};

const COMMAND_BUFFER: usize = 32;
const BROADCAST_BUFFER: usize = 256;

/// Events sent to UI subscribers
#[derive(Debug, Clone)]
pub enum UiEvent {
    Init { snapshot: SessionSnapshot },
    Message { message: Message },
    Reveal { chunk: RevealChunk },
    Working { running: bool },
    Notice { level: NoticeLevel, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Error,
}

/// Handle to interact with a running session
#[derive(Clone)]
pub struct RuntimeHandle {
    command_tx: mpsc::Sender<CommandEnvelope>,
    broadcast_tx: broadcast::Sender<UiEvent>,
    controller: Arc<SessionController>,
}

impl RuntimeHandle {
    /// Send a command and wait for its reply
    pub async fn send(&self, command: Command) -> CommandResult {
        let (reply, reply_rx) = oneshot::channel();
        self.command_tx
            .send(CommandEnvelope { command, reply })
            .await
            .map_err(|_| CommandError::RuntimeStopped)?;
        reply_rx.await.map_err(|_| CommandError::RuntimeStopped)?
    }

    pub fn subscribe(&self) -> broadcast::Receiver<UiEvent> {
        self.broadcast_tx.subscribe()
    }

    pub fn controller(&self) -> &Arc<SessionController> {
        &self.controller
    }
}

/// Spawn the session runtime and return a handle to it
pub fn start<M, R, S>(
    controller: Arc<SessionController>,
    model_client: M,
    reference_finder: R,
    speech: S,
    settings: PipelineSettings,
) -> RuntimeHandle
where
    M: ModelClient + 'static,
    R: ReferenceFinder + 'static,
    S: SpeechRecognizer + 'static,
{
    let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
    let (broadcast_tx, _) = broadcast::channel(BROADCAST_BUFFER);

    let pipeline = ResponsePipeline::new(
        controller.clone(),
        model_client,
        reference_finder,
        settings,
    );
    let runtime = SessionRuntime::new(
        controller.clone(),
        pipeline,
        speech,
        command_tx.downgrade(),
        command_rx,
        broadcast_tx.clone(),
    );
    tokio::spawn(runtime.run());

    RuntimeHandle {
        command_tx,
        broadcast_tx,
        controller,
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::ingest::{IngestError, UploadedFile};
    use crate::llm::{ChatModel, LlmError, LlmResponse};
    use crate::session::{AuthError, Credentials, Role, Theme, ValidationError};
    use crate::speech::SpeechError;
    use std::time::Duration;

    struct Harness {
        handle: RuntimeHandle,
        events: broadcast::Receiver<UiEvent>,
    }

    fn start_with<M, S>(model: M, speech: Arc<S>) -> Harness
    where
        M: ModelClient + 'static,
        S: SpeechRecognizer + 'static,
    {
        let controller = Arc::new(SessionController::new(
            Credentials::default(),
            ChatModel::default(),
        ));
        let handle = start(
            controller,
            model,
            MockReferenceFinder::with_links(&["http://a"]),
            speech,
            PipelineSettings {
                reference_limit: 3,
                reveal_delay: Duration::ZERO,
            },
        );
        let events = handle.subscribe();
        Harness { handle, events }
    }

    fn login() -> Command {
        Command::Login {
            username: "user".into(),
            email: "user@example.com".into(),
            password: "password123".into(),
        }
    }

    fn submit(text: &str) -> Command {
        Command::SubmitInput { text: text.into() }
    }

    /// Wait until a run finishes
    async fn wait_idle(events: &mut broadcast::Receiver<UiEvent>) {
        loop {
            match tokio::time::timeout(Duration::from_secs(5), events.recv()).await {
                Ok(Ok(UiEvent::Working { running: false })) => return,
                Ok(Ok(_)) => {}
                other => panic!("runtime went quiet: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_commands_require_login() {
        let h = start_with(MockModelClient::new(), Arc::new(MockSpeechRecognizer::new()));

        let err = h.handle.send(submit("hi")).await.unwrap_err();
        assert_eq!(err, CommandError::Auth(AuthError::NotAuthenticated));
        let err = h.handle.send(Command::SubmitRating { value: 3 }).await.unwrap_err();
        assert_eq!(err, CommandError::Auth(AuthError::NotAuthenticated));
        assert!(h.handle.controller().transcript().is_empty());
    }

    #[tokio::test]
    async fn test_bad_login_changes_nothing() {
        let h = start_with(MockModelClient::new(), Arc::new(MockSpeechRecognizer::new()));

        let err = h
            .handle
            .send(Command::Login {
                username: "user".into(),
                email: "user@example.com".into(),
                password: "nope".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(err, CommandError::Auth(AuthError::InvalidCredentials));
        assert!(!h.handle.controller().is_authenticated());

        assert_eq!(h.handle.send(login()).await, Ok(CommandReply::LoggedIn));
        assert!(h.handle.controller().is_authenticated());
    }

    #[tokio::test]
    async fn test_submit_input_runs_pipeline() {
        let model = Arc::new(MockModelClient::new());
        model.queue_response(LlmResponse::text("Ha. Ha."));
        let mut h = start_with(model.clone(), Arc::new(MockSpeechRecognizer::new()));

        h.handle.send(login()).await.unwrap();
        h.handle
            .send(Command::SelectModel {
                choice: "Mixtral 8x7b".into(),
            })
            .await
            .unwrap();
        let reply = h.handle.send(submit("Tell me a joke")).await.unwrap();
        assert_eq!(
            reply,
            CommandReply::Accepted {
                input: "Tell me a joke".into()
            }
        );
        wait_idle(&mut h.events).await;

        let controller = h.handle.controller();
        let transcript = controller.transcript();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[1].role, Role::Assistant);
        assert_eq!(
            transcript[1].content,
            "Ha. Ha.\n\n**Related References:**\n- http://a\n"
        );
        assert_eq!(controller.pending_input(), None);
        assert!(!controller.is_response_in_progress());
        assert_eq!(model.recorded_requests()[0].0, ChatModel::Mixtral8x7b);
    }

    #[tokio::test]
    async fn test_second_submit_while_running_is_busy() {
        let model = Arc::new(GatedModelClient::new("done"));
        let mut h = start_with(model.clone(), Arc::new(MockSpeechRecognizer::new()));
        h.handle.send(login()).await.unwrap();

        h.handle.send(submit("first")).await.unwrap();
        model.wait_started().await;

        let err = h.handle.send(submit("second")).await.unwrap_err();
        assert_eq!(err, CommandError::Busy);
        assert_eq!(
            h.handle.controller().pending_input().as_deref(),
            Some("first")
        );

        // Feedback is still served while the reply is held open
        h.handle
            .send(Command::SubmitFeedback {
                text: "quick".into(),
            })
            .await
            .unwrap();

        model.release();
        wait_idle(&mut h.events).await;

        let transcript = h.handle.controller().transcript();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[0].content, "first");
        assert_eq!(transcript[1].content, "done\n\n**Related References:**\n- http://a\n");
    }

    #[tokio::test]
    async fn test_model_failure_then_retry() {
        let model = Arc::new(MockModelClient::new());
        model.queue_error(LlmError::rate_limit("slow down"));
        model.queue_response(LlmResponse::text("Better now"));
        let mut h = start_with(model.clone(), Arc::new(MockSpeechRecognizer::new()));
        h.handle.send(login()).await.unwrap();

        h.handle.send(submit("hello")).await.unwrap();
        let mut notices = Vec::new();
        loop {
            match h.events.recv().await.unwrap() {
                UiEvent::Notice { level, message } => notices.push((level, message)),
                UiEvent::Working { running: false } => break,
                _ => {}
            }
        }
        assert!(notices.contains(&(NoticeLevel::Error, "Error: slow down".to_string())));
        assert_eq!(h.handle.controller().pending_input().as_deref(), Some("hello"));

        let reply = h.handle.send(Command::RetryPending).await.unwrap();
        assert_eq!(reply, CommandReply::Accepted { input: "hello".into() });
        wait_idle(&mut h.events).await;

        assert_eq!(h.handle.controller().pending_input(), None);
        assert_eq!(
            h.handle.send(Command::RetryPending).await,
            Err(CommandError::NothingPending)
        );
        assert!(!h.handle.controller().is_response_in_progress());
    }

    #[tokio::test]
    async fn test_blank_input_rejected() {
        let h = start_with(MockModelClient::new(), Arc::new(MockSpeechRecognizer::new()));
        h.handle.send(login()).await.unwrap();

        assert_eq!(
            h.handle.send(submit("   ")).await,
            Err(CommandError::Validation(ValidationError::EmptyInput))
        );
        assert!(!h.handle.controller().is_response_in_progress());
        assert_eq!(h.handle.controller().pending_input(), None);
    }

    #[tokio::test]
    async fn test_speech_input() {
        let model = Arc::new(MockModelClient::new());
        model.queue_response(LlmResponse::text("Because."));
        let speech = Arc::new(MockSpeechRecognizer::new());
        speech.queue_error(SpeechError::UnknownAudio);
        speech.queue_text("Why is the sky blue?");
        let mut h = start_with(model, speech);
        h.handle.send(login()).await.unwrap();

        let err = h
            .handle
            .send(Command::StartSpeechInput { audio: vec![1, 2] })
            .await
            .unwrap_err();
        assert_eq!(err, CommandError::Speech(SpeechError::UnknownAudio));
        assert_eq!(h.handle.controller().pending_input(), None);

        let reply = h
            .handle
            .send(Command::StartSpeechInput { audio: vec![1, 2] })
            .await
            .unwrap();
        assert_eq!(
            reply,
            CommandReply::Accepted {
                input: "Why is the sky blue?".into()
            }
        );
        wait_idle(&mut h.events).await;
        assert_eq!(h.handle.controller().transcript()[0].content, "Why is the sky blue?");
    }

    #[tokio::test]
    async fn test_commands_served_while_transcribing() {
        let model = Arc::new(MockModelClient::new());
        model.queue_response(LlmResponse::text("Sure."));
        let speech = Arc::new(GatedSpeechRecognizer::new("Tell me a joke"));
        let mut h = start_with(model, speech.clone());
        h.handle.send(login()).await.unwrap();

        let handle = h.handle.clone();
        let pending_speech = tokio::spawn(async move {
            handle
                .send(Command::StartSpeechInput { audio: vec![1, 2, 3] })
                .await
        });
        speech.wait_started().await;

        let rating = tokio::time::timeout(
            Duration::from_millis(500),
            h.handle.send(Command::SubmitRating { value: 4 }),
        )
        .await
        .expect("rating answered while audio is transcribed");
        assert_eq!(rating, Ok(CommandReply::RatingRecorded { value: 4 }));
        assert_eq!(h.handle.controller().pending_input(), None);

        speech.release();
        let reply = pending_speech.await.unwrap();
        assert_eq!(
            reply,
            Ok(CommandReply::Accepted {
                input: "Tell me a joke".into()
            })
        );
        wait_idle(&mut h.events).await;
        assert_eq!(h.handle.controller().transcript()[0].content, "Tell me a joke");
    }

    #[tokio::test]
    async fn test_feedback_rating_and_theme() {
        let h = start_with(MockModelClient::new(), Arc::new(MockSpeechRecognizer::new()));
        h.handle.send(login()).await.unwrap();

        assert_eq!(
            h.handle
                .send(Command::SubmitFeedback { text: String::new() })
                .await,
            Err(CommandError::Validation(ValidationError::EmptyInput))
        );
        h.handle
            .send(Command::SubmitRating { value: 4 })
            .await
            .unwrap();
        assert_eq!(
            h.handle.send(Command::SubmitRating { value: 9 }).await,
            Err(CommandError::Validation(ValidationError::RatingOutOfRange(9)))
        );
        h.handle
            .send(Command::SelectTheme {
                theme: "Light".into(),
            })
            .await
            .unwrap();

        let snapshot = h.handle.controller().snapshot();
        assert_eq!(snapshot.rating, Some(4));
        assert_eq!(snapshot.theme, Theme::Light);
        assert!(snapshot.feedback.is_empty());
        // Rating is not written to the transcript
        assert!(snapshot.messages.is_empty());
    }

    #[tokio::test]
    async fn test_upload_routing() {
        let h = start_with(MockModelClient::new(), Arc::new(MockSpeechRecognizer::new()));
        h.handle.send(login()).await.unwrap();

        let err = h
            .handle
            .send(Command::UploadFile {
                file: UploadedFile {
                    name: "notes.txt".into(),
                    media_type: None,
                    data: b"hello".to_vec(),
                },
            })
            .await
            .unwrap_err();
        assert_eq!(
            err,
            CommandError::Ingest(IngestError::UnsupportedType("text/plain".into()))
        );

        let reply = h
            .handle
            .send(Command::UploadFile {
                file: UploadedFile {
                    name: "song.mp3".into(),
                    media_type: None,
                    data: b"ID3".to_vec(),
                },
            })
            .await
            .unwrap();
        assert!(matches!(reply, CommandReply::Ingested { .. }));
    }

    #[tokio::test]
    async fn test_search_receives_user_input() {
        let controller = Arc::new(SessionController::new(
            Credentials::default(),
            ChatModel::default(),
        ));
        let model = Arc::new(MockModelClient::new());
        model.queue_response(LlmResponse::text("ok"));
        let finder = Arc::new(MockReferenceFinder::with_links(&[]));
        let handle = start(
            controller,
            model,
            finder.clone(),
            Arc::new(MockSpeechRecognizer::new()),
            PipelineSettings {
                reference_limit: 3,
                reveal_delay: Duration::ZERO,
            },
        );
        let mut events = handle.subscribe();
        handle.send(login()).await.unwrap();
        handle.send(submit("rust books")).await.unwrap();
        wait_idle(&mut events).await;

        assert_eq!(*finder.queries.lock().unwrap(), vec!["rust books".to_string()]);
    }
}
