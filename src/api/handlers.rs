//! HTTP request handlers

use super::sse::sse_stream;
use super::types::{
    ChatRequest, ErrorResponse, FeedbackRequest, LoginRequest, LoginResponse, ModelInfo,
    ModelsResponse, QuickPromptsResponse, RatingRequest, SelectModelRequest, SelectThemeRequest,
    SpeechRequest, UploadRequest,
};
use super::AppState;
use crate::ingest::{IngestError, UploadedFile};
use crate::llm::ChatModel;
use crate::runtime::{Command, CommandError, CommandReply, UiEvent};
use crate::session::{AuthError, SessionSnapshot, GREETING, QUICK_PROMPTS};
use crate::speech::SpeechError;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Session
        .route("/api/login", post(login))
        .route("/api/session", get(get_session))
        .route("/api/stream", get(stream_session))
        // Settings
        .route("/api/model", post(select_model))
        .route("/api/theme", post(select_theme))
        // Conversation
        .route("/api/speech", post(speech_input))
        .route("/api/chat", post(send_chat))
        .route("/api/retry", post(retry_pending))
        // Feedback
        .route("/api/feedback", post(submit_feedback))
        .route("/api/rating", post(submit_rating))
        // Media
        .route("/api/upload", post(upload_file))
        // Catalogue
        .route("/api/models", get(list_models))
        .route("/api/quick-prompts", get(quick_prompts))
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Session
// ============================================================

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Response, AppError> {
    let command = Command::Login {
        username: req.username,
        email: req.email,
        password: req.password,
    };

    match state.runtime.send(command).await {
        Ok(_) => Ok(Json(LoginResponse {
            authenticated: true,
            error: None,
        })
        .into_response()),
        Err(CommandError::Auth(e @ AuthError::InvalidCredentials)) => Ok((
            StatusCode::UNAUTHORIZED,
            Json(LoginResponse {
                authenticated: false,
                error: Some(e.to_string()),
            }),
        )
            .into_response()),
        Err(e) => Err(e.into()),
    }
}

async fn get_session(State(state): State<AppState>) -> Json<SessionSnapshot> {
    Json(state.runtime.controller().snapshot())
}

async fn stream_session(State(state): State<AppState>) -> impl IntoResponse {
    // Subscribe before taking the snapshot so no event falls in between
    let broadcast_rx = state.runtime.subscribe();
    let init = UiEvent::Init {
        snapshot: state.runtime.controller().snapshot(),
    };
    sse_stream(init, broadcast_rx)
}

// ============================================================
// Settings
// ============================================================

async fn select_model(
    State(state): State<AppState>,
    Json(req): Json<SelectModelRequest>,
) -> Result<Json<CommandReply>, AppError> {
    dispatch(&state, Command::SelectModel { choice: req.model }).await
}

async fn select_theme(
    State(state): State<AppState>,
    Json(req): Json<SelectThemeRequest>,
) -> Result<Json<CommandReply>, AppError> {
    dispatch(&state, Command::SelectTheme { theme: req.theme }).await
}

// ============================================================
// Conversation
// ============================================================

async fn speech_input(
    State(state): State<AppState>,
    Json(req): Json<SpeechRequest>,
) -> Result<Json<CommandReply>, AppError> {
    let audio = decode_base64(&req.audio).map_err(CommandError::from)?;
    dispatch(&state, Command::StartSpeechInput { audio }).await
}

async fn send_chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<CommandReply>, AppError> {
    dispatch(&state, Command::SubmitInput { text: req.text }).await
}

async fn retry_pending(State(state): State<AppState>) -> Result<Json<CommandReply>, AppError> {
    dispatch(&state, Command::RetryPending).await
}

// ============================================================
// Feedback
// ============================================================

async fn submit_feedback(
    State(state): State<AppState>,
    Json(req): Json<FeedbackRequest>,
) -> Result<Json<CommandReply>, AppError> {
    dispatch(&state, Command::SubmitFeedback { text: req.feedback }).await
}

async fn submit_rating(
    State(state): State<AppState>,
    Json(req): Json<RatingRequest>,
) -> Result<Json<CommandReply>, AppError> {
    dispatch(&state, Command::SubmitRating { value: req.rating }).await
}

// ============================================================
// Media
// ============================================================

async fn upload_file(
    State(state): State<AppState>,
    Json(req): Json<UploadRequest>,
) -> Result<Json<CommandReply>, AppError> {
    let data = decode_base64(&req.data).map_err(CommandError::from)?;
    let file = UploadedFile {
        name: req.name,
        media_type: req.media_type,
        data,
    };
    dispatch(&state, Command::UploadFile { file }).await
}

fn decode_base64(data: &str) -> Result<Vec<u8>, IngestError> {
    BASE64
        .decode(data.trim())
        .map_err(|e| IngestError::Decode(e.to_string()))
}

// ============================================================
// Catalogue
// ============================================================

async fn list_models(State(state): State<AppState>) -> Json<ModelsResponse> {
    let available = state.llm_registry.available_models();
    let models = ChatModel::all()
        .iter()
        .map(|model| ModelInfo {
            label: model.label(),
            id: model.api_name(),
            description: model.description(),
            context_window: model.context_window(),
            available: available.contains(model),
        })
        .collect();

    Json(ModelsResponse {
        models,
        default: state.llm_registry.default_model().label(),
        selected: state.runtime.controller().selected_model().label(),
    })
}

async fn quick_prompts() -> Json<QuickPromptsResponse> {
    Json(QuickPromptsResponse {
        prompts: QUICK_PROMPTS,
        greeting: GREETING,
    })
}

async fn get_version() -> &'static str {
    concat!("llm-copilot ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Command dispatch & errors
// ============================================================

async fn dispatch(state: &AppState, command: Command) -> Result<Json<CommandReply>, AppError> {
    Ok(Json(state.runtime.send(command).await?))
}

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    Unauthorized(String),
    Conflict(String),
    Unprocessable(String),
    Unavailable(String),
}

impl From<CommandError> for AppError {
    fn from(e: CommandError) -> Self {
        let message = e.to_string();
        match e {
            CommandError::Auth(_) => AppError::Unauthorized(message),
            CommandError::Busy | CommandError::NothingPending => AppError::Conflict(message),
            CommandError::Validation(_) | CommandError::Ingest(IngestError::Decode(_)) => {
                AppError::BadRequest(message)
            }
            CommandError::Ingest(_) | CommandError::Speech(SpeechError::UnknownAudio) => {
                AppError::Unprocessable(message)
            }
            CommandError::Speech(SpeechError::ServiceUnavailable(_))
            | CommandError::RuntimeStopped => AppError::Unavailable(message),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            AppError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
