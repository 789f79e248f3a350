//! LLM Copilot - chat assistant backend
//!
//! Serves a single authenticated chat session over HTTP: typed or spoken
//! questions go to a hosted model, replies come back with web references and
//! are revealed sentence by sentence over Server-Sent Events.

mod api;
mod config;
mod ingest;
mod llm;
mod pipeline;
mod runtime;
mod search;
mod session;
mod speech;

use api::{create_router, AppState};
use config::AppConfig;
use llm::ModelRegistry;
use runtime::RegistryModelClient;
use search::DuckDuckGoSearch;
use session::SessionController;
use speech::WhisperTranscriber;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "llm_copilot=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = AppConfig::from_env();

    // Initialize model registry
    let llm_registry = Arc::new(ModelRegistry::new(&config.llm));

    if llm_registry.has_models() {
        tracing::info!(
            models = ?llm_registry.available_models(),
            default = %llm_registry.default_model().api_name(),
            "Model registry initialized"
        );
    } else {
        tracing::warn!("No model API key configured. Set GROQ_API_KEY.");
    }

    // Session and collaborators
    let controller = Arc::new(SessionController::new(
        config.credentials.clone(),
        llm_registry.default_model(),
    ));
    let model_client = RegistryModelClient::new(llm_registry.clone());
    let search = DuckDuckGoSearch::new()?;
    let speech = WhisperTranscriber::new(&config.llm)?;

    let runtime = runtime::start(controller, model_client, search, speech, config.pipeline);
    let state = AppState::new(runtime, llm_registry);

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .deflate(true)
        .zstd(true);

    let app = create_router(state)
        .layer(cors)
        .layer(compression)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("LLM Copilot server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
