//! HTTP API for the copilot session

mod handlers;
mod sse;
mod types;

pub use handlers::create_router;

use crate::llm::ModelRegistry;
use crate::runtime::RuntimeHandle;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub runtime: RuntimeHandle,
    pub llm_registry: Arc<ModelRegistry>,
}

impl AppState {
    pub fn new(runtime: RuntimeHandle, llm_registry: Arc<ModelRegistry>) -> Self {
        Self {
            runtime,
            llm_registry,
        }
    }
}
