//! Model registry for the hosted chat models

use super::groq::GroqService;
use super::{ChatModel, LlmService, LoggingService};
use std::collections::HashMap;
use std::sync::Arc;

/// Configuration for the completion provider
#[derive(Debug, Clone, Default)]
pub struct LlmConfig {
    pub groq_api_key: Option<String>,
    /// Override for the `OpenAI`-compatible base URL (e.g. a local proxy)
    pub base_url: Option<String>,
    /// Default model label or provider id
    pub default_model: Option<String>,
}

impl LlmConfig {
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            groq_api_key: lookup("GROQ_API_KEY").filter(|k| !k.trim().is_empty()),
            base_url: lookup("GROQ_BASE_URL"),
            default_model: lookup("DEFAULT_MODEL"),
        }
    }
}

/// Registry of available chat models
pub struct ModelRegistry {
    services: HashMap<ChatModel, Arc<dyn LlmService>>,
    default_model: ChatModel,
}

impl ModelRegistry {
    pub fn new(config: &LlmConfig) -> Self {
        let mut services: HashMap<ChatModel, Arc<dyn LlmService>> = HashMap::new();

        if let Some(api_key) = &config.groq_api_key {
            for model in ChatModel::all() {
                match GroqService::new(api_key.clone(), *model, config.base_url.as_deref()) {
                    Ok(service) => {
                        services.insert(*model, Arc::new(LoggingService::new(Arc::new(service))));
                    }
                    Err(e) => {
                        tracing::warn!(model = model.api_name(), error = %e, "Skipping model");
                    }
                }
            }
        }

        let default_model = config
            .default_model
            .as_deref()
            .map_or_else(ChatModel::default, ChatModel::from_label);

        Self {
            services,
            default_model,
        }
    }

    /// Get the service for a model
    pub fn get(&self, model: ChatModel) -> Option<Arc<dyn LlmService>> {
        self.services.get(&model).cloned()
    }

    /// Get the default model's service
    pub fn default(&self) -> Option<Arc<dyn LlmService>> {
        self.get(self.default_model)
    }

    pub fn default_model(&self) -> ChatModel {
        self.default_model
    }

    /// Models with a configured service, in picker order
    pub fn available_models(&self) -> Vec<ChatModel> {
        ChatModel::all()
            .iter()
            .copied()
            .filter(|m| self.services.contains_key(m))
            .collect()
    }

    /// Check if any models are available
    pub fn has_models(&self) -> bool {
        !self.services.is_empty()
    }
}
