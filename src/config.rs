//! Application configuration from the environment

use crate::llm::LlmConfig;
use crate::pipeline::{PipelineSettings, DEFAULT_REFERENCE_LIMIT, DEFAULT_REVEAL_DELAY};
use crate::session::Credentials;
use std::time::Duration;

const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub llm: LlmConfig,
    pub credentials: Credentials,
    pub pipeline: PipelineSettings,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Unparsable numbers fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = lookup("COPILOT_PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let reveal_delay = lookup("COPILOT_REVEAL_DELAY_MS")
            .and_then(|ms| ms.parse().ok())
            .map_or(DEFAULT_REVEAL_DELAY, Duration::from_millis);

        let reference_limit = lookup("COPILOT_REFERENCE_LIMIT")
            .and_then(|n| n.parse().ok())
            .unwrap_or(DEFAULT_REFERENCE_LIMIT);

        let defaults = Credentials::default();
        let credentials = Credentials {
            username: lookup("COPILOT_USERNAME").unwrap_or(defaults.username),
            email: lookup("COPILOT_EMAIL").unwrap_or(defaults.email),
            password: lookup("COPILOT_PASSWORD").unwrap_or(defaults.password),
        };

        Self {
            port,
            llm: LlmConfig::from_lookup(&lookup),
            credentials,
            pipeline: PipelineSettings {
                reference_limit,
                reveal_delay,
            },
        }
    }
}
