//! Chat model catalogue
//!
//! The four hosted models offered in the model picker, keyed by the
//! human-readable label shown to users.

/// Models selectable for a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChatModel {
    #[default]
    Llama3_8b,
    Llama3_70b,
    Mixtral8x7b,
    Gemma7b,
}

const ALL_MODELS: &[ChatModel] = &[
    ChatModel::Llama3_8b,
    ChatModel::Llama3_70b,
    ChatModel::Mixtral8x7b,
    ChatModel::Gemma7b,
];

impl ChatModel {
    /// Every model in picker order
    pub fn all() -> &'static [ChatModel] {
        ALL_MODELS
    }

    /// Label shown in the model picker
    pub fn label(self) -> &'static str {
        match self {
            ChatModel::Llama3_8b => "LLaMA3 8b",
            ChatModel::Llama3_70b => "LLaMA3 70b",
            ChatModel::Mixtral8x7b => "Mixtral 8x7b",
            ChatModel::Gemma7b => "Gemma 7b",
        }
    }

    /// Provider-specific model string sent on the wire
    pub fn api_name(self) -> &'static str {
        match self {
            ChatModel::Llama3_8b => "llama3-8b-8192",
            ChatModel::Llama3_70b => "llama3-70b-8192",
            ChatModel::Mixtral8x7b => "mixtral-8x7b-32768",
            ChatModel::Gemma7b => "gemma-7b-it",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ChatModel::Llama3_8b => "Meta Llama 3 8B (fast, default)",
            ChatModel::Llama3_70b => "Meta Llama 3 70B (more capable)",
            ChatModel::Mixtral8x7b => "Mistral Mixtral 8x7B (long context)",
            ChatModel::Gemma7b => "Google Gemma 7B instruction-tuned",
        }
    }

    pub fn context_window(self) -> usize {
        match self {
            ChatModel::Llama3_8b | ChatModel::Llama3_70b | ChatModel::Gemma7b => 8_192,
            ChatModel::Mixtral8x7b => 32_768,
        }
    }

    /// Look up a model by label or provider id, ignoring case
    pub fn parse(choice: &str) -> Option<ChatModel> {
        let choice = choice.trim();
        ALL_MODELS.iter().copied().find(|model| {
            model.label().eq_ignore_ascii_case(choice)
                || model.api_name().eq_ignore_ascii_case(choice)
        })
    }

    /// Map a picker choice to a model; anything unrecognized selects the default
    pub fn from_label(choice: &str) -> ChatModel {
        Self::parse(choice).unwrap_or_default()
    }
}
