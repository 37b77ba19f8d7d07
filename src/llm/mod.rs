pub mod chat;

use thiserror::Error;

pub const DEFAULT_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Upstream transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Upstream response could not be decoded: {0}")]
    Decode(String),
    #[error("Chat client configuration error: {0}")]
    Config(String),
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub completion_model: String,
    pub base_url: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            completion_model: "gpt-4o-mini".to_string(),
            base_url: DEFAULT_CHAT_URL.to_string(),
            temperature: 0.2,
            max_tokens: 300,
        }
    }
}

impl From<&crate::cli::Args> for LlmConfig {
    fn from(args: &crate::cli::Args) -> Self {
        Self {
            api_key: Some(args.api_key.clone()).filter(|k| !k.is_empty()),
            completion_model: args.model.clone(),
            base_url: args.chat_base_url.clone(),
            temperature: args.temperature,
            max_tokens: args.max_tokens,
        }
    }
}
