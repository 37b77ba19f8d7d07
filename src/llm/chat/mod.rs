pub mod openai;

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use super::{ LlmConfig, LlmError };
use self::openai::OpenAIChatClient;

/// What the upstream said, once its body has been decoded.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// Success status. `None` when the first choice carried no usable content.
    Reply(Option<String>),
    /// Non-success status together with the decoded error body.
    Refused {
        status: u16,
        body: Value,
    },
}

#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Sends the full message list (system message first) and waits for one reply.
    async fn complete(&self, messages: Vec<Value>) -> Result<Completion, LlmError>;

    fn get_model(&self) -> String;
    fn get_base_url(&self) -> Option<String>;
}

pub fn new_client(config: &LlmConfig) -> Result<Arc<dyn ChatClient>, LlmError> {
    let client: Arc<dyn ChatClient> = Arc::new(OpenAIChatClient::from_config(config)?);
    Ok(client)
}
