use async_trait::async_trait;
use log::debug;
use reqwest::{Client as HttpClient, header::{HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION}};
use serde::Serialize;
use serde_json::Value;

use super::{ChatClient, Completion};
use crate::llm::{LlmConfig, LlmError};

pub struct OpenAIChatClient {
    http: HttpClient,
    model: String,
    base_url: String,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct OpenAIChatRequest {
    model: String,
    temperature: f32,
    max_tokens: u32,
    messages: Vec<Value>,
}

impl OpenAIChatClient {
    pub fn new(
        api_key: Option<String>,
        model: String,
        base_url: String,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<Self, LlmError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        // Without a key the upstream answers 401, which is mirrored to the caller.
        if let Some(key) = api_key {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", key))
                    .map_err(|e| LlmError::Config(format!("Invalid API key format: {}", e)))?
            );
        }

        let http = HttpClient::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            model,
            base_url,
            temperature,
            max_tokens,
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        Self::new(
            config.api_key.clone(),
            config.completion_model.clone(),
            config.base_url.clone(),
            config.temperature,
            config.max_tokens,
        )
    }
}

/// First choice's message content, if it is a non-empty string.
pub fn first_choice_content(body: &Value) -> Option<String> {
    body.pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

#[async_trait]
impl ChatClient for OpenAIChatClient {
    async fn complete(&self, messages: Vec<Value>) -> Result<Completion, LlmError> {
        let req = OpenAIChatRequest {
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            messages,
        };

        debug!("POST {} with {} messages", self.base_url, req.messages.len());
        let resp = self.http.post(&self.base_url)
            .json(&req)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        // The body is decoded before the status is looked at, so a non-JSON error page is a failure.
        let body: Value = serde_json::from_str(&text)
            .map_err(|e| LlmError::Decode(format!("{} (status {})", e, status.as_u16())))?;

        if !status.is_success() {
            return Ok(Completion::Refused { status: status.as_u16(), body });
        }

        Ok(Completion::Reply(first_choice_content(&body)))
    }

    fn get_model(&self) -> String {
        self.model.clone()
    }

    fn get_base_url(&self) -> Option<String> {
        Some(self.base_url.clone())
    }
}
