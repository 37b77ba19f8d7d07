use async_trait::async_trait;
use log::debug;
use reqwest::Client as HttpClient;
use thiserror::Error;
use url::Url;

use crate::models::chat::ChatRequest;

pub const CHAT_PATH: &str = "/api/chat";

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Request to proxy failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Invalid proxy URL: {0}")]
    Url(#[from] url::ParseError),
    /// The connection to the proxy could not be opened.
    #[error("Proxy unreachable: {0}")]
    Unreachable(String),
}

/// Raw proxy answer; the widget decides what to make of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn post_chat(&self, request: &ChatRequest) -> Result<TransportResponse, TransportError>;
}

pub struct HttpTransport {
    http: HttpClient,
    endpoint: Url,
}

impl HttpTransport {
    pub fn new(server_url: &str) -> Result<Self, TransportError> {
        let endpoint = Url::parse(server_url)?.join(CHAT_PATH)?;
        Ok(Self {
            http: HttpClient::new(),
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn post_chat(&self, request: &ChatRequest) -> Result<TransportResponse, TransportError> {
        debug!("POST {} with {} messages", self.endpoint, request.messages.len());
        let resp = self.http.post(self.endpoint.clone())
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    TransportError::Unreachable(e.to_string())
                } else {
                    TransportError::Http(e)
                }
            })?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        Ok(TransportResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_is_resolved_against_server_root() {
        let transport = HttpTransport::new("http://127.0.0.1:3001/widget/").unwrap();
        assert_eq!(transport.endpoint().as_str(), "http://127.0.0.1:3001/api/chat");
    }

    #[test]
    fn rejects_relative_server_url() {
        assert!(matches!(HttpTransport::new("not a url"), Err(TransportError::Url(_))));
    }
}
