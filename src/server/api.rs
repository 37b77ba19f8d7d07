use crate::config::prompt::{
    PromptConfig,
    EMPTY_COMPLETION_REPLY,
    SERVER_ERROR_REPLY,
    UPSTREAM_FAILURE_REPLY,
};
use crate::llm::chat::{ChatClient, Completion};
use crate::models::chat::{ChatReply, IncomingChat};
use super::rate_limit::{rate_limit, ApiRateLimiter};

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use axum::{
    routing::{get, post},
    Router,
    Json,
    body::Bytes,
    extract::{Request, State},
    middleware::{self, Next},
    response::{Html, IntoResponse, Response},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
};
use serde_json::{json, Value};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use log::{info, warn, error};
use thiserror::Error;

#[derive(Clone)]
pub struct AppState {
    pub chat_client: Arc<dyn ChatClient>,
    pub prompts: Arc<PromptConfig>,
    pub static_dir: PathBuf,
}

pub fn build_router(state: AppState, limiter: Arc<ApiRateLimiter>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/chat", post(chat_handler).fallback(entry_page_handler))
        .layer(middleware::from_fn_with_state(limiter, rate_limit));

    Router::new()
        .route("/health", get(health_handler))
        .nest("/api", api)
        .fallback(entry_page_handler)
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("SAMEORIGIN"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ))
        .layer(middleware::from_fn(log_requests))
        .with_state(state)
}

/// System message first, then the caller's messages untouched.
pub fn build_upstream_messages(prompts: &PromptConfig, incoming: &IncomingChat) -> Vec<Value> {
    let persona = prompts.resolve(incoming.system.as_deref());
    let mut messages = Vec::with_capacity(incoming.messages.len() + 1);
    messages.push(json!({ "role": "system", "content": persona }));
    messages.extend(incoming.messages.iter().cloned());
    messages
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BodyRejection {
    #[error("Request body is not valid JSON: {0}")]
    Syntax(String),
    #[error("Request body must be a JSON object or array")]
    NotObject,
}

fn is_json_content_type(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|mime| {
            let mime = mime.trim().to_ascii_lowercase();
            mime == "application/json" || mime.ends_with("+json")
        })
        .unwrap_or(false)
}

/// Reads a `/api/chat` body.
///
/// Bodies without a JSON content type and empty bodies read as `Null`.
/// JSON bodies must be an object or an array.
pub fn decode_chat_body(is_json: bool, body: &[u8]) -> Result<Value, BodyRejection> {
    if !is_json || body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| BodyRejection::Syntax(e.to_string()))?;
    match value {
        Value::Object(_) | Value::Array(_) => Ok(value),
        _ => Err(BodyRejection::NotObject),
    }
}

async fn chat_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let body = match decode_chat_body(is_json_content_type(&headers), &body) {
        Ok(value) => value,
        Err(rejection) => {
            warn!("Rejected /api/chat body: {}", rejection);
            return (StatusCode::BAD_REQUEST, rejection.to_string()).into_response();
        }
    };

    let incoming = IncomingChat::from_value(&body);
    let messages = build_upstream_messages(&state.prompts, &incoming);

    match state.chat_client.complete(messages).await {
        Ok(Completion::Reply(content)) => {
            let reply = content.unwrap_or_else(|| EMPTY_COMPLETION_REPLY.to_string());
            (StatusCode::OK, Json(ChatReply::new(reply))).into_response()
        }
        Ok(Completion::Refused { status, body }) => {
            error!("Upstream error ({}): {}", status, body);
            let code = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
            (code, Json(ChatReply::new(UPSTREAM_FAILURE_REPLY))).into_response()
        }
        Err(e) => {
            error!("ERROR /api/chat: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, Json(ChatReply::new(SERVER_ERROR_REPLY))).into_response()
        }
    }
}

async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn entry_page_handler(State(state): State<AppState>, method: Method) -> Response {
    if method != Method::GET && method != Method::HEAD {
        return StatusCode::NOT_FOUND.into_response();
    }

    let path = state.static_dir.join("index.html");
    match tokio::fs::read_to_string(&path).await {
        Ok(page) => Html(page).into_response(),
        Err(e) => {
            warn!("Entry page '{}' unavailable: {}", path.display(), e);
            StatusCode::NOT_FOUND.into_response()
        }
    }
}

async fn log_requests(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let started = Instant::now();
    let response = next.run(req).await;
    info!(
        "{} {} {} {}ms",
        method,
        path,
        response.status().as_u16(),
        started.elapsed().as_millis()
    );
    response
}
