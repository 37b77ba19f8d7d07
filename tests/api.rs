use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use qazaq_chat::config::prompt::{
    PromptConfig,
    DEFAULT_PERSONA,
    EMPTY_COMPLETION_REPLY,
    SERVER_ERROR_REPLY,
    UPSTREAM_FAILURE_REPLY,
};
use qazaq_chat::llm::chat::{ChatClient, Completion};
use qazaq_chat::llm::LlmError;
use qazaq_chat::server::api::{build_router, AppState};
use qazaq_chat::server::rate_limit::{
    ApiRateLimiter,
    RATELIMIT_LIMIT,
    RATELIMIT_POLICY,
    RATELIMIT_REMAINING,
    RATE_LIMITED_MESSAGE,
};
use serde_json::{json, Value};
use tower::ServiceExt;

enum Scripted {
    Reply(Option<&'static str>),
    Refused(u16),
    Fail,
}

struct FakeChatClient {
    script: Scripted,
    calls: Mutex<Vec<Vec<Value>>>,
}

impl FakeChatClient {
    fn new(script: Scripted) -> Arc<Self> {
        Arc::new(Self { script, calls: Mutex::new(Vec::new()) })
    }

    fn calls(&self) -> Vec<Vec<Value>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatClient for FakeChatClient {
    async fn complete(&self, messages: Vec<Value>) -> Result<Completion, LlmError> {
        self.calls.lock().unwrap().push(messages);
        match &self.script {
            Scripted::Reply(content) => Ok(Completion::Reply(content.map(str::to_owned))),
            Scripted::Refused(status) => Ok(Completion::Refused {
                status: *status,
                body: json!({ "error": { "message": "rate limited" } }),
            }),
            Scripted::Fail => Err(LlmError::Decode("connection reset".into())),
        }
    }

    fn get_model(&self) -> String {
        "fake".into()
    }

    fn get_base_url(&self) -> Option<String> {
        None
    }
}

fn router_with(client: Arc<FakeChatClient>, static_dir: &std::path::Path, max: u32) -> Router {
    let state = AppState {
        chat_client: client,
        prompts: Arc::new(PromptConfig::default()),
        static_dir: static_dir.to_path_buf(),
    };
    let limiter = ApiRateLimiter::new(Duration::from_secs(60), max).unwrap();
    build_router(state, Arc::new(limiter))
}

fn router(client: Arc<FakeChatClient>) -> Router {
    router_with(client, std::path::Path::new("does-not-exist"), 30)
}

fn chat_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn empty_history_still_reaches_upstream_with_default_persona() {
    let client = FakeChatClient::new(Scripted::Reply(Some("Сәлем!")));
    let response = router(client.clone())
        .oneshot(chat_request(json!({ "messages": [] })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({ "reply": "Сәлем!" }));
    assert_eq!(client.calls(), vec![vec![json!({ "role": "system", "content": DEFAULT_PERSONA })]]);
}

#[tokio::test]
async fn upstream_status_is_mirrored_with_apology() {
    let client = FakeChatClient::new(Scripted::Refused(429));
    let response = router(client)
        .oneshot(chat_request(json!({ "messages": [{ "role": "user", "content": "Абай" }] })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(json_body(response).await, json!({ "reply": UPSTREAM_FAILURE_REPLY }));
}

#[tokio::test]
async fn upstream_failure_becomes_server_error_payload() {
    let client = FakeChatClient::new(Scripted::Fail);
    let response = router(client)
        .oneshot(chat_request(json!({ "messages": [] })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(response).await, json!({ "reply": SERVER_ERROR_REPLY }));
}

#[tokio::test]
async fn empty_completion_gets_placeholder_text() {
    let client = FakeChatClient::new(Scripted::Reply(None));
    let response = router(client)
        .oneshot(chat_request(json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({ "reply": EMPTY_COMPLETION_REPLY }));
}

#[tokio::test]
async fn client_system_and_raw_messages_are_forwarded() {
    let client = FakeChatClient::new(Scripted::Reply(Some("ok")));
    let body = json!({
        "system": "Тек тарих туралы",
        "messages": [
            { "role": "user", "content": "Сәлем" },
            { "role": "tool", "content": "unchecked" }
        ]
    });
    router(client.clone()).oneshot(chat_request(body)).await.unwrap();

    let calls = client.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0][0], json!({ "role": "system", "content": "Тек тарих туралы" }));
    assert_eq!(calls[0][2], json!({ "role": "tool", "content": "unchecked" }));
}

#[tokio::test]
async fn non_array_messages_are_dropped() {
    let client = FakeChatClient::new(Scripted::Reply(Some("ok")));
    router(client.clone())
        .oneshot(chat_request(json!({ "messages": { "role": "user" } })))
        .await
        .unwrap();

    assert_eq!(client.calls()[0].len(), 1);
}

#[tokio::test]
async fn body_without_json_content_type_is_an_empty_request() {
    let client = FakeChatClient::new(Scripted::Reply(Some("ok")));
    let request = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .body(Body::from("messages=1"))
        .unwrap();
    let response = router(client.clone()).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(client.calls(), vec![vec![json!({ "role": "system", "content": DEFAULT_PERSONA })]]);
}

#[tokio::test]
async fn empty_json_body_is_an_empty_request() {
    let client = FakeChatClient::new(Scripted::Reply(Some("ok")));
    let request = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::empty())
        .unwrap();
    let response = router(client.clone()).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({ "reply": "ok" }));
    assert_eq!(client.calls(), vec![vec![json!({ "role": "system", "content": DEFAULT_PERSONA })]]);
}

#[tokio::test]
async fn scalar_json_body_is_rejected() {
    let client = FakeChatClient::new(Scripted::Reply(Some("ok")));
    let response = router(client.clone()).oneshot(chat_request(json!("hi"))).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(client.calls().is_empty());
}

#[tokio::test]
async fn malformed_json_is_rejected_before_upstream() {
    let client = FakeChatClient::new(Scripted::Reply(Some("ok")));
    let request = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"messages\": ["))
        .unwrap();
    let response = router(client.clone()).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(client.calls().is_empty());
}

#[tokio::test]
async fn health_answers_ok_with_security_headers() {
    let client = FakeChatClient::new(Scripted::Fail);
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = router(client).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    assert_eq!(response.headers()[header::X_FRAME_OPTIONS], "SAMEORIGIN");
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"OK");
}

#[tokio::test]
async fn unknown_get_routes_serve_the_entry_page() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<div id=\"chat\"></div>").unwrap();
    let app = router_with(FakeChatClient::new(Scripted::Fail), dir.path(), 30);

    let request = Request::builder().uri("/history/kazakh-khanate").body(Body::empty()).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"<div id=\"chat\"></div>");

    let request = Request::builder().method("DELETE").uri("/anything").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn get_on_the_chat_route_serves_the_entry_page() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<main></main>").unwrap();
    let client = FakeChatClient::new(Scripted::Reply(Some("ok")));
    let app = router_with(client.clone(), dir.path(), 30);

    let request = Request::builder().uri("/api/chat").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"<main></main>");
    assert!(client.calls().is_empty());
}

#[tokio::test]
async fn missing_entry_page_is_not_found() {
    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let response = router(FakeChatClient::new(Scripted::Fail)).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn api_requests_beyond_the_ceiling_are_rejected_before_the_handler() {
    let client = FakeChatClient::new(Scripted::Reply(Some("ok")));
    let app = router_with(client.clone(), std::path::Path::new("does-not-exist"), 2);

    for remaining in ["1", "0"] {
        let response = app.clone().oneshot(chat_request(json!({}))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[RATELIMIT_LIMIT], "2");
        assert_eq!(response.headers()[RATELIMIT_REMAINING], remaining);
        assert_eq!(response.headers()[RATELIMIT_POLICY], "2;w=60");
    }
    let response = app.clone().oneshot(chat_request(json!({}))).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key(header::RETRY_AFTER));
    assert_eq!(response.headers()[RATELIMIT_REMAINING], "0");
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], RATE_LIMITED_MESSAGE.as_bytes());
    assert_eq!(client.calls().len(), 2);

    // Health is outside /api and keeps answering.
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!response.headers().contains_key(RATELIMIT_LIMIT));
}
