use serde::{ Serialize, Deserialize };
use serde_json::Value;

/// One `{role, content}` pair as it travels between widget, proxy and upstream.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self { role: role.into(), content: content.into() }
    }
}

/// Body the widget posts to `/api/chat`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

/// Body returned by `/api/chat` in every outcome.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
}

impl ChatReply {
    pub fn new(reply: impl Into<String>) -> Self {
        Self { reply: reply.into() }
    }
}

/// Lenient view of an incoming `/api/chat` body.
///
/// The proxy forwards messages untouched, so they stay raw JSON values. A
/// `messages` field that is not an array is treated as empty.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IncomingChat {
    pub system: Option<String>,
    pub messages: Vec<Value>,
}

impl IncomingChat {
    pub fn from_value(body: &Value) -> Self {
        let system = body.get("system").and_then(truthy_text);
        let messages = match body.get("messages") {
            Some(Value::Array(items)) => items.clone(),
            _ => Vec::new(),
        };
        Self { system, messages }
    }
}

fn truthy_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64().map_or(true, |f| f != 0.0 && !f.is_nan()) => {
            Some(n.to_string())
        }
        Value::Bool(true) => Some("true".to_string()),
        _ => None,
    }
}
