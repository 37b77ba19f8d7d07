use serde::{ Serialize, Deserialize };

use crate::models::chat::ChatMessage;

pub const GREETING: &str = "Сәлем! Қалай көмектесе аламын?";
pub const TYPING_CONTENT: &str = "...";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One entry of the widget history, in the shape it is persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// Epoch milliseconds. Zero when an older snapshot carried none.
    #[serde(default)]
    pub ts: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub typing: bool,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>, ts: i64) -> Self {
        Self { role, content: content.into(), ts, id: None, typing: false }
    }

    pub fn typing(id: String, ts: i64) -> Self {
        Self {
            role: Role::Assistant,
            content: TYPING_CONTENT.to_string(),
            ts,
            id: Some(id),
            typing: true,
        }
    }
}

/// Ordered widget history. Insertion order is the only ordering.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    /// A fresh history holding only the greeting.
    pub fn seeded(now: i64) -> Self {
        Self { messages: vec![Message::new(Role::Assistant, GREETING, now)] }
    }

    pub fn from_messages(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn push(&mut self, role: Role, content: impl Into<String>, now: i64) {
        self.messages.push(Message::new(role, content, now));
    }

    pub fn push_typing(&mut self, id: String, now: i64) {
        self.messages.push(Message::typing(id, now));
    }

    /// Removes the first message carrying `id`. Returns whether one was found.
    pub fn remove_by_id(&mut self, id: &str) -> bool {
        match self.messages.iter().position(|m| m.id.as_deref() == Some(id)) {
            Some(index) => {
                self.messages.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self, now: i64) {
        self.messages.clear();
        self.messages.push(Message::new(Role::Assistant, GREETING, now));
    }

    pub fn typing_count(&self) -> usize {
        self.messages.iter().filter(|m| m.typing).count()
    }

    /// The `{role, content}` view sent to the proxy, without typing placeholders.
    pub fn completion_messages(&self) -> Vec<ChatMessage> {
        self.messages
            .iter()
            .filter(|m| !m.typing)
            .map(|m| ChatMessage::new(m.role.as_str(), m.content.clone()))
            .collect()
    }
}
