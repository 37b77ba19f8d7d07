//! Chat widget client: conversation state, rendering, persistence and the
//! send/fallback cycle against the proxy.
//!
//! A send is split into [`Widget::begin_send`] and [`Widget::finish_send`] so
//! several sends can be in flight at once. Replies are appended in the order
//! they finish; nothing fences a slow reply behind a newer one.

pub mod conversation;
pub mod fallback;
pub mod panel;
pub mod render;
pub mod storage;
pub mod transport;

use chrono::Utc;
use log::{info, warn};
use serde_json::Value;
use thiserror::Error;

use crate::models::chat::ChatRequest;
use self::conversation::{Conversation, Role};
use self::fallback::local_reply;
use self::panel::PanelState;
use self::render::{render_conversation, RenderedView};
use self::storage::{load_conversation, save_conversation, ConversationStore, StorageError};
use self::transport::{ChatTransport, TransportError, TransportResponse};

/// Shown when the proxy answered successfully but without a reply.
pub const MISSING_REPLY: &str = "Кешіріңіз, серверден жауап алмадым.";

#[derive(Debug, Error)]
pub enum WidgetError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

#[derive(Debug, Clone, Default)]
pub struct WidgetConfig {
    /// Sent as `system` when set. The proxy's persona applies otherwise.
    pub system_prompt: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySource {
    Proxy,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedReply {
    pub text: String,
    pub source: ReplySource,
}

/// A send that has shown its placeholder and is waiting for the proxy.
#[derive(Debug, Clone)]
pub struct PendingSend {
    pub token: String,
    pub user_text: String,
    pub request: ChatRequest,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Blank input; nothing changed.
    Ignored,
    Replied(ResolvedReply),
}

/// Turns the proxy outcome into the assistant text.
///
/// Any failure (transport error, non-success status, undecodable body) falls
/// back to the local responder on the user's own text.
pub fn resolve_reply(
    user_text: &str,
    outcome: Result<TransportResponse, TransportError>
) -> ResolvedReply {
    let fallback = || ResolvedReply {
        text: local_reply(user_text).to_string(),
        source: ReplySource::Fallback,
    };

    let response = match outcome {
        Ok(response) => response,
        Err(e) => {
            warn!("Proxy request failed, using local reply: {}", e);
            return fallback();
        }
    };
    if !response.is_success() {
        warn!("Proxy answered {}, using local reply", response.status);
        return fallback();
    }

    match serde_json::from_str::<Value>(&response.body) {
        Ok(body) => {
            let text = body
                .get("reply")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .unwrap_or(MISSING_REPLY)
                .to_string();
            ResolvedReply { text, source: ReplySource::Proxy }
        }
        Err(e) => {
            warn!("Proxy body is not JSON, using local reply: {}", e);
            fallback()
        }
    }
}

pub struct Widget<S: ConversationStore, T: ChatTransport> {
    store: S,
    transport: T,
    config: WidgetConfig,
    conversation: Conversation,
    view: RenderedView,
    panel: PanelState,
    next_token: u64,
}

impl<S: ConversationStore, T: ChatTransport> Widget<S, T> {
    /// Restores the stored conversation, or seeds the greeting, and renders it.
    pub fn load(store: S, transport: T, config: WidgetConfig) -> Result<Self, WidgetError> {
        let now = now_millis();
        let conversation = match load_conversation(&store)? {
            Some(conversation) => conversation,
            None => {
                info!("No stored conversation, starting with the greeting");
                Conversation::seeded(now)
            }
        };
        let view = render_conversation(&conversation);

        Ok(Self {
            store,
            transport,
            config,
            conversation,
            view,
            panel: PanelState::default(),
            next_token: now.max(0) as u64,
        })
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn view(&self) -> &RenderedView {
        &self.view
    }

    pub fn panel(&self) -> PanelState {
        self.panel
    }

    pub fn toggle_panel(&mut self) -> &'static str {
        self.panel.toggle()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn clear(&mut self) -> Result<(), WidgetError> {
        self.conversation.clear(now_millis());
        self.commit()
    }

    /// Appends the user message and a typing placeholder.
    ///
    /// Returns `None` for blank input, in which case nothing changes.
    pub fn begin_send(&mut self, text: &str) -> Result<Option<PendingSend>, WidgetError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }

        self.conversation.push(Role::User, text, now_millis());
        self.commit()?;

        let request = ChatRequest {
            system: self.config.system_prompt.clone(),
            messages: self.conversation.completion_messages(),
        };

        self.next_token += 1;
        let token = self.next_token.to_string();
        self.conversation.push_typing(token.clone(), now_millis());
        self.commit()?;

        Ok(Some(PendingSend {
            token,
            user_text: text.to_string(),
            request,
        }))
    }

    /// Replaces the placeholder of `pending` with the resolved reply.
    pub fn finish_send(
        &mut self,
        pending: PendingSend,
        outcome: Result<TransportResponse, TransportError>
    ) -> Result<ResolvedReply, WidgetError> {
        let reply = resolve_reply(&pending.user_text, outcome);
        if !self.conversation.remove_by_id(&pending.token) {
            warn!("Typing placeholder {} was already gone", pending.token);
        }
        self.conversation.push(Role::Assistant, reply.text.clone(), now_millis());
        self.commit()?;
        Ok(reply)
    }

    pub async fn send(&mut self, text: &str) -> Result<SendOutcome, WidgetError> {
        let pending = match self.begin_send(text)? {
            Some(pending) => pending,
            None => return Ok(SendOutcome::Ignored),
        };
        let outcome = self.transport.post_chat(&pending.request).await;
        let reply = self.finish_send(pending, outcome)?;
        Ok(SendOutcome::Replied(reply))
    }

    fn commit(&mut self) -> Result<(), WidgetError> {
        save_conversation(&mut self.store, &self.conversation)?;
        self.view = render_conversation(&self.conversation);
        Ok(())
    }
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
