use chrono::{Local, TimeZone};

use super::conversation::{Conversation, Message, Role};

pub const TYPING_SUFFIX: &str = " · typing…";

const USER_CLASSES: &str = "bg-gray-900 text-white rounded-br-sm";
const BOT_CLASSES: &str = "bg-gray-100 text-gray-900 rounded-bl-sm";

/// Result of a full redraw.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderedView {
    pub html: String,
    /// Index of the message the view scrolls to after drawing.
    pub scroll_to: Option<usize>,
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Local wall-clock time of `ts`; a missing timestamp shows the current time.
pub fn format_time(ts: i64) -> String {
    let time = if ts == 0 {
        Local::now()
    } else {
        match Local.timestamp_millis_opt(ts).single() {
            Some(t) => t,
            None => Local::now(),
        }
    };
    time.format("%H:%M:%S").to_string()
}

pub fn render_message(message: &Message) -> String {
    let is_user = message.role == Role::User;
    let (justify, classes) = if is_user {
        ("justify-end", USER_CLASSES)
    } else {
        ("justify-start", BOT_CLASSES)
    };
    let suffix = if message.typing { TYPING_SUFFIX } else { "" };

    format!(
        concat!(
            "<div class=\"flex {}\">",
            "<div class=\"max-w-[75%] rounded-2xl px-4 py-2 text-sm leading-relaxed shadow {}\">",
            "<div>{}</div>",
            "<div class=\"text-[10px] opacity-60 mt-1\">{}{}</div>",
            "</div></div>"
        ),
        justify,
        classes,
        escape_html(&message.content),
        format_time(message.ts),
        suffix
    )
}

pub fn render_conversation(conversation: &Conversation) -> RenderedView {
    let html = conversation.messages().iter().map(render_message).collect::<Vec<_>>().join("\n");
    RenderedView {
        html,
        scroll_to: conversation.len().checked_sub(1),
    }
}
