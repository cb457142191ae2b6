use tracing::error;

use crate::llm::TextGenerator;
use crate::models::{ChatMessage, ChatRole, Layout};
use crate::render::{FONTS, THEMES};

pub const GREETING: &str =
    "Hi! I can answer questions about slide layouts, themes, fonts, and how to generate a deck. Ask me anything!";
pub const OFFLINE_REPLY: &str =
    "I'm sorry, I'm currently offline (API key missing). Please contact the admin.";
pub const FAILURE_REPLY: &str =
    "I encountered an error processing your request. Please try again later.";

/// Static context blob sent with every turn. The assistant sees the studio's
/// actual vocabulary instead of hallucinating features.
fn assistant_instruction() -> String {
    let layouts = Layout::RECOGNIZED.join(", ");
    let themes: Vec<&str> = THEMES.iter().map(|t| t.name).collect();
    let fonts: Vec<&str> = FONTS.iter().map(|f| f.name).collect();
    format!(
        "You are the helpful assistant for the AI Deck Studio. \
         The studio turns source text into a slide deck. \
         Available slide layouts: {layouts}. \
         Available themes: {themes}. Available fonts: {fonts}. \
         Generation modes: strict (summarize only the given text) and creative (may expand with examples). \
         Answer visitor questions based on this data. \
         Keep answers concise, friendly, and professional. \
         Do not invent layouts, themes, or features not listed here.",
        themes = themes.join(", "),
        fonts = fonts.join(", "),
    )
}

/// In-memory transcript, seeded with the fixed greeting. Never persisted.
#[derive(Debug, Clone)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Default for Transcript {
    fn default() -> Self {
        Self {
            messages: vec![ChatMessage {
                role: ChatRole::Assistant,
                content: GREETING.to_string(),
            }],
        }
    }
}

impl Transcript {
    pub fn push_user(&mut self, content: &str) {
        self.messages.push(ChatMessage { role: ChatRole::User, content: content.to_string() });
    }

    pub fn push_assistant(&mut self, content: &str) {
        self.messages.push(ChatMessage { role: ChatRole::Assistant, content: content.to_string() });
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// One assistant turn: the fixed instruction plus the single latest user
/// message (no history replay). Every failure collapses to a fixed fallback
/// string rather than an error reaching the caller.
pub async fn reply(generator: Option<&dyn TextGenerator>, user_message: &str) -> String {
    let Some(generator) = generator else {
        return OFFLINE_REPLY.to_string();
    };
    match generator.generate(&assistant_instruction(), user_message).await {
        Ok(text) => text,
        Err(e) => {
            error!("chat reply failed: {e}");
            FAILURE_REPLY.to_string()
        }
    }
}
