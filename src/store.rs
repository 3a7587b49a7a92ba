//! Conversation log
//!
//! An append-only, ordered sequence of messages. Insertion order is display
//! order. The store is seeded with a single synthetic greeting before any
//! network activity completes and is owned exclusively by the session
//! runtime; renderers consume broadcast events instead of mutating it.

use serde::{Deserialize, Serialize};

/// Greeting shown before any backend round-trip.
pub const GREETING: &str = "Hello! I'm your Import Bot, ready to assist you in determining tariffs, taxes, and necessary certifications for your imports. Just provide the product you want to import, its country of origin, and an estimated value. No worries if you’re missing some details—we’ll make the most of the information you have!";

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Bot,
}

/// Reply language, as tagged by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Es,
    #[default]
    En,
}

/// One turn in the conversation. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub text: String,
    /// Regulatory reference codes attached by the backend. Only meaningful
    /// for bot messages; de-duplicated at display time, kept verbatim here.
    #[serde(default)]
    pub noms: Vec<String>,
    #[serde(default)]
    pub lang: Language,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            noms: Vec::new(),
            lang: Language::default(),
        }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            role: Role::Bot,
            text: text.into(),
            noms: Vec::new(),
            lang: Language::default(),
        }
    }

    pub fn bot_with(text: impl Into<String>, noms: Vec<String>, lang: Language) -> Self {
        Self {
            role: Role::Bot,
            text: text.into(),
            noms,
            lang,
        }
    }
}

/// Append-only conversation store
#[derive(Debug)]
pub struct ConversationStore {
    messages: Vec<Message>,
}

impl ConversationStore {
    /// Create a store seeded with the greeting.
    pub fn new() -> Self {
        Self {
            messages: vec![Message::bot(GREETING)],
        }
    }

    pub fn append(&mut self, message: Message) -> &Message {
        self.messages.push(message);
        self.messages.last().expect("store is never empty")
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Owned copy of the log for renderer initialization.
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.clone()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}
