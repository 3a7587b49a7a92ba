//! Effects produced by state transitions

use crate::store::Message;

/// Effects to be executed by the runtime after a transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Append a message to the conversation store.
    Append(Message),

    /// Issue the backend dispatch for an utterance.
    SendPrompt { prompt: String },

    /// Surface a transient user-visible notification.
    Toast { text: String },
}

impl Effect {
    pub fn append(message: Message) -> Self {
        Effect::Append(message)
    }

    pub fn toast(text: impl Into<String>) -> Self {
        Effect::Toast { text: text.into() }
    }
}
