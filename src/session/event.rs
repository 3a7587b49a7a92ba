//! Events that drive the session state machine

use crate::store::{Language, Message};

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    /// The visitor submitted an utterance.
    UserSubmit { text: String },

    /// The backend answered the in-flight dispatch with a usable reply.
    ReplyReceived {
        text: String,
        noms: Vec<String>,
        lang: Language,
    },

    /// The in-flight dispatch failed: transport error, non-2xx status, or a
    /// response missing its message. All three recover identically.
    ReplyFailed,

    /// Prior conversation history arrived, already translated to the local
    /// message shape and in backend order.
    HistoryLoaded { entries: Vec<Message> },

    /// History replay failed. Non-fatal; the session stays usable.
    HistoryFailed,
}
