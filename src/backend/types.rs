//! Wire types for the backend endpoints

use crate::identity::Identity;
use crate::store::{Language, Message};
use serde::{Deserialize, Serialize};

/// Body for POST `/ai/importation/`.
///
/// Exactly one of `user_email` / `user_id` is present, never both; which one
/// depends on the identity variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptRequest {
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl PromptRequest {
    pub fn new(identity: &Identity, prompt: impl Into<String>) -> Self {
        let (user_email, user_id) = match identity {
            Identity::Authenticated { email, .. } => (Some(email.clone()), None),
            Identity::Anonymous { session_id } => (None, Some(session_id.clone())),
        };
        Self {
            prompt: prompt.into(),
            user_email,
            user_id,
        }
    }
}

/// Body of a successful POST `/ai/importation/` response.
///
/// `message` is optional on the wire; a missing or empty message is treated
/// as a failed dispatch by the runtime.
#[derive(Debug, Clone, Deserialize)]
pub struct PromptResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub noms: Vec<String>,
    #[serde(default)]
    pub lang: Option<Language>,
}

/// Body of GET `/ai/bot_conversation/{email}`.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryResponse {
    pub conversation: Vec<HistoryEntry>,
}

/// Message owner tag used by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Owner {
    Ai,
    Human,
}

/// One stored message in backend shape
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryEntry {
    pub owner: Owner,
    pub message: String,
    #[serde(default)]
    pub noms: Vec<String>,
    #[serde(default)]
    pub lang: Option<Language>,
}

impl HistoryEntry {
    /// Translate into the local message shape (`ai` → bot, `human` → user).
    pub fn into_message(self) -> Message {
        let lang = self.lang.unwrap_or_default();
        match self.owner {
            Owner::Ai => Message::bot_with(self.message, self.noms, lang),
            Owner::Human => Message {
                lang,
                ..Message::user(self.message)
            },
        }
    }
}

/// Body for POST `/ai/google-login/`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginNotice<'a> {
    pub email: &'a str,
}
