//! Visitor identity resolution
//!
//! A session is either authenticated (stable email-based identity supplied
//! by the sign-in collaborator) or anonymous (ephemeral generated id, stable
//! only for the lifetime of the process). Resolution happens exactly once at
//! startup; the result is passed explicitly to the session runtime.

use rand::Rng;
use std::ops::Range;

/// Anonymous session ids are 7-digit decimal numbers.
pub const SESSION_ID_RANGE: Range<u64> = 1_000_000..10_000_000;

/// Identity of the current visitor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Authenticated {
        email: String,
        display_name: String,
    },
    Anonymous {
        session_id: String,
    },
}

impl Identity {
    /// Resolve an identity from the upstream-provided email and display name.
    ///
    /// Absence of an email is the expected anonymous branch, not a failure.
    pub fn resolve(email: Option<String>, display_name: Option<String>) -> Self {
        Self::resolve_in_range(email, display_name, SESSION_ID_RANGE)
    }

    /// Resolve with an explicit session-id range (exposed for tests).
    pub fn resolve_in_range(
        email: Option<String>,
        display_name: Option<String>,
        range: Range<u64>,
    ) -> Self {
        match email {
            Some(email) => Identity::Authenticated {
                email,
                display_name: display_name.unwrap_or_else(|| "User".to_string()),
            },
            None => Identity::Anonymous {
                session_id: rand::thread_rng().gen_range(range).to_string(),
            },
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Identity::Authenticated { .. })
    }

    /// Email for authenticated identities
    pub fn email(&self) -> Option<&str> {
        match self {
            Identity::Authenticated { email, .. } => Some(email),
            Identity::Anonymous { .. } => None,
        }
    }

    /// Name shown on the visitor's own messages
    pub fn display_name(&self) -> &str {
        match self {
            Identity::Authenticated { display_name, .. } => display_name,
            Identity::Anonymous { .. } => "User",
        }
    }
}
