//! Dispatch state and canned session strings

/// Whether a backend dispatch is in flight.
///
/// Single-flight: while `Awaiting`, new submissions are rejected, not
/// queued. Every outcome of a dispatch, success or failure, returns the
/// session to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchState {
    #[default]
    Idle,
    Awaiting,
}

impl DispatchState {
    pub fn is_awaiting(self) -> bool {
        matches!(self, DispatchState::Awaiting)
    }
}

/// Fallback bot reply when a dispatch fails.
pub const REQUEST_APOLOGY: &str = "Sorry, I couldn't process your request. 😔";

/// Fallback bot reply when history replay fails.
pub const HISTORY_APOLOGY: &str =
    "Sorry, I couldn't retrieve your previous messages. 😔 Please try again later.";

/// Transient notification shown alongside recovered failures.
pub const FAILURE_TOAST: &str = "Something went wrong. Please try again.";
