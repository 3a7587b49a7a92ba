//! Pure state transition function

use super::state::{DispatchState, FAILURE_TOAST, HISTORY_APOLOGY, REQUEST_APOLOGY};
use super::{Effect, Event};
use crate::store::Message;
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: DispatchState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: DispatchState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Errors that can occur during transition.
///
/// `DispatchInFlight` and `EmptyUtterance` are precondition violations: the
/// runtime drops them silently, they are never surfaced to the visitor.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("a dispatch is already in flight")]
    DispatchInFlight,
    #[error("utterance contains no content")]
    EmptyUtterance,
    #[error("unexpected event in state {state:?}")]
    UnexpectedEvent { state: DispatchState },
}

/// Pure transition function: given the same inputs it produces the same
/// outputs, with no I/O side effects.
pub fn transition(state: DispatchState, event: Event) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // Submission: optimistic user append, then the dispatch itself.
        // The user message always precedes its bot/error counterpart.
        (DispatchState::Idle, Event::UserSubmit { text }) => {
            if text.replace('\n', "").trim().is_empty() {
                return Err(TransitionError::EmptyUtterance);
            }
            Ok(TransitionResult::new(DispatchState::Awaiting)
                .with_effect(Effect::append(Message::user(text.clone())))
                .with_effect(Effect::SendPrompt { prompt: text }))
        }

        // Single-flight: no concurrent dispatches, no queueing.
        (DispatchState::Awaiting, Event::UserSubmit { .. }) => {
            Err(TransitionError::DispatchInFlight)
        }

        (DispatchState::Awaiting, Event::ReplyReceived { text, noms, lang }) => {
            Ok(TransitionResult::new(DispatchState::Idle)
                .with_effect(Effect::append(Message::bot_with(text, noms, lang))))
        }

        (DispatchState::Awaiting, Event::ReplyFailed) => {
            Ok(TransitionResult::new(DispatchState::Idle)
                .with_effect(Effect::append(Message::bot(REQUEST_APOLOGY)))
                .with_effect(Effect::toast(FAILURE_TOAST)))
        }

        // History replay lands after the greeting, before any dispatch.
        (DispatchState::Idle, Event::HistoryLoaded { entries }) => {
            Ok(TransitionResult::new(DispatchState::Idle)
                .with_effects(entries.into_iter().map(Effect::append)))
        }

        (DispatchState::Idle, Event::HistoryFailed) => {
            Ok(TransitionResult::new(DispatchState::Idle)
                .with_effect(Effect::append(Message::bot(HISTORY_APOLOGY)))
                .with_effect(Effect::toast(FAILURE_TOAST)))
        }

        (state, _) => Err(TransitionError::UnexpectedEvent { state }),
    }
}
