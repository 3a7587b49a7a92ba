//! Session runtime
//!
//! Owns the conversation store and dispatch state, executes the effects
//! produced by the session state machine, and fans change events out to
//! renderers over a broadcast channel. All store mutation happens on the
//! runtime task.

mod executor;

#[cfg(test)]
pub mod testing;

pub use executor::SessionRuntime;

use crate::store::Message;
use std::path::PathBuf;
use tokio::sync::{broadcast, mpsc};

/// Requests from the presentation layer
#[derive(Debug, Clone)]
pub enum Command {
    /// Dispatch an utterance.
    Submit { text: String },
    /// Save the findings spreadsheet (authenticated sessions only).
    DownloadSheet,
}

/// Change events consumed by renderers
#[derive(Debug, Clone)]
pub enum UiEvent {
    /// Snapshot of the store when the runtime starts.
    Init {
        messages: Vec<Message>,
        awaiting: bool,
    },
    /// A message was appended to the store.
    Message { message: Message },
    /// The dispatch state changed.
    Dispatch { awaiting: bool },
    /// Transient user-visible notification.
    Toast { text: String },
    /// The findings spreadsheet was written to disk.
    SheetSaved { path: PathBuf },
}

/// Handle for interacting with a running session
#[derive(Clone)]
pub struct SessionHandle {
    command_tx: mpsc::Sender<Command>,
    ui_tx: broadcast::Sender<UiEvent>,
}

impl SessionHandle {
    pub(crate) fn new(
        command_tx: mpsc::Sender<Command>,
        ui_tx: broadcast::Sender<UiEvent>,
    ) -> Self {
        Self { command_tx, ui_tx }
    }

    /// Subscribe to session change events. Subscribe before spawning the
    /// runtime to observe the init snapshot.
    pub fn subscribe(&self) -> broadcast::Receiver<UiEvent> {
        self.ui_tx.subscribe()
    }

    pub async fn submit(&self, text: impl Into<String>) {
        let _ = self
            .command_tx
            .send(Command::Submit { text: text.into() })
            .await;
    }

    pub async fn download_sheet(&self) {
        let _ = self.command_tx.send(Command::DownloadSheet).await;
    }
}
