//! Session runtime executor

use super::{Command, SessionHandle, UiEvent};
use crate::backend::{BackendClient, HistoryEntry, PromptRequest};
use crate::identity::Identity;
use crate::session::state::FAILURE_TOAST;
use crate::session::{transition, DispatchState, Effect, Event, TransitionError};
use crate::sheet;
use crate::store::ConversationStore;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};

/// Generic session runtime that can work with any backend implementation
pub struct SessionRuntime<B: BackendClient + 'static> {
    identity: Identity,
    backend: Arc<B>,
    store: ConversationStore,
    state: DispatchState,
    command_rx: mpsc::Receiver<Command>,
    /// Completions of spawned dispatches come back through here.
    internal_rx: mpsc::Receiver<Event>,
    internal_tx: mpsc::Sender<Event>,
    ui_tx: broadcast::Sender<UiEvent>,
    download_dir: PathBuf,
}

impl<B: BackendClient + 'static> SessionRuntime<B> {
    /// Create a runtime and its handle. Subscribe on the handle before
    /// spawning `run()` to observe the init snapshot.
    pub fn new(identity: Identity, backend: B, download_dir: PathBuf) -> (Self, SessionHandle) {
        let (command_tx, command_rx) = mpsc::channel(32);
        let (internal_tx, internal_rx) = mpsc::channel(32);
        let (ui_tx, _) = broadcast::channel(128);

        let runtime = Self {
            identity,
            backend: Arc::new(backend),
            store: ConversationStore::new(),
            state: DispatchState::Idle,
            command_rx,
            internal_rx,
            internal_tx,
            ui_tx: ui_tx.clone(),
            download_dir,
        };

        (runtime, SessionHandle::new(command_tx, ui_tx))
    }

    pub async fn run(mut self) {
        tracing::info!(
            authenticated = self.identity.is_authenticated(),
            "starting chat session"
        );

        if let Identity::Authenticated { email, .. } = &self.identity {
            // Post-authentication webhook: best effort, never blocks or
            // fails the session.
            let backend = self.backend.clone();
            let email = email.clone();
            tokio::spawn(async move {
                if let Err(e) = backend.notify_login(&email).await {
                    tracing::debug!(error = %e, "login notification failed");
                }
            });
        }

        let _ = self.ui_tx.send(UiEvent::Init {
            messages: self.store.snapshot(),
            awaiting: self.state.is_awaiting(),
        });

        // History replays before any command is drained, so restored
        // messages always precede this session's dispatched pairs.
        self.load_history().await;

        loop {
            tokio::select! {
                // Commands drain ahead of dispatch completions so that
                // precondition checks see the state their sender saw.
                biased;

                command = self.command_rx.recv() => match command {
                    Some(command) => self.handle_command(command).await,
                    // All handles dropped: stop. An in-flight dispatch that
                    // resolves later finds a closed channel and dies with
                    // this task, never touching a discarded store.
                    None => break,
                },
                Some(event) = self.internal_rx.recv() => self.handle_event(event),
            }
        }

        tracing::info!("chat session stopped");
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Submit { text } => self.handle_event(Event::UserSubmit { text }),
            Command::DownloadSheet => self.download_sheet().await,
        }
    }

    fn handle_event(&mut self, event: Event) {
        let result = match transition(self.state, event) {
            Ok(result) => result,
            Err(
                e @ (TransitionError::DispatchInFlight | TransitionError::EmptyUtterance),
            ) => {
                // Precondition violations are silent: no message, no toast.
                tracing::debug!(reason = %e, "submission dropped");
                return;
            }
            Err(e) => {
                tracing::warn!(error = %e, "discarding event");
                return;
            }
        };

        let old_state = std::mem::replace(&mut self.state, result.new_state);
        if old_state != self.state {
            let _ = self.ui_tx.send(UiEvent::Dispatch {
                awaiting: self.state.is_awaiting(),
            });
        }

        for effect in result.effects {
            self.execute_effect(effect);
        }
    }

    fn execute_effect(&mut self, effect: Effect) {
        match effect {
            Effect::Append(message) => {
                let message = self.store.append(message).clone();
                let _ = self.ui_tx.send(UiEvent::Message { message });
            }
            Effect::Toast { text } => {
                let _ = self.ui_tx.send(UiEvent::Toast { text });
            }
            Effect::SendPrompt { prompt } => {
                let request = PromptRequest::new(&self.identity, prompt);
                let backend = self.backend.clone();
                let events = self.internal_tx.clone();
                tokio::spawn(async move {
                    let event = dispatch_request(&*backend, request).await;
                    let _ = events.send(event).await;
                });
            }
        }
    }

    async fn load_history(&mut self) {
        let Identity::Authenticated { email, .. } = &self.identity else {
            return;
        };

        let event = match self.backend.fetch_history(email).await {
            Ok(entries) => Event::HistoryLoaded {
                entries: entries.into_iter().map(HistoryEntry::into_message).collect(),
            },
            Err(e) => {
                tracing::warn!(error = %e, "history fetch failed");
                Event::HistoryFailed
            }
        };
        self.handle_event(event);
    }

    async fn download_sheet(&mut self) {
        let Identity::Authenticated {
            email,
            display_name,
        } = &self.identity
        else {
            // No download affordance for anonymous sessions.
            tracing::debug!("sheet download ignored for anonymous session");
            return;
        };
        let email = email.clone();
        let display_name = display_name.clone();

        let bytes = match self.backend.download_sheet(&email).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(error = %e, "sheet download failed");
                let _ = self.ui_tx.send(UiEvent::Toast {
                    text: FAILURE_TOAST.to_string(),
                });
                return;
            }
        };

        match sheet::save(&self.download_dir, &display_name, &bytes).await {
            Ok(path) => {
                let _ = self.ui_tx.send(UiEvent::SheetSaved { path });
                let _ = self.ui_tx.send(UiEvent::Toast {
                    text: sheet::DOWNLOAD_TOAST.to_string(),
                });
            }
            Err(e) => {
                tracing::warn!(error = %e, "sheet write failed");
                let _ = self.ui_tx.send(UiEvent::Toast {
                    text: FAILURE_TOAST.to_string(),
                });
            }
        }
    }
}

/// Run one dispatch round-trip and translate the outcome into an event.
///
/// Every outcome maps to a terminal event, so the machine always returns to
/// idle: transport errors, non-2xx statuses, and responses missing their
/// message all collapse into `ReplyFailed`.
async fn dispatch_request<B: BackendClient + ?Sized>(
    backend: &B,
    request: PromptRequest,
) -> Event {
    match backend.send_prompt(request).await {
        Ok(response) => match response.message.filter(|m| !m.is_empty()) {
            Some(text) => Event::ReplyReceived {
                text,
                noms: response.noms,
                lang: response.lang.unwrap_or_default(),
            },
            None => {
                tracing::warn!("importation response missing message");
                Event::ReplyFailed
            }
        },
        Err(e) => {
            tracing::warn!(error = %e, kind = ?e.kind, "dispatch failed");
            Event::ReplyFailed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{GatedBackend, MockBackend};
    use super::*;
    use crate::session::state::{HISTORY_APOLOGY, REQUEST_APOLOGY};
    use crate::store::{Language, Role, GREETING};
    use crate::backend::{BackendError, PromptResponse};
    use tokio::sync::broadcast::Receiver;
    use tokio::time::{timeout, Duration};

    fn anonymous() -> Identity {
        Identity::Anonymous {
            session_id: "4815162".to_string(),
        }
    }

    fn authenticated() -> Identity {
        Identity::Authenticated {
            email: "user@example.com".to_string(),
            display_name: "Ada Lovelace".to_string(),
        }
    }

    fn reply(message: &str, noms: &[&str]) -> PromptResponse {
        serde_json::from_value(serde_json::json!({
            "message": message,
            "noms": noms,
        }))
        .unwrap()
    }

    async fn next_event(rx: &mut Receiver<UiEvent>) -> UiEvent {
        timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("event within timeout")
            .expect("channel open")
    }

    /// Collect message texts until `count` messages have been observed.
    async fn collect_messages(rx: &mut Receiver<UiEvent>, count: usize) -> Vec<crate::store::Message> {
        let mut messages = Vec::new();
        while messages.len() < count {
            if let UiEvent::Message { message } = next_event(rx).await {
                messages.push(message);
            }
        }
        messages
    }

    #[tokio::test]
    async fn anonymous_dispatch_round_trip() {
        let backend = MockBackend::new();
        backend.queue_reply(reply("Estimated duty: 15%", &["NOM-050-SCFI-2004"]));

        let (runtime, handle) =
            SessionRuntime::new(anonymous(), backend.clone(), PathBuf::from("."));
        let mut rx = handle.subscribe();
        tokio::spawn(runtime.run());

        let UiEvent::Init { messages, awaiting } = next_event(&mut rx).await else {
            panic!("expected init first");
        };
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].text, GREETING);
        assert!(!awaiting);

        handle
            .submit("Import 500 units of steel pipe from China")
            .await;

        let log = collect_messages(&mut rx, 2).await;
        assert_eq!(log[0].role, Role::User);
        assert_eq!(log[0].text, "Import 500 units of steel pipe from China");
        assert_eq!(log[1].role, Role::Bot);
        assert_eq!(log[1].text, "Estimated duty: 15%");
        assert_eq!(log[1].noms, vec!["NOM-050-SCFI-2004"]);
        assert_eq!(log[1].lang, Language::En);

        // Exactly one payload, carrying user_id and omitting user_email.
        let prompts = backend.recorded_prompts();
        assert_eq!(prompts.len(), 1);
        assert_eq!(prompts[0]["prompt"], "Import 500 units of steel pipe from China");
        assert_eq!(prompts[0]["user_id"], "4815162");
        assert!(prompts[0].get("user_email").is_none());
    }

    #[tokio::test]
    async fn failed_dispatch_appends_fallback_and_returns_to_idle() {
        let backend = MockBackend::new();
        backend.queue_prompt_error(BackendError::network("connection refused"));
        backend.set_history(Ok(vec![]));

        let (runtime, handle) =
            SessionRuntime::new(authenticated(), backend.clone(), PathBuf::from("."));
        let mut rx = handle.subscribe();
        tokio::spawn(runtime.run());

        handle.submit("will this import clear customs?").await;

        let mut saw_toast = false;
        let mut messages = Vec::new();
        let mut awaiting_states = Vec::new();
        while messages.len() < 2 || awaiting_states.last() != Some(&false) || !saw_toast {
            match next_event(&mut rx).await {
                UiEvent::Message { message } => messages.push(message),
                UiEvent::Toast { .. } => saw_toast = true,
                UiEvent::Dispatch { awaiting } => awaiting_states.push(awaiting),
                _ => {}
            }
        }

        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[1].role, Role::Bot);
        assert_eq!(messages[1].text, REQUEST_APOLOGY);
        assert!(saw_toast);
        assert_eq!(awaiting_states, vec![true, false]);

        // Payload carried user_email and omitted user_id.
        let prompts = backend.recorded_prompts();
        assert_eq!(prompts[0]["user_email"], "user@example.com");
        assert!(prompts[0].get("user_id").is_none());
    }

    #[tokio::test]
    async fn history_replays_before_first_dispatch() {
        let backend = MockBackend::new();
        backend.set_history(Ok(serde_json::from_value(serde_json::json!([
            {"owner": "human", "message": "importing candles"},
            {"owner": "ai", "message": "NOM labeling applies", "noms": ["NOM-051-SCFI-2010"]}
        ]))
        .unwrap()));
        backend.queue_reply(reply("still applies", &[]));

        let (runtime, handle) =
            SessionRuntime::new(authenticated(), backend.clone(), PathBuf::from("."));
        let mut rx = handle.subscribe();

        // Submit before the runtime even starts: the command must still
        // land after the replayed history.
        handle.submit("and for soaps?").await;
        tokio::spawn(runtime.run());

        let log = collect_messages(&mut rx, 4).await;
        let texts: Vec<_> = log.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(
            texts,
            vec!["importing candles", "NOM labeling applies", "and for soaps?", "still applies"]
        );
        assert_eq!(log[0].role, Role::User);
        assert_eq!(log[1].role, Role::Bot);
    }

    #[tokio::test]
    async fn history_failure_appends_one_apology_and_session_stays_usable() {
        let backend = MockBackend::new();
        backend.set_history(Err(BackendError::network("backend down")));
        backend.queue_reply(reply("recovered", &[]));

        let (runtime, handle) =
            SessionRuntime::new(authenticated(), backend.clone(), PathBuf::from("."));
        let mut rx = handle.subscribe();
        tokio::spawn(runtime.run());

        let apology = collect_messages(&mut rx, 1).await;
        assert_eq!(apology[0].role, Role::Bot);
        assert_eq!(apology[0].text, HISTORY_APOLOGY);

        // Still idle and usable for new dispatches.
        handle.submit("hello?").await;
        let log = collect_messages(&mut rx, 2).await;
        assert_eq!(log[0].text, "hello?");
        assert_eq!(log[1].text, "recovered");
    }

    #[tokio::test]
    async fn second_submission_while_awaiting_is_dropped() {
        let backend = GatedBackend::new();
        backend.queue_reply(reply("first answer", &[]));

        let (runtime, handle) =
            SessionRuntime::new(anonymous(), backend.clone(), PathBuf::from("."));
        let mut rx = handle.subscribe();
        tokio::spawn(runtime.run());

        handle.submit("first").await;
        backend.started().await;

        // Arrives while the first dispatch is in flight: rejected, not
        // queued. The release below is only sent afterwards, and commands
        // drain ahead of completions.
        handle.submit("second").await;
        backend.release();

        let log = collect_messages(&mut rx, 2).await;
        let texts: Vec<_> = log.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "first answer"]);
        assert_eq!(backend.recorded_prompts().len(), 1);
    }

    #[tokio::test]
    async fn blank_utterances_never_reach_the_backend() {
        let backend = MockBackend::new();
        backend.queue_reply(reply("ok", &[]));

        let (runtime, handle) =
            SessionRuntime::new(anonymous(), backend.clone(), PathBuf::from("."));
        let mut rx = handle.subscribe();
        tokio::spawn(runtime.run());

        handle.submit("\n  \n").await;
        handle.submit("real question").await;

        let log = collect_messages(&mut rx, 2).await;
        assert_eq!(log[0].text, "real question");
        assert_eq!(backend.recorded_prompts().len(), 1);
    }

    #[tokio::test]
    async fn login_notice_fires_for_authenticated_sessions_only() {
        let backend = MockBackend::new();
        backend.set_history(Ok(vec![]));

        let (runtime, handle) =
            SessionRuntime::new(authenticated(), backend.clone(), PathBuf::from("."));
        let mut rx = handle.subscribe();
        tokio::spawn(runtime.run());
        let _ = next_event(&mut rx).await;

        backend.login_notified().await;
        assert_eq!(backend.recorded_logins(), vec!["user@example.com"]);

        let anon_backend = MockBackend::new();
        let (runtime, handle) =
            SessionRuntime::new(anonymous(), anon_backend.clone(), PathBuf::from("."));
        let mut rx = handle.subscribe();
        tokio::spawn(runtime.run());
        let _ = next_event(&mut rx).await;
        assert!(anon_backend.recorded_logins().is_empty());
    }

    #[tokio::test]
    async fn login_notice_failure_is_swallowed() {
        let backend = MockBackend::new();
        backend.set_login(Err(BackendError::network("unreachable")));
        backend.set_history(Ok(vec![]));
        backend.queue_reply(reply("fine", &[]));

        let (runtime, handle) =
            SessionRuntime::new(authenticated(), backend.clone(), PathBuf::from("."));
        let mut rx = handle.subscribe();
        tokio::spawn(runtime.run());

        handle.submit("does login matter?").await;
        let log = collect_messages(&mut rx, 2).await;
        assert_eq!(log[1].text, "fine");
    }

    #[tokio::test]
    async fn sheet_download_saves_and_toasts() {
        let dir = tempfile::tempdir().unwrap();
        let backend = MockBackend::new();
        backend.set_history(Ok(vec![]));
        backend.set_sheet(Ok(b"findings".to_vec()));

        let (runtime, handle) =
            SessionRuntime::new(authenticated(), backend.clone(), dir.path().to_path_buf());
        let mut rx = handle.subscribe();
        tokio::spawn(runtime.run());

        handle.download_sheet().await;

        let mut saved_path = None;
        let mut toast = None;
        while saved_path.is_none() || toast.is_none() {
            match next_event(&mut rx).await {
                UiEvent::SheetSaved { path } => saved_path = Some(path),
                UiEvent::Toast { text } => toast = Some(text),
                _ => {}
            }
        }

        let path = saved_path.unwrap();
        assert!(path.starts_with(dir.path()));
        assert_eq!(std::fs::read(&path).unwrap(), b"findings");
        assert_eq!(toast.unwrap(), sheet::DOWNLOAD_TOAST);
    }

    #[tokio::test]
    async fn sheet_download_is_a_no_op_for_anonymous_sessions() {
        let backend = MockBackend::new();
        let (runtime, handle) =
            SessionRuntime::new(anonymous(), backend.clone(), PathBuf::from("."));
        let mut rx = handle.subscribe();
        tokio::spawn(runtime.run());
        let _ = next_event(&mut rx).await;

        handle.download_sheet().await;
        backend.queue_reply(reply("done", &[]));
        handle.submit("anything").await;

        // The next events are the dispatch pair; no sheet or toast events
        // were produced in between.
        let mut saw_sheet_or_toast = false;
        let mut messages = 0;
        while messages < 2 {
            match next_event(&mut rx).await {
                UiEvent::Message { .. } => messages += 1,
                UiEvent::SheetSaved { .. } | UiEvent::Toast { .. } => saw_sheet_or_toast = true,
                _ => {}
            }
        }
        assert!(!saw_sheet_or_toast);
        assert!(backend.recorded_sheet_requests().is_empty());
    }
}
