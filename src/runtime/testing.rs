//! Mock backend for runtime tests
//!
//! Queued responses plus recorded requests, so tests can assert on the exact
//! wire payloads without real I/O.

use crate::backend::{BackendClient, BackendError, HistoryEntry, PromptRequest, PromptResponse};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

#[derive(Default)]
struct MockInner {
    prompt_results: Mutex<VecDeque<Result<PromptResponse, BackendError>>>,
    history_result: Mutex<Option<Result<Vec<HistoryEntry>, BackendError>>>,
    sheet_result: Mutex<Option<Result<Vec<u8>, BackendError>>>,
    login_result: Mutex<Option<Result<(), BackendError>>>,
    /// Serialized prompt payloads, in dispatch order
    prompts: Mutex<Vec<serde_json::Value>>,
    history_requests: Mutex<Vec<String>>,
    sheet_requests: Mutex<Vec<String>>,
    logins: Mutex<Vec<String>>,
    login_notify: Notify,
}

/// Mock backend with queued results and recorded calls
#[derive(Clone, Default)]
pub struct MockBackend {
    inner: Arc<MockInner>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful prompt reply
    pub fn queue_reply(&self, response: PromptResponse) {
        self.inner
            .prompt_results
            .lock()
            .unwrap()
            .push_back(Ok(response));
    }

    /// Queue a failed prompt dispatch
    pub fn queue_prompt_error(&self, error: BackendError) {
        self.inner
            .prompt_results
            .lock()
            .unwrap()
            .push_back(Err(error));
    }

    pub fn set_history(&self, result: Result<Vec<HistoryEntry>, BackendError>) {
        *self.inner.history_result.lock().unwrap() = Some(result);
    }

    pub fn set_sheet(&self, result: Result<Vec<u8>, BackendError>) {
        *self.inner.sheet_result.lock().unwrap() = Some(result);
    }

    pub fn set_login(&self, result: Result<(), BackendError>) {
        *self.inner.login_result.lock().unwrap() = Some(result);
    }

    /// Serialized prompt payloads, in dispatch order
    pub fn recorded_prompts(&self) -> Vec<serde_json::Value> {
        self.inner.prompts.lock().unwrap().clone()
    }

    pub fn recorded_logins(&self) -> Vec<String> {
        self.inner.logins.lock().unwrap().clone()
    }

    pub fn recorded_sheet_requests(&self) -> Vec<String> {
        self.inner.sheet_requests.lock().unwrap().clone()
    }

    /// Wait until a login notification has been recorded.
    pub async fn login_notified(&self) {
        loop {
            let notified = self.inner.login_notify.notified();
            if !self.inner.logins.lock().unwrap().is_empty() {
                return;
            }
            notified.await;
        }
    }

    fn record_prompt(&self, request: &PromptRequest) {
        let value = serde_json::to_value(request).expect("prompt request serializes");
        self.inner.prompts.lock().unwrap().push(value);
    }

    fn pop_prompt_result(&self) -> Result<PromptResponse, BackendError> {
        self.inner
            .prompt_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(BackendError::network("no mock reply queued")))
    }
}

#[async_trait]
impl BackendClient for MockBackend {
    async fn send_prompt(&self, request: PromptRequest) -> Result<PromptResponse, BackendError> {
        self.record_prompt(&request);
        self.pop_prompt_result()
    }

    async fn fetch_history(&self, email: &str) -> Result<Vec<HistoryEntry>, BackendError> {
        self.inner
            .history_requests
            .lock()
            .unwrap()
            .push(email.to_string());
        self.inner
            .history_result
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Ok(vec![]))
    }

    async fn download_sheet(&self, email: &str) -> Result<Vec<u8>, BackendError> {
        self.inner
            .sheet_requests
            .lock()
            .unwrap()
            .push(email.to_string());
        self.inner
            .sheet_result
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Err(BackendError::network("no mock sheet queued")))
    }

    async fn notify_login(&self, email: &str) -> Result<(), BackendError> {
        self.inner.logins.lock().unwrap().push(email.to_string());
        self.inner.login_notify.notify_waiters();
        self.inner
            .login_result
            .lock()
            .unwrap()
            .take()
            .unwrap_or(Ok(()))
    }
}

/// Mock backend whose prompt dispatches block until released.
///
/// Lets tests hold a dispatch in flight deterministically, to exercise the
/// single-flight rejection path.
#[derive(Clone)]
pub struct GatedBackend {
    mock: MockBackend,
    started: Arc<Notify>,
    gate: Arc<tokio::sync::Semaphore>,
}

impl GatedBackend {
    pub fn new() -> Self {
        Self {
            mock: MockBackend::new(),
            started: Arc::new(Notify::new()),
            gate: Arc::new(tokio::sync::Semaphore::new(0)),
        }
    }

    pub fn queue_reply(&self, response: PromptResponse) {
        self.mock.queue_reply(response);
    }

    /// Wait until a dispatch has entered the backend.
    pub async fn started(&self) {
        self.started.notified().await;
    }

    /// Let one blocked dispatch proceed.
    pub fn release(&self) {
        self.gate.add_permits(1);
    }

    pub fn recorded_prompts(&self) -> Vec<serde_json::Value> {
        self.mock.recorded_prompts()
    }
}

#[async_trait]
impl BackendClient for GatedBackend {
    async fn send_prompt(&self, request: PromptRequest) -> Result<PromptResponse, BackendError> {
        self.mock.record_prompt(&request);
        // notify_one stores a permit, so the signal survives even when the
        // test has not started waiting yet.
        self.started.notify_one();
        let permit = self.gate.acquire().await.expect("gate never closes");
        permit.forget();
        self.mock.pop_prompt_result()
    }

    async fn fetch_history(&self, email: &str) -> Result<Vec<HistoryEntry>, BackendError> {
        self.mock.fetch_history(email).await
    }

    async fn download_sheet(&self, email: &str) -> Result<Vec<u8>, BackendError> {
        self.mock.download_sheet(email).await
    }

    async fn notify_login(&self, email: &str) -> Result<(), BackendError> {
        self.mock.notify_login(email).await
    }
}
