//! NaurBot backend client
//!
//! The backend performs the actual business logic (tariff computation,
//! conversation storage, spreadsheet generation); this module only speaks
//! its HTTP surface. The trait seam exists so the runtime can be tested
//! with a mock client.

mod error;
mod http;
mod types;

pub use error::{BackendError, BackendErrorKind};
pub use http::HttpBackend;
pub use types::{HistoryEntry, LoginNotice, Owner, PromptRequest, PromptResponse};

use async_trait::async_trait;

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("NAURBOT_BACKEND_URL")
                .unwrap_or_else(|_| "http://localhost:8000".to_string()),
        }
    }
}

/// Interface to the backend's HTTP endpoints
#[async_trait]
pub trait BackendClient: Send + Sync {
    /// POST an utterance to the importation endpoint.
    async fn send_prompt(&self, request: PromptRequest) -> Result<PromptResponse, BackendError>;

    /// GET the stored conversation for an authenticated visitor.
    async fn fetch_history(&self, email: &str) -> Result<Vec<HistoryEntry>, BackendError>;

    /// GET the findings spreadsheet as raw bytes.
    async fn download_sheet(&self, email: &str) -> Result<Vec<u8>, BackendError>;

    /// POST the best-effort login notification.
    async fn notify_login(&self, email: &str) -> Result<(), BackendError>;
}

#[async_trait]
impl<T: BackendClient + ?Sized> BackendClient for std::sync::Arc<T> {
    async fn send_prompt(&self, request: PromptRequest) -> Result<PromptResponse, BackendError> {
        (**self).send_prompt(request).await
    }

    async fn fetch_history(&self, email: &str) -> Result<Vec<HistoryEntry>, BackendError> {
        (**self).fetch_history(email).await
    }

    async fn download_sheet(&self, email: &str) -> Result<Vec<u8>, BackendError> {
        (**self).download_sheet(email).await
    }

    async fn notify_login(&self, email: &str) -> Result<(), BackendError> {
        (**self).notify_login(email).await
    }
}
