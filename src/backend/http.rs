//! reqwest implementation of the backend client

use super::types::HistoryResponse;
use super::{
    BackendClient, BackendError, ClientConfig, HistoryEntry, LoginNotice, PromptRequest,
    PromptResponse,
};
use async_trait::async_trait;

/// HTTP client for the NaurBot backend
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Reject non-2xx responses, carrying the status and body for logging.
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("(no body)"));
        Err(BackendError::status(status, &body))
    }
}

#[async_trait]
impl BackendClient for HttpBackend {
    async fn send_prompt(&self, request: PromptRequest) -> Result<PromptResponse, BackendError> {
        let response = self
            .client
            .post(self.url("/ai/importation/"))
            .json(&request)
            .send()
            .await
            .map_err(|e| BackendError::network(format!("importation request failed: {e}")))?;

        let response = Self::check_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| BackendError::malformed(format!("importation response: {e}")))
    }

    async fn fetch_history(&self, email: &str) -> Result<Vec<HistoryEntry>, BackendError> {
        let response = self
            .client
            .get(self.url(&format!("/ai/bot_conversation/{email}")))
            .send()
            .await
            .map_err(|e| BackendError::network(format!("history request failed: {e}")))?;

        let response = Self::check_status(response).await?;
        let body: HistoryResponse = response
            .json()
            .await
            .map_err(|e| BackendError::malformed(format!("history response: {e}")))?;
        Ok(body.conversation)
    }

    async fn download_sheet(&self, email: &str) -> Result<Vec<u8>, BackendError> {
        let response = self
            .client
            .get(self.url("/ai/get_excel/"))
            .query(&[("user_email", email)])
            .send()
            .await
            .map_err(|e| BackendError::network(format!("sheet request failed: {e}")))?;

        let response = Self::check_status(response).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| BackendError::network(format!("sheet body: {e}")))?;
        Ok(bytes.to_vec())
    }

    async fn notify_login(&self, email: &str) -> Result<(), BackendError> {
        let response = self
            .client
            .post(self.url("/ai/google-login/"))
            .json(&LoginNotice { email })
            .send()
            .await
            .map_err(|e| BackendError::network(format!("login notice failed: {e}")))?;

        Self::check_status(response).await?;
        Ok(())
    }
}
