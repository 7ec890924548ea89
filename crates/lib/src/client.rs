//! HTTP client for the relay (`POST {relay}/api/chat`), used by the CLI and the desktop.

use crate::relay::{RelayErrorBody, RelayReply, RelayRequest};

/// Client for one relay base URL.
#[derive(Clone)]
pub struct RelayClient {
    base_url: String,
    client: reqwest::Client,
}

/// Why a relay call failed. `Display` is the reason shown to the user in the chat transcript.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    /// Non-2xx: the relay's `error` text when it sent one, else "HTTP <code>".
    #[error("{message}")]
    Status { status: u16, message: String },
    #[error("unexpected relay response: {0}")]
    Decode(String),
}

impl RelayClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send one chat request; returns the reply text.
    pub async fn chat(&self, request: &RelayRequest) -> Result<String, ClientError> {
        let url = format!("{}/api/chat", self.base_url);
        let res = self.client.post(&url).json(request).send().await?;
        let status = res.status();
        let body = res.text().await?;
        if !status.is_success() {
            let message = serde_json::from_str::<RelayErrorBody>(&body)
                .ok()
                .map(|b| b.error)
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            return Err(ClientError::Status {
                status: status.as_u16(),
                message,
            });
        }
        let reply: RelayReply =
            serde_json::from_str(&body).map_err(|e| ClientError::Decode(e.to_string()))?;
        Ok(reply.reply)
    }
}
