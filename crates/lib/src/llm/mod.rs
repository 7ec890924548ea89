//! LLM provider abstraction and Anthropic client.
//!
//! The relay talks to the provider through [`ChatProvider`] so that history normalization and
//! error classification can be exercised without a live provider.

mod anthropic;

pub use anthropic::{AnthropicClient, ContentBlock, MessagesRequest, MessagesResponse};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Provider-side message role. The provider only accepts these two in the message list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One entry of the provider-bound message sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Everything a single provider call needs. The API key is per call; providers hold no credential.
#[derive(Debug, Clone)]
pub struct CompletionRequest<'a> {
    pub api_key: &'a str,
    pub system: &'a str,
    pub messages: &'a [ChatMessage],
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("provider request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// Non-success status; the payload is "<status> <body>".
    #[error("{0}")]
    Api(String),
    #[error("provider response could not be decoded: {0}")]
    Decode(String),
}

/// Language-model provider: system prompt + ordered messages in, content blocks out.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Short provider name for logs.
    fn name(&self) -> &str;

    /// Run one completion. Returns the response's content blocks in order.
    async fn complete(
        &self,
        request: CompletionRequest<'_>,
    ) -> Result<Vec<ContentBlock>, ProviderError>;
}
