//! Anthropic Messages API client (https://api.anthropic.com by default).
//! Non-streaming only: one POST /v1/messages per chat turn.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{ChatMessage, ChatProvider, CompletionRequest, ProviderError};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";

/// Client for the Anthropic Messages API. Holds no credential; the key is supplied per call.
#[derive(Clone)]
pub struct AnthropicClient {
    base_url: String,
    model: String,
    max_tokens: u32,
    client: reqwest::Client,
}

impl AnthropicClient {
    pub fn new(base_url: Option<String>, model: impl Into<String>, max_tokens: u32) -> Self {
        let base_url = base_url
            .map(|u| u.trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self {
            base_url,
            model: model.into(),
            max_tokens,
            client: reqwest::Client::new(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// POST /v1/messages (non-streaming).
    pub async fn messages(
        &self,
        api_key: &str,
        body: &MessagesRequest<'_>,
    ) -> Result<MessagesResponse, ProviderError> {
        let url = format!("{}/v1/messages", self.base_url);
        let res = self
            .client
            .post(&url)
            .header("x-api-key", api_key)
            .header("anthropic-version", API_VERSION)
            .json(body)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(ProviderError::Api(format!("{} {}", status, body)));
        }
        let text = res.text().await?;
        serde_json::from_str(&text).map_err(|e| ProviderError::Decode(e.to_string()))
    }
}

#[async_trait]
impl ChatProvider for AnthropicClient {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn complete(
        &self,
        request: CompletionRequest<'_>,
    ) -> Result<Vec<ContentBlock>, ProviderError> {
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            system: request.system,
            messages: request.messages,
        };
        log::debug!(
            "anthropic: model {} with {} message(s)",
            self.model,
            request.messages.len()
        );
        let res = self.messages(request.api_key, &body).await?;
        Ok(res.content)
    }
}

/// Request body for POST /v1/messages.
#[derive(Debug, Serialize)]
pub struct MessagesRequest<'a> {
    pub model: &'a str,
    pub max_tokens: u32,
    pub system: &'a str,
    pub messages: &'a [ChatMessage],
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessagesResponse {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
}

/// One typed block of response content. Only text blocks carry a reply; the rest are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

impl ContentBlock {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentBlock::Text { text } => Some(text),
            ContentBlock::Other => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Role;

    #[test]
    fn request_serializes_in_messages_api_shape() {
        let messages = vec![ChatMessage::user("hi"), ChatMessage::assistant("hey")];
        let body = MessagesRequest {
            model: "m",
            max_tokens: 1024,
            system: "sys",
            messages: &messages,
        };
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v["model"], "m");
        assert_eq!(v["max_tokens"], 1024);
        assert_eq!(v["system"], "sys");
        assert_eq!(v["messages"][0]["role"], "user");
        assert_eq!(v["messages"][1]["role"], "assistant");
        assert_eq!(v["messages"][1]["content"], "hey");
    }

    #[test]
    fn response_keeps_unknown_blocks_as_other() {
        let json = r#"{
            "id": "msg_1",
            "content": [
                {"type": "tool_use", "id": "t1", "name": "x", "input": {}},
                {"type": "text", "text": "lol hi"}
            ]
        }"#;
        let res: MessagesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(res.content.len(), 2);
        assert_eq!(res.content[0], ContentBlock::Other);
        assert_eq!(res.content[1].as_text(), Some("lol hi"));
    }

    #[test]
    fn new_trims_base_url() {
        let c = AnthropicClient::new(Some("http://localhost:9/".to_string()), "m", 10);
        assert_eq!(c.base_url, "http://localhost:9");
        let d = AnthropicClient::new(None, "m", 10);
        assert_eq!(d.base_url, DEFAULT_BASE_URL);
        assert_eq!(Role::User, ChatMessage::user("x").role);
    }
}
