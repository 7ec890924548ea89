//! Relay wire types for `POST /api/chat`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Request body: `{ "message", "screenName", "apiKey", "history" }`. Every field may be absent on
/// the wire; presence of `message` and `apiKey` is checked by the relay, not by deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screen_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Prior conversation, oldest first. Anything other than an array is treated as empty.
    #[serde(
        default,
        deserialize_with = "lenient_history",
        skip_serializing_if = "Option::is_none"
    )]
    pub history: Option<Vec<HistoryEntry>>,
}

/// One prior message: `{ "role": "user" | "assistant", "content" }`. Any role other than
/// "user" is treated as assistant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: String,
}

impl HistoryEntry {
    /// Entry from an arbitrary JSON value; a missing or non-string role or content reads as "".
    fn from_value(value: &Value) -> Self {
        let field = |name: &str| {
            value
                .get(name)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        Self {
            role: field("role"),
            content: field("content"),
        }
    }

    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// 200 body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayReply {
    pub reply: String,
}

/// 4xx/5xx body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayErrorBody {
    pub error: String,
}

impl RelayRequest {
    /// Message if present and non-empty.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref().filter(|s| !s.is_empty())
    }

    /// API key if present and non-empty.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|s| !s.is_empty())
    }

    pub fn screen_name(&self) -> &str {
        self.screen_name.as_deref().unwrap_or("")
    }

    pub fn history(&self) -> &[HistoryEntry] {
        self.history.as_deref().unwrap_or(&[])
    }
}

fn lenient_history<'de, D>(deserializer: D) -> Result<Option<Vec<HistoryEntry>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => Some(items.iter().map(HistoryEntry::from_value).collect()),
        _ => None,
    })
}
