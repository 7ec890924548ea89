//! Relay HTTP server: `GET /` health and `POST /api/chat`.

use crate::config::{self, Config};
use crate::llm::{AnthropicClient, ChatProvider, CompletionRequest, ProviderError};
use crate::relay::history::normalize_history;
use crate::relay::persona::{system_prompt, BOT_NAME, CONFUSED_REPLY};
use crate::relay::protocol::{RelayErrorBody, RelayReply, RelayRequest};
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::future::Future;
use std::sync::Arc;

/// Shared state for the relay. Nothing in here is mutated per request.
#[derive(Clone)]
pub struct RelayState {
    pub config: Arc<Config>,
    pub provider: Arc<dyn ChatProvider>,
}

impl RelayState {
    pub fn new(config: Config, provider: Arc<dyn ChatProvider>) -> Self {
        Self {
            config: Arc::new(config),
            provider,
        }
    }
}

/// Classified relay failure. Each variant maps to one HTTP status and error text.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Missing message or API key")]
    MissingField,
    #[error("Invalid API key! Make sure you're using a valid Anthropic API key as your password.")]
    Authentication,
    #[error("{} is having a moment: {0}", BOT_NAME)]
    Upstream(String),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::MissingField => StatusCode::BAD_REQUEST,
            RelayError::Authentication => StatusCode::UNAUTHORIZED,
            RelayError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            RelayError::MissingField => "validation",
            RelayError::Authentication => "authentication",
            RelayError::Upstream(_) => "upstream",
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let body = RelayErrorBody {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Map a provider failure onto the relay taxonomy: anything whose description mentions
/// authentication, 401 or invalid is a credential problem; the rest is upstream.
pub fn classify_provider_error(err: &ProviderError) -> RelayError {
    let detail = err.to_string();
    if detail.contains("authentication") || detail.contains("401") || detail.contains("invalid") {
        RelayError::Authentication
    } else {
        RelayError::Upstream(detail)
    }
}

/// One relay call: validate, normalize history, call the provider, pick the reply text.
pub async fn relay_chat(
    provider: &dyn ChatProvider,
    request: &RelayRequest,
) -> Result<String, RelayError> {
    let (Some(message), Some(api_key)) = (request.message(), request.api_key()) else {
        return Err(RelayError::MissingField);
    };
    let messages = normalize_history(request.history(), message);
    let system = system_prompt(request.screen_name());
    let blocks = provider
        .complete(CompletionRequest {
            api_key,
            system: &system,
            messages: &messages,
        })
        .await
        .map_err(|e| {
            log::warn!("relay: {} call failed: {}", provider.name(), e);
            classify_provider_error(&e)
        })?;
    let reply = blocks
        .iter()
        .find_map(|b| b.as_text())
        .map(str::to_string)
        .unwrap_or_else(|| {
            log::debug!("relay: provider returned no text block, using canned reply");
            CONFUSED_REPLY.to_string()
        });
    Ok(reply)
}

/// Decode a chat body. Unreadable JSON is an internal failure (500), never a credential problem,
/// so it skips [`classify_provider_error`].
pub fn parse_request(body: &[u8]) -> Result<RelayRequest, RelayError> {
    serde_json::from_slice(body).map_err(|e| RelayError::Upstream(e.to_string()))
}

/// POST /api/chat. Parses the body itself so malformed JSON gets the relay's error shape.
async fn chat_http(
    State(state): State<RelayState>,
    body: Bytes,
) -> Result<Json<RelayReply>, RelayError> {
    let request_id = uuid::Uuid::new_v4();
    let request = parse_request(&body).map_err(|e| {
        log::info!("relay[{}]: unreadable body", request_id);
        e
    })?;
    log::info!(
        "relay[{}]: chat request with {} history entr(ies)",
        request_id,
        request.history().len()
    );
    match relay_chat(state.provider.as_ref(), &request).await {
        Ok(reply) => {
            log::info!("relay[{}]: ok ({} chars)", request_id, reply.len());
            Ok(Json(RelayReply { reply }))
        }
        Err(e) => {
            log::info!("relay[{}]: {} error", request_id, e.kind());
            Err(e)
        }
    }
}

/// GET / returns a simple health JSON.
async fn health_http(State(state): State<RelayState>) -> Json<serde_json::Value> {
    Json(json!({
        "runtime": "running",
        "service": "relay",
        "port": state.config.relay.port,
    }))
}

/// Router with all relay routes.
pub fn router(state: RelayState) -> Router {
    Router::new()
        .route("/", get(health_http))
        .route("/api/chat", post(chat_http))
        .with_state(state)
}

/// Serve the relay on an already-bound listener until `shutdown` completes.
pub async fn serve<F>(listener: tokio::net::TcpListener, state: RelayState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .context("relay server exited")
}

/// Bind the configured address and serve with the Anthropic provider until SIGINT/SIGTERM.
pub async fn run_relay(config: Config) -> Result<()> {
    let bind = config.relay.bind.trim().to_string();
    if !config::is_loopback_bind(&bind) {
        log::warn!(
            "relay bound to non-loopback address {}; API keys travel in every request body",
            bind
        );
    }
    let provider = AnthropicClient::new(
        Some(config::resolve_provider_base_url(&config)),
        config.provider.model.clone(),
        config.provider.max_tokens,
    );
    log::info!(
        "relay provider: {} (model {}, max tokens {})",
        provider.name(),
        provider.model(),
        config.provider.max_tokens
    );
    let bind_addr = format!("{}:{}", config::bracket_host(&bind), config.relay.port);
    let state = RelayState::new(config, Arc::new(provider));
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("relay listening on {}", bind_addr);
    serve(listener, state, shutdown_signal()).await?;
    log::info!("relay stopped");
    Ok(())
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received, draining connections");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{ChatMessage, ContentBlock, Role};
    use crate::relay::history::CONVERSATION_STARTED;
    use crate::relay::protocol::HistoryEntry;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records each call and answers with a fixed result.
    struct FakeProvider {
        result: Box<dyn Fn() -> Result<Vec<ContentBlock>, ProviderError> + Send + Sync>,
        calls: Mutex<Vec<(String, String, Vec<ChatMessage>)>>,
    }

    impl FakeProvider {
        fn replying(blocks: Vec<ContentBlock>) -> Self {
            Self {
                result: Box::new(move || Ok(blocks.clone())),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn failing(detail: &'static str) -> Self {
            Self {
                result: Box::new(move || Err(ProviderError::Api(detail.to_string()))),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatProvider for FakeProvider {
        fn name(&self) -> &str {
            "fake"
        }

        async fn complete(
            &self,
            request: CompletionRequest<'_>,
        ) -> Result<Vec<ContentBlock>, ProviderError> {
            self.calls.lock().unwrap().push((
                request.api_key.to_string(),
                request.system.to_string(),
                request.messages.to_vec(),
            ));
            (self.result)()
        }
    }

    fn request(message: &str, api_key: &str, history: Vec<HistoryEntry>) -> RelayRequest {
        RelayRequest {
            message: Some(message.to_string()),
            screen_name: Some("dialup_dan".to_string()),
            api_key: Some(api_key.to_string()),
            history: Some(history),
        }
    }

    fn text(s: &str) -> ContentBlock {
        ContentBlock::Text {
            text: s.to_string(),
        }
    }

    #[tokio::test]
    async fn missing_message_or_key_never_calls_provider() {
        let provider = FakeProvider::replying(vec![text("nope")]);
        for req in [request("", "sk", vec![]), request("hi", "", vec![]), RelayRequest::default()] {
            let err = relay_chat(&provider, &req).await.unwrap_err();
            assert!(matches!(err, RelayError::MissingField));
            assert_eq!(err.status(), StatusCode::BAD_REQUEST);
            assert_eq!(err.to_string(), "Missing message or API key");
        }
        assert!(provider.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn forwards_key_prompt_and_normalized_history() {
        let provider = FakeProvider::replying(vec![text("lol hi dialup_dan :P")]);
        let history = vec![
            HistoryEntry::new("assistant", "Hey there!"),
            HistoryEntry::new("user", "hi"),
        ];
        let reply = relay_chat(&provider, &request("hi", "sk-test", history))
            .await
            .unwrap();
        assert_eq!(reply, "lol hi dialup_dan :P");

        let calls = provider.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let (key, system, messages) = &calls[0];
        assert_eq!(key, "sk-test");
        assert!(system.contains("\"dialup_dan\""));
        assert_eq!(messages[0], ChatMessage::user(CONVERSATION_STARTED));
        assert_eq!(messages.last().map(|m| m.role), Some(Role::User));
        assert_eq!(messages.len(), 3);
    }

    #[tokio::test]
    async fn first_text_block_wins_and_missing_text_is_canned() {
        let provider = FakeProvider::replying(vec![ContentBlock::Other, text("a"), text("b")]);
        let reply = relay_chat(&provider, &request("hi", "sk", vec![])).await.unwrap();
        assert_eq!(reply, "a");

        let provider = FakeProvider::replying(vec![ContentBlock::Other]);
        let reply = relay_chat(&provider, &request("hi", "sk", vec![])).await.unwrap();
        assert_eq!(reply, CONFUSED_REPLY);
    }

    #[tokio::test]
    async fn upstream_401_is_an_authentication_error() {
        let provider = FakeProvider::failing(
            r#"401 Unauthorized {"type":"error","error":{"type":"authentication_error","message":"invalid x-api-key"}}"#,
        );
        let err = relay_chat(&provider, &request("hi", "sk-bad", vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::Authentication));
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert!(err.to_string().starts_with("Invalid API key!"));
    }

    #[tokio::test]
    async fn other_failures_carry_detail() {
        let provider = FakeProvider::failing("529 Overloaded");
        let err = relay_chat(&provider, &request("hi", "sk", vec![]))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "WiserChild is having a moment: 529 Overloaded");
    }

    #[test]
    fn unreadable_body_is_a_server_error() {
        let err = parse_request(b"{not json").unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().starts_with("WiserChild is having a moment: "));

        // serde's "invalid type" wording must not turn into a 401
        let err = parse_request(br#"{"message":5,"apiKey":"sk"}"#).unwrap_err();
        assert!(matches!(err, RelayError::Upstream(_)));
    }

    #[test]
    fn odd_history_shapes_still_parse() {
        let req = parse_request(br#"{"message":"hi","apiKey":"sk","history":"nope"}"#).unwrap();
        assert!(req.history().is_empty());
        let req = parse_request(
            br#"{"message":"hi","apiKey":"sk","history":[{"role":"user","content":null}]}"#,
        )
        .unwrap();
        assert_eq!(req.history(), &[HistoryEntry::new("user", "")]);
    }

    #[test]
    fn classification_markers() {
        for detail in ["authentication failed", "HTTP 401", "invalid x-api-key"] {
            assert!(matches!(
                classify_provider_error(&ProviderError::Api(detail.to_string())),
                RelayError::Authentication
            ));
        }
        assert!(matches!(
            classify_provider_error(&ProviderError::Decode("eof".to_string())),
            RelayError::Upstream(_)
        ));
    }
}
