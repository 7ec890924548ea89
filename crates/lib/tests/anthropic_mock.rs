//! Integration test: point the Anthropic client at a local axum mock of POST /v1/messages and
//! check the request it sends and how it reads replies and failures.

use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use wiser_lib::llm::{AnthropicClient, ChatMessage, ChatProvider, CompletionRequest, ProviderError};

fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind free port");
    listener.local_addr().expect("local_addr").port()
}

#[derive(Clone)]
struct Mock {
    status: StatusCode,
    reply: Value,
    seen: Arc<Mutex<Vec<(HeaderMap, Value)>>>,
}

async fn messages(
    State(mock): State<Mock>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    mock.seen.lock().unwrap().push((headers, body));
    (mock.status, Json(mock.reply.clone()))
}

async fn start(status: StatusCode, reply: Value) -> (String, Arc<Mutex<Vec<(HeaderMap, Value)>>>) {
    let port = free_port();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let mock = Mock {
        status,
        reply,
        seen: seen.clone(),
    };
    let app = Router::new()
        .route("/v1/messages", post(messages))
        .with_state(mock);
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .expect("bind mock");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://127.0.0.1:{}", port), seen)
}

#[tokio::test]
async fn sends_messages_api_request_and_reads_text() {
    let (base, seen) = start(
        StatusCode::OK,
        json!({
            "id": "msg_01",
            "type": "message",
            "role": "assistant",
            "content": [{"type": "text", "text": "sup dan"}],
            "stop_reason": "end_turn"
        }),
    )
    .await;
    let client = AnthropicClient::new(Some(base), "claude-sonnet-4-20250514", 1024);
    let history = vec![ChatMessage::user("hi")];
    let blocks = client
        .complete(CompletionRequest {
            api_key: "sk-test",
            system: "be nice",
            messages: &history,
        })
        .await
        .expect("completion");
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].as_text(), Some("sup dan"));

    let seen = seen.lock().unwrap();
    let (headers, body) = &seen[0];
    assert_eq!(headers.get("x-api-key").unwrap(), "sk-test");
    assert_eq!(headers.get("anthropic-version").unwrap(), "2023-06-01");
    assert_eq!(body["model"], "claude-sonnet-4-20250514");
    assert_eq!(body["max_tokens"], 1024);
    assert_eq!(body["system"], "be nice");
    assert_eq!(body["messages"], json!([{"role": "user", "content": "hi"}]));
}

#[tokio::test]
async fn non_success_carries_status_and_body() {
    let (base, _) = start(
        StatusCode::UNAUTHORIZED,
        json!({"type": "error", "error": {"type": "authentication_error", "message": "invalid x-api-key"}}),
    )
    .await;
    let client = AnthropicClient::new(Some(base), "m", 16);
    let err = client
        .complete(CompletionRequest {
            api_key: "sk-bad",
            system: "",
            messages: &[ChatMessage::user("hi")],
        })
        .await
        .unwrap_err();
    match &err {
        ProviderError::Api(detail) => {
            assert!(detail.starts_with("401 Unauthorized "));
            assert!(detail.contains("authentication_error"));
        }
        other => panic!("expected Api error, got {:?}", other),
    }
    assert_eq!(
        wiser_lib::relay::classify_provider_error(&err).status().as_u16(),
        401
    );
}

#[tokio::test]
async fn garbage_success_body_is_decode_error() {
    let (base, _) = start(StatusCode::OK, json!("not a message")).await;
    let client = AnthropicClient::new(Some(base), "m", 16);
    let err = client
        .complete(CompletionRequest {
            api_key: "sk",
            system: "",
            messages: &[ChatMessage::user("hi")],
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Decode(_)));
}
