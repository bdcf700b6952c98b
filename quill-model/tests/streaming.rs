//! End-to-end client tests against a local SSE server.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::Router;
use futures::StreamExt;
use quill_model::{ApiError, ChatClient, ChatRequest, Message};

async fn serve(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

fn client_for(addr: SocketAddr) -> ChatClient {
    ChatClient::builder("nvapi-test-key")
        .with_base_url(format!("http://{addr}"))
        .with_max_retries(2)
        .build()
        .unwrap()
}

fn request() -> ChatRequest {
    ChatRequest::new("test-model", vec![Message::user("hello")])
}

fn chunk_line(delta: &str) -> String {
    format!(
        "data: {{\"id\":\"c1\",\"object\":\"chat.completion.chunk\",\"created\":0,\
         \"model\":\"test-model\",\"choices\":[{{\"index\":0,\"delta\":{delta}}}]}}\n\n"
    )
}

#[tokio::test]
async fn streams_chunks_until_done() {
    async fn handler() -> impl IntoResponse {
        let mut body = String::new();
        body.push_str(&chunk_line("{\"reasoning\":\"thinking...\"}"));
        body.push_str(&chunk_line("{\"content\":\"Hello\"}"));
        body.push_str(&chunk_line("{\"content\":\" world\"}"));
        body.push_str("data: [DONE]\n\n");
        // Anything after [DONE] must never be delivered.
        body.push_str(&chunk_line("{\"content\":\"ignored\"}"));
        ([(header::CONTENT_TYPE, "text/event-stream")], body)
    }

    let addr = serve(Router::new().route("/chat/completions", post(handler))).await;
    let mut stream = client_for(addr).complete_stream(request()).await.unwrap();

    let mut content = String::new();
    let mut reasoning = String::new();
    let mut count = 0;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.unwrap();
        if let Some(delta) = chunk.delta_reasoning() {
            reasoning.push_str(delta);
        }
        if let Some(delta) = chunk.delta_content() {
            content.push_str(delta);
        }
        count += 1;
    }

    assert_eq!(count, 3);
    assert_eq!(reasoning, "thinking...");
    assert_eq!(content, "Hello world");
}

#[tokio::test]
async fn skips_unparseable_data_lines() {
    async fn handler() -> impl IntoResponse {
        let mut body = String::new();
        body.push_str("data: not json\n\n");
        body.push_str(&chunk_line("{\"content\":\"ok\"}"));
        body.push_str("data: [DONE]\n\n");
        ([(header::CONTENT_TYPE, "text/event-stream")], body)
    }

    let addr = serve(Router::new().route("/chat/completions", post(handler))).await;
    let mut stream = client_for(addr).complete_stream(request()).await.unwrap();

    let mut contents = Vec::new();
    while let Some(chunk) = stream.next().await {
        if let Some(delta) = chunk.unwrap().delta_content() {
            contents.push(delta.to_string());
        }
    }
    assert_eq!(contents, vec!["ok"]);
}

#[tokio::test]
async fn complete_returns_parsed_response() {
    async fn handler() -> impl IntoResponse {
        axum::Json(serde_json::json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "created": 0,
            "model": "test-model",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "full answer"},
                "finish_reason": "stop"
            }]
        }))
    }

    let addr = serve(Router::new().route("/chat/completions", post(handler))).await;
    let response = client_for(addr).complete(request()).await.unwrap();
    assert_eq!(response.content(), Some("full answer"));
}

#[tokio::test]
async fn auth_failure_maps_without_retry() {
    async fn handler() -> impl IntoResponse {
        (StatusCode::UNAUTHORIZED, "bad key")
    }

    let addr = serve(Router::new().route("/chat/completions", post(handler))).await;
    let err = client_for(addr).complete(request()).await.unwrap_err();
    assert!(matches!(err, ApiError::Auth { status: 401 }));
}

#[tokio::test]
async fn server_errors_are_retried_then_succeed() {
    async fn handler(State(hits): State<Arc<AtomicUsize>>) -> impl IntoResponse {
        if hits.fetch_add(1, Ordering::SeqCst) == 0 {
            (StatusCode::INTERNAL_SERVER_ERROR, "transient").into_response()
        } else {
            axum::Json(serde_json::json!({
                "id": "chatcmpl-2",
                "object": "chat.completion",
                "created": 0,
                "model": "test-model",
                "choices": [{
                    "index": 0,
                    "message": {"role": "assistant", "content": "recovered"},
                    "finish_reason": "stop"
                }]
            }))
            .into_response()
        }
    }

    let hits = Arc::new(AtomicUsize::new(0));
    let router =
        Router::new().route("/chat/completions", post(handler)).with_state(Arc::clone(&hits));
    let addr = serve(router).await;

    let response = client_for(addr).complete(request()).await.unwrap();
    assert_eq!(response.content(), Some("recovered"));
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[test]
fn empty_api_key_is_rejected_at_build_time() {
    let err = ChatClient::builder("  ").build().unwrap_err();
    assert!(matches!(err, ApiError::MissingApiKey));
}
