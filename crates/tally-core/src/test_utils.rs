//! Test utilities for tally-core
//!
//! A mock model server speaking the Ollama and OpenAI-compatible protocols.
//! Every completion request is answered with the same configured payload, so
//! tests control exactly what text the classifier has to parse.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    extract::{Json, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::oneshot;

#[derive(Clone)]
struct ServerState {
    /// `None` answers every completion with HTTP 500
    payload: Option<Arc<String>>,
    requests: Arc<AtomicUsize>,
}

/// Mock model server for integration tests
pub struct MockLlmServer {
    addr: SocketAddr,
    requests: Arc<AtomicUsize>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockLlmServer {
    /// Start a server that answers every completion with `payload`
    pub async fn start(payload: &str) -> Self {
        Self::spawn(Some(Arc::new(payload.to_string()))).await
    }

    /// Start a server whose completion endpoints fail with HTTP 500
    pub async fn start_failing() -> Self {
        Self::spawn(None).await
    }

    async fn spawn(payload: Option<Arc<String>>) -> Self {
        let requests = Arc::new(AtomicUsize::new(0));
        let state = ServerState {
            payload,
            requests: requests.clone(),
        };

        let app = Router::new()
            .route("/api/tags", get(handle_tags))
            .route("/api/generate", post(handle_generate))
            .route("/v1/models", get(handle_models))
            .route("/v1/chat/completions", post(handle_chat))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock server");
        let addr = listener.local_addr().expect("mock server address");

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .ok();
        });

        Self {
            addr,
            requests,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Number of completion requests served (successful or not)
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockLlmServer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[derive(Debug, Deserialize)]
struct GenerateRequest {
    model: String,
    #[allow(dead_code)]
    prompt: String,
}

#[derive(Debug, Serialize)]
struct GenerateResponse {
    model: String,
    response: String,
    done: bool,
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    model: String,
}

/// Ollama tags endpoint (health check)
async fn handle_tags() -> Json<serde_json::Value> {
    Json(json!({
        "models": [{"name": "llama3.2:latest", "modified_at": "2024-01-01T00:00:00Z", "size": 4_000_000_000u64}]
    }))
}

/// OpenAI models endpoint (health check)
async fn handle_models() -> Json<serde_json::Value> {
    Json(json!({"object": "list", "data": [{"id": "mock-model", "object": "model"}]}))
}

/// Ollama generate endpoint
async fn handle_generate(
    State(state): State<ServerState>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, StatusCode> {
    state.requests.fetch_add(1, Ordering::SeqCst);
    let payload = state.payload.ok_or(StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(Json(GenerateResponse {
        model: request.model,
        response: payload.to_string(),
        done: true,
    }))
}

/// OpenAI chat completions endpoint
async fn handle_chat(
    State(state): State<ServerState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    state.requests.fetch_add(1, Ordering::SeqCst);
    let payload = state.payload.ok_or(StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(Json(json!({
        "id": "chatcmpl-mock",
        "object": "chat.completion",
        "model": request.model,
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": payload.as_str()},
            "finish_reason": "stop"
        }]
    })))
}
