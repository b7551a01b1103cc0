//! Generative backend client.
//!
//! Every protocol hides behind [`GenerativeBackend::invoke`], which takes the
//! full prompt text and returns the model's raw text. Calls are bounded by the
//! configured timeout and never retried.

pub mod canned;
pub mod config;
pub mod http;

pub use canned::*;
pub use config::*;
pub use http::*;

use async_trait::async_trait;
use sg_types::SgResult;
use std::sync::Arc;

/// External text generation service
#[async_trait]
pub trait GenerativeBackend: Send + Sync + std::fmt::Debug {
    /// Send `prompt` and return the generated text.
    async fn invoke(&self, prompt: &str) -> SgResult<String>;

    /// Model or backend name, for logs
    fn name(&self) -> &str;

    fn protocol(&self) -> BackendProtocol;
}

/// Build the backend selected by `config.protocol`.
pub fn build_backend(config: &BackendConfig) -> SgResult<Arc<dyn GenerativeBackend>> {
    config.validate()?;
    tracing::info!(
        protocol = %config.protocol,
        model = %config.model,
        base_url = %config.base_url,
        timeout_secs = config.timeout_secs,
        "configuring generative backend"
    );

    let backend: Arc<dyn GenerativeBackend> = match config.protocol {
        BackendProtocol::Completion => Arc::new(CompletionBackend::new(config.clone())?),
        BackendProtocol::ChatCompletion => Arc::new(ChatCompletionBackend::new(config.clone())?),
        BackendProtocol::Canned => Arc::new(CannedBackend::demo()),
    };
    Ok(backend)
}

#[cfg(test)]
pub(crate) mod test_server {
    use axum::body::Bytes;
    use axum::extract::State;
    use axum::http::{header, HeaderMap, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::post;
    use axum::Router;
    use tokio::net::TcpListener;
    use tokio::sync::mpsc;

    /// What the mock backend saw
    #[derive(Debug, Clone)]
    pub struct CapturedRequest {
        pub authorization: Option<String>,
        pub body: serde_json::Value,
    }

    #[derive(Clone)]
    struct MockState {
        status: StatusCode,
        body: &'static str,
        captured: mpsc::UnboundedSender<CapturedRequest>,
    }

    async fn mock_handler(State(state): State<MockState>, headers: HeaderMap, body: Bytes) -> impl IntoResponse {
        let authorization = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
        let _ = state.captured.send(CapturedRequest { authorization, body });

        (state.status, [(header::CONTENT_TYPE, "application/json")], state.body)
    }

    /// Serve `body` with `status` on `POST {path}`; the receiver yields each request seen.
    pub async fn mock_backend(
        path: &str,
        status: StatusCode,
        body: &'static str,
    ) -> (String, mpsc::UnboundedReceiver<CapturedRequest>) {
        let (captured, requests) = mpsc::unbounded_channel();
        let router = Router::new()
            .route(path, post(mock_handler))
            .with_state(MockState { status, body, captured });

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.ok();
        });
        (format!("http://{}", addr), requests)
    }

    /// Accepts connections and never answers.
    pub async fn silent_server() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        format!("http://{}", addr)
    }

    /// URL of a port nothing listens on.
    pub async fn refused_url() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{}", addr)
    }
}
