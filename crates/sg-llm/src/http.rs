use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sg_types::{config_error, BackendError, SgError, SgResult};
use std::time::{Duration, Instant};

use crate::config::{BackendConfig, BackendProtocol};
use crate::GenerativeBackend;

const COMPLETION_PATH: &str = "/api/generate";
const CHAT_COMPLETION_PATH: &str = "/api/chat/completions";

fn build_client(timeout: Duration) -> SgResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| config_error!("failed to build HTTP client: {}", e))
}

fn request_error(endpoint: &str, err: reqwest::Error, timeout: Duration) -> SgError {
    if err.is_timeout() {
        BackendError::Timeout {
            timeout_secs: timeout.as_secs(),
        }
        .into()
    } else {
        BackendError::Transport {
            endpoint: endpoint.to_string(),
            message: format!("HTTP request failed: {}", err),
        }
        .into()
    }
}

fn malformed_envelope(endpoint: &str, err: serde_json::Error) -> SgError {
    BackendError::Transport {
        endpoint: endpoint.to_string(),
        message: format!("malformed response envelope: {}", err),
    }
    .into()
}

async fn exchange<B: Serialize + Sync>(
    client: &reqwest::Client,
    endpoint: &str,
    body: &B,
    api_key: Option<&str>,
    timeout: Duration,
) -> SgResult<String> {
    let mut request = client.post(endpoint).json(body);
    if let Some(key) = api_key {
        request = request.bearer_auth(key);
    }

    let response = request
        .send()
        .await
        .map_err(|e| request_error(endpoint, e, timeout))?;

    if !response.status().is_success() {
        return Err(BackendError::Transport {
            endpoint: endpoint.to_string(),
            message: format!("HTTP error: {}", response.status()),
        }
        .into());
    }

    response
        .text()
        .await
        .map_err(|e| request_error(endpoint, e, timeout))
}

/// POST `body` and return the raw response text, bounded by `timeout` end to end.
async fn post_json<B: Serialize + Sync>(
    client: &reqwest::Client,
    endpoint: &str,
    body: &B,
    api_key: Option<&str>,
    timeout: Duration,
) -> SgResult<String> {
    let started = Instant::now();
    tracing::info!(endpoint, "invoking generative backend");

    let result = match tokio::time::timeout(timeout, exchange(client, endpoint, body, api_key, timeout)).await {
        Ok(result) => result,
        Err(_) => Err(BackendError::Timeout {
            timeout_secs: timeout.as_secs(),
        }
        .into()),
    };

    let elapsed_ms = started.elapsed().as_millis() as u64;
    match &result {
        Ok(text) => tracing::info!(endpoint, elapsed_ms, bytes = text.len(), "backend responded"),
        Err(e) => tracing::warn!(endpoint, elapsed_ms, error = %e, "backend call failed"),
    }
    result
}

#[derive(Serialize)]
struct CompletionOptions {
    temperature: f64,
    top_p: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: CompletionOptions,
}

#[derive(Deserialize)]
struct CompletionEnvelope {
    response: String,
}

/// Simple-completion backend (`/api/generate`)
#[derive(Debug)]
pub struct CompletionBackend {
    config: BackendConfig,
    endpoint: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl CompletionBackend {
    pub fn new(config: BackendConfig) -> SgResult<Self> {
        Self::with_timeout(config.timeout(), config)
    }

    /// Backend whose timeout overrides `config.timeout_secs`.
    pub fn with_timeout(timeout: Duration, config: BackendConfig) -> SgResult<Self> {
        Ok(Self {
            endpoint: config.endpoint(COMPLETION_PATH),
            client: build_client(timeout)?,
            timeout,
            config,
        })
    }
}

#[async_trait]
impl GenerativeBackend for CompletionBackend {
    async fn invoke(&self, prompt: &str) -> SgResult<String> {
        tracing::trace!(prompt, "completion prompt");
        let body = CompletionRequest {
            model: &self.config.model,
            prompt,
            stream: false,
            options: CompletionOptions {
                temperature: self.config.temperature,
                top_p: self.config.top_p,
                num_predict: self.config.num_predict,
            },
        };

        let text = post_json(
            &self.client,
            &self.endpoint,
            &body,
            self.config.api_key.as_deref(),
            self.timeout,
        )
        .await?;

        let envelope: CompletionEnvelope =
            serde_json::from_str(&text).map_err(|e| malformed_envelope(&self.endpoint, e))?;
        Ok(envelope.response)
    }

    fn name(&self) -> &str {
        &self.config.model
    }

    fn protocol(&self) -> BackendProtocol {
        BackendProtocol::Completion
    }
}

#[derive(Serialize)]
struct ChatMessageOut<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessageOut<'a>>,
    temperature: f64,
    top_p: f64,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatEnvelope {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageIn,
}

#[derive(Deserialize)]
struct ChatMessageIn {
    content: String,
}

/// Chat-completion backend (`/api/chat/completions`)
#[derive(Debug)]
pub struct ChatCompletionBackend {
    config: BackendConfig,
    endpoint: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl ChatCompletionBackend {
    pub fn new(config: BackendConfig) -> SgResult<Self> {
        Self::with_timeout(config.timeout(), config)
    }

    pub fn with_timeout(timeout: Duration, config: BackendConfig) -> SgResult<Self> {
        Ok(Self {
            endpoint: config.endpoint(CHAT_COMPLETION_PATH),
            client: build_client(timeout)?,
            timeout,
            config,
        })
    }
}

#[async_trait]
impl GenerativeBackend for ChatCompletionBackend {
    async fn invoke(&self, prompt: &str) -> SgResult<String> {
        tracing::trace!(prompt, "chat-completion prompt");
        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessageOut {
                role: "user",
                content: prompt,
            }],
            temperature: self.config.temperature,
            top_p: self.config.top_p,
            max_tokens: self.config.max_tokens,
        };

        let text = post_json(
            &self.client,
            &self.endpoint,
            &body,
            self.config.api_key.as_deref(),
            self.timeout,
        )
        .await?;

        let envelope: ChatEnvelope =
            serde_json::from_str(&text).map_err(|e| malformed_envelope(&self.endpoint, e))?;
        envelope
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| {
                BackendError::Transport {
                    endpoint: self.endpoint.clone(),
                    message: "malformed response envelope: no choices".to_string(),
                }
                .into()
            })
    }

    fn name(&self) -> &str {
        &self.config.model
    }

    fn protocol(&self) -> BackendProtocol {
        BackendProtocol::ChatCompletion
    }
}
