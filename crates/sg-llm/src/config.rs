use serde::{Deserialize, Serialize};
use sg_types::{config_error, SgError, SgResult};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Wire protocol spoken by the generative backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendProtocol {
    /// `POST {base}/api/generate`, single prompt in, `response` text out
    #[serde(alias = "ollama")]
    Completion,
    /// `POST {base}/api/chat/completions`, one user message in, first choice out
    #[serde(alias = "openwebui", alias = "chat")]
    ChatCompletion,
    /// Offline fixed response
    Canned,
}

impl BackendProtocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendProtocol::Completion => "completion",
            BackendProtocol::ChatCompletion => "chat_completion",
            BackendProtocol::Canned => "canned",
        }
    }
}

impl fmt::Display for BackendProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendProtocol {
    type Err = SgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "completion" | "ollama" => Ok(BackendProtocol::Completion),
            "chat_completion" | "chat" | "openwebui" => Ok(BackendProtocol::ChatCompletion),
            "canned" => Ok(BackendProtocol::Canned),
            other => Err(config_error!("unsupported backend protocol '{}'", other)),
        }
    }
}

/// Connection and sampling settings for the generative backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub protocol: BackendProtocol,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    pub temperature: f64,
    pub top_p: f64,
    /// Output cap for chat-completion requests
    pub max_tokens: u32,
    /// Output cap for completion requests; omitted when unset
    pub num_predict: Option<u32>,
    pub api_key: Option<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            protocol: BackendProtocol::Completion,
            base_url: "http://localhost:11434".to_string(),
            model: "llama3".to_string(),
            timeout_secs: 300,
            temperature: 0.3,
            top_p: 0.9,
            max_tokens: 4000,
            num_predict: None,
            api_key: None,
        }
    }
}

impl BackendConfig {
    pub fn canned() -> Self {
        Self {
            protocol: BackendProtocol::Canned,
            ..Self::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Apply `LLM_*` overrides from the process environment.
    pub fn apply_env(&mut self) -> SgResult<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply `LLM_*` overrides from an arbitrary variable lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> SgResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(protocol) = lookup("LLM_PROTOCOL") {
            self.protocol = protocol.parse()?;
        }
        if let Some(base_url) = lookup("LLM_BASE_URL") {
            self.base_url = base_url;
        }
        if let Some(model) = lookup("LLM_MODEL_NAME") {
            self.model = model;
        }
        if let Some(api_key) = lookup("LLM_API_KEY") {
            self.api_key = if api_key.is_empty() { None } else { Some(api_key) };
        }
        if let Some(timeout) = lookup("LLM_TIMEOUT_SECS") {
            self.timeout_secs = timeout
                .trim()
                .parse()
                .map_err(|e| config_error!("invalid LLM_TIMEOUT_SECS '{}': {}", timeout, e))?;
        }
        Ok(())
    }

    /// Reject settings no backend could work with.
    pub fn validate(&self) -> SgResult<()> {
        if self.protocol != BackendProtocol::Canned {
            if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
                return Err(config_error!("base_url must be an http(s) URL, got '{}'", self.base_url));
            }
            if self.model.trim().is_empty() {
                return Err(config_error!("model name must not be empty"));
            }
        }
        if self.timeout_secs == 0 {
            return Err(config_error!("timeout_secs must be positive"));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(config_error!("temperature {} outside [0, 2]", self.temperature));
        }
        if !(0.0..=1.0).contains(&self.top_p) {
            return Err(config_error!("top_p {} outside [0, 1]", self.top_p));
        }
        Ok(())
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}
