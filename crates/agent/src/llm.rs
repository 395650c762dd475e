//! Completion backends for the assistant agent.
//!
//! Each provider is a thin `reqwest` client that turns one prompt into one
//! completion. Provider selection happens once in [`build_llm_client`].

use std::sync::Arc;
use std::time::Duration;

use askbot_core::config::{AgentConfig, AgentProvider};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const ANTHROPIC_MAX_TOKENS: u32 = 1024;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("llm client could not be built: {0}")]
    Build(String),
    #[error("{provider} request failed: {source}")]
    Request {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{provider} returned http {status}: {body}")]
    Api { provider: &'static str, status: u16, body: String },
    #[error("{provider} returned no completion text")]
    EmptyCompletion { provider: &'static str },
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    fn provider(&self) -> &'static str;
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}

/// Builds the configured completion backend.
pub fn build_llm_client(config: &AgentConfig) -> Result<Arc<dyn LlmClient>, LlmError> {
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs.max(1)))
        .user_agent(concat!("askbot/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|error| LlmError::Build(error.to_string()))?;

    let base_url = config.base_url.as_deref().map(|url| url.trim_end_matches('/').to_owned());

    let client: Arc<dyn LlmClient> = match config.provider {
        AgentProvider::OpenAi => Arc::new(OpenAiClient {
            http,
            base_url: base_url.unwrap_or_else(|| OPENAI_BASE_URL.to_owned()),
            api_key: require_key(config, "openai")?,
            model: config.model.clone(),
            temperature: config.temperature,
        }),
        AgentProvider::Anthropic => Arc::new(AnthropicClient {
            http,
            base_url: base_url.unwrap_or_else(|| ANTHROPIC_BASE_URL.to_owned()),
            api_key: require_key(config, "anthropic")?,
            model: config.model.clone(),
            temperature: config.temperature,
        }),
        AgentProvider::Ollama => Arc::new(OllamaClient {
            http,
            base_url: base_url
                .ok_or_else(|| LlmError::Build("ollama requires agent.base_url".to_owned()))?,
            model: config.model.clone(),
            temperature: config.temperature,
        }),
    };

    Ok(client)
}

fn require_key(config: &AgentConfig, provider: &str) -> Result<SecretString, LlmError> {
    config
        .api_key
        .clone()
        .filter(|key| !key.expose_secret().trim().is_empty())
        .ok_or_else(|| LlmError::Build(format!("{provider} requires agent.api_key")))
}

async fn post_json(
    provider: &'static str,
    request: reqwest::RequestBuilder,
    body: &Value,
) -> Result<Value, LlmError> {
    let response =
        request.json(body).send().await.map_err(|source| LlmError::Request { provider, source })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(LlmError::Api { provider, status: status.as_u16(), body });
    }

    response.json().await.map_err(|source| LlmError::Request { provider, source })
}

fn non_empty(provider: &'static str, text: Option<String>) -> Result<String, LlmError> {
    text.map(|text| text.trim().to_owned())
        .filter(|text| !text.is_empty())
        .ok_or(LlmError::EmptyCompletion { provider })
}

pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: SecretString,
    model: String,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiMessage {
    content: Option<String>,
}

fn openai_body(model: &str, temperature: f32, prompt: &str) -> Value {
    json!({
        "model": model,
        "temperature": temperature,
        "messages": [{ "role": "user", "content": prompt }],
    })
}

fn openai_text(value: Value) -> Result<String, LlmError> {
    let response: OpenAiResponse = serde_json::from_value(value)
        .map_err(|_| LlmError::EmptyCompletion { provider: "openai" })?;
    non_empty("openai", response.choices.into_iter().next().and_then(|choice| choice.message.content))
}

#[async_trait]
impl LlmClient for OpenAiClient {
    fn provider(&self) -> &'static str {
        "openai"
    }

    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        debug!(event_name = "agent.llm.request", provider = "openai", model = %self.model);
        let request = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(self.api_key.expose_secret());
        let value =
            post_json("openai", request, &openai_body(&self.model, self.temperature, prompt))
                .await?;
        openai_text(value)
    }
}

pub struct AnthropicClient {
    http: reqwest::Client,
    base_url: String,
    api_key: SecretString,
    model: String,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<AnthropicBlock>,
}

#[derive(Debug, Deserialize)]
struct AnthropicBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

fn anthropic_body(model: &str, temperature: f32, prompt: &str) -> Value {
    json!({
        "model": model,
        "max_tokens": ANTHROPIC_MAX_TOKENS,
        // Anthropic caps temperature at 1.0.
        "temperature": temperature.min(1.0),
        "messages": [{ "role": "user", "content": prompt }],
    })
}

fn anthropic_text(value: Value) -> Result<String, LlmError> {
    let response: AnthropicResponse = serde_json::from_value(value)
        .map_err(|_| LlmError::EmptyCompletion { provider: "anthropic" })?;
    let text = response
        .content
        .into_iter()
        .filter(|block| block.block_type == "text")
        .filter_map(|block| block.text)
        .collect::<Vec<_>>()
        .join("");
    non_empty("anthropic", Some(text))
}

#[async_trait]
impl LlmClient for AnthropicClient {
    fn provider(&self) -> &'static str {
        "anthropic"
    }

    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        debug!(event_name = "agent.llm.request", provider = "anthropic", model = %self.model);
        let request = self
            .http
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", ANTHROPIC_VERSION);
        let value =
            post_json("anthropic", request, &anthropic_body(&self.model, self.temperature, prompt))
                .await?;
        anthropic_text(value)
    }
}

pub struct OllamaClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    message: Option<OpenAiMessage>,
}

fn ollama_body(model: &str, temperature: f32, prompt: &str) -> Value {
    json!({
        "model": model,
        "stream": false,
        "options": { "temperature": temperature },
        "messages": [{ "role": "user", "content": prompt }],
    })
}

fn ollama_text(value: Value) -> Result<String, LlmError> {
    let response: OllamaResponse = serde_json::from_value(value)
        .map_err(|_| LlmError::EmptyCompletion { provider: "ollama" })?;
    non_empty("ollama", response.message.and_then(|message| message.content))
}

#[async_trait]
impl LlmClient for OllamaClient {
    fn provider(&self) -> &'static str {
        "ollama"
    }

    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        debug!(event_name = "agent.llm.request", provider = "ollama", model = %self.model);
        let request = self.http.post(format!("{}/api/chat", self.base_url));
        let value =
            post_json("ollama", request, &ollama_body(&self.model, self.temperature, prompt))
                .await?;
        ollama_text(value)
    }
}
