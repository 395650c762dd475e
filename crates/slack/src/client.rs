use std::time::Duration;

use askbot_core::config::SlackConfig;
use askbot_core::ThreadTarget;
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChatError {
    #[error("slack client could not be built: {0}")]
    Build(String),
    #[error("slack `{method}` request failed: {message}")]
    Transport { method: &'static str, message: String },
    #[error("slack `{method}` returned http {status}")]
    Http { method: &'static str, status: u16 },
    #[error("slack `{method}` failed: {error}")]
    Api { method: &'static str, error: String },
}

/// Outbound side of the chat platform.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn post_message(&self, thread: &ThreadTarget, text: &str) -> Result<(), ChatError>;
    async fn add_acknowledgment(&self, thread: &ThreadTarget) -> Result<(), ChatError>;
}

#[derive(Debug, Deserialize)]
struct SlackApiResponse {
    ok: bool,
    error: Option<String>,
    user_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BotIdentity {
    pub user_id: String,
}

/// Slack Web API client backed by `reqwest`.
#[derive(Clone)]
pub struct SlackWebClient {
    http: reqwest::Client,
    api_base: String,
    bot_token: SecretString,
    ack_reaction: String,
}

impl SlackWebClient {
    pub fn new(config: &SlackConfig) -> Result<Self, ChatError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms.max(1)))
            .user_agent(concat!("askbot/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|error| ChatError::Build(error.to_string()))?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_owned(),
            bot_token: config.bot_token.clone(),
            ack_reaction: config.ack_reaction.trim().to_owned(),
        })
    }

    /// Calls `auth.test` and returns the bot's own user id.
    pub async fn auth_test(&self) -> Result<BotIdentity, ChatError> {
        let response = self.call("auth.test", json!({})).await?;
        let user_id = response
            .user_id
            .filter(|value| !value.trim().is_empty())
            .ok_or(ChatError::Api { method: "auth.test", error: "missing user_id".to_owned() })?;
        Ok(BotIdentity { user_id })
    }

    async fn call(&self, method: &'static str, payload: Value) -> Result<SlackApiResponse, ChatError> {
        let response = self
            .http
            .post(format!("{}/{method}", self.api_base))
            .bearer_auth(self.bot_token.expose_secret())
            .json(&payload)
            .send()
            .await
            .map_err(|error| ChatError::Transport { method, message: error.to_string() })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChatError::Http { method, status: status.as_u16() });
        }

        let body: SlackApiResponse = response
            .json()
            .await
            .map_err(|error| ChatError::Transport { method, message: error.to_string() })?;

        if !body.ok {
            return Err(ChatError::Api {
                method,
                error: body.error.unwrap_or_else(|| "unknown_error".to_owned()),
            });
        }

        Ok(body)
    }
}

#[async_trait]
impl ChatClient for SlackWebClient {
    async fn post_message(&self, thread: &ThreadTarget, text: &str) -> Result<(), ChatError> {
        self.call(
            "chat.postMessage",
            json!({
                "channel": thread.channel_id,
                "thread_ts": thread.thread_ts,
                "text": text,
                "unfurl_links": false,
                "unfurl_media": false,
            }),
        )
        .await
        .map(|_| ())
    }

    async fn add_acknowledgment(&self, thread: &ThreadTarget) -> Result<(), ChatError> {
        let result = self
            .call(
                "reactions.add",
                json!({
                    "channel": thread.channel_id,
                    "timestamp": thread.message_ts,
                    "name": self.ack_reaction,
                }),
            )
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(ChatError::Api { error, .. }) if error == "already_reacted" => Ok(()),
            Err(error) => Err(error),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChatCall {
    Post { thread: ThreadTarget, text: String },
    Acknowledge { thread: ThreadTarget },
}

/// In-memory client that records every call. Used for dry runs and tests.
#[derive(Default)]
pub struct MemoryChatClient {
    calls: Mutex<Vec<ChatCall>>,
    fail_posts: Mutex<Option<ChatError>>,
}

impl MemoryChatClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `post_message` fail with `error`.
    pub async fn fail_posts_with(&self, error: ChatError) {
        *self.fail_posts.lock().await = Some(error);
    }

    pub async fn calls(&self) -> Vec<ChatCall> {
        self.calls.lock().await.clone()
    }

    pub async fn posts(&self) -> Vec<(ThreadTarget, String)> {
        self.calls
            .lock()
            .await
            .iter()
            .filter_map(|call| match call {
                ChatCall::Post { thread, text } => Some((thread.clone(), text.clone())),
                ChatCall::Acknowledge { .. } => None,
            })
            .collect()
    }

    pub async fn acknowledgments(&self) -> Vec<ThreadTarget> {
        self.calls
            .lock()
            .await
            .iter()
            .filter_map(|call| match call {
                ChatCall::Acknowledge { thread } => Some(thread.clone()),
                ChatCall::Post { .. } => None,
            })
            .collect()
    }
}

#[async_trait]
impl ChatClient for MemoryChatClient {
    async fn post_message(&self, thread: &ThreadTarget, text: &str) -> Result<(), ChatError> {
        if let Some(error) = self.fail_posts.lock().await.clone() {
            return Err(error);
        }
        self.calls
            .lock()
            .await
            .push(ChatCall::Post { thread: thread.clone(), text: text.to_owned() });
        Ok(())
    }

    async fn add_acknowledgment(&self, thread: &ThreadTarget) -> Result<(), ChatError> {
        self.calls.lock().await.push(ChatCall::Acknowledge { thread: thread.clone() });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use askbot_core::config::AppConfig;
    use askbot_core::ThreadTarget;

    use super::{ChatCall, ChatClient, ChatError, MemoryChatClient, SlackWebClient};

    #[test]
    fn web_client_normalizes_api_base() {
        let mut config = AppConfig::default().slack;
        config.api_base = "https://slack.example.test/api/".to_owned();

        let client = SlackWebClient::new(&config).expect("client");
        assert_eq!(client.api_base, "https://slack.example.test/api");
        assert_eq!(client.ack_reaction, "thumbsup");
    }

    #[tokio::test]
    async fn memory_client_records_calls_in_order() {
        let client = MemoryChatClient::new();
        let thread = ThreadTarget::new("C1", "1730000000.1000");

        client.add_acknowledgment(&thread).await.expect("ack");
        client.post_message(&thread, "answer").await.expect("post");

        assert_eq!(
            client.calls().await,
            vec![
                ChatCall::Acknowledge { thread: thread.clone() },
                ChatCall::Post { thread, text: "answer".to_owned() },
            ]
        );
    }

    #[tokio::test]
    async fn memory_client_can_simulate_delivery_failures() {
        let client = MemoryChatClient::new();
        client
            .fail_posts_with(ChatError::Api {
                method: "chat.postMessage",
                error: "channel_not_found".to_owned(),
            })
            .await;

        let result = client.post_message(&ThreadTarget::new("C1", "1"), "answer").await;
        assert!(matches!(result, Err(ChatError::Api { ref error, .. }) if error == "channel_not_found"));
        assert!(client.posts().await.is_empty());
    }
}
