use async_trait::async_trait;
use thiserror::Error;

use crate::llm::LlmError;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("the question was empty")]
    EmptyQuery,
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error("context lookup failed: {0}")]
    Context(String),
}

/// Answers one natural-language question.
#[async_trait]
pub trait AgentService: Send + Sync {
    async fn answer(&self, query: &str) -> Result<String, AgentError>;
}

/// Optional lookup that supplies extra context for a question.
///
/// `Ok(None)` means the source had nothing relevant; the agent then answers
/// from the question alone.
#[async_trait]
pub trait QueryFn: Send + Sync {
    async fn query(&self, question: &str) -> Result<Option<String>, AgentError>;
}
