//! Agent - question answering behind the `AgentService` seam
//!
//! The pipeline only sees [`AgentService::answer`]. This crate provides the
//! production implementation:
//! - **Assistant** (`assistant`) - prompt template around the question
//! - **LLM backends** (`llm`) - OpenAI, Anthropic and Ollama over HTTP
//! - **Context** (`context`) - optional `QueryFn` that enriches the prompt
//!
//! # Wiring
//!
//! ```text
//! AssistantAgent ─┬─ LlmClient (build_llm_client)
//!                 └─ Option<QueryFn> (HttpContextQuery when agent.context_url is set)
//! ```

pub mod assistant;
pub mod context;
pub mod llm;
pub mod service;

use std::sync::Arc;

use askbot_core::config::AgentConfig;

pub use assistant::AssistantAgent;
pub use context::HttpContextQuery;
pub use llm::{build_llm_client, LlmClient, LlmError};
pub use service::{AgentError, AgentService, QueryFn};

/// Builds the configured assistant, with context lookup when `context_url` is set.
pub fn build_assistant(config: &AgentConfig) -> Result<AssistantAgent, AgentError> {
    let llm = build_llm_client(config)?;
    let context = match config.context_url.as_deref() {
        Some(url) => Some(Arc::new(HttpContextQuery::new(url)?) as Arc<dyn QueryFn>),
        None => None,
    };
    Ok(AssistantAgent::new(llm, context))
}

#[cfg(test)]
mod tests {
    use askbot_core::config::AppConfig;

    use super::build_assistant;

    #[test]
    fn context_lookup_is_wired_only_when_configured() {
        let mut config = AppConfig::default().agent;
        config.api_key = Some("sk-test".to_owned().into());

        assert!(!build_assistant(&config).expect("assistant").has_context());

        config.context_url = Some("http://127.0.0.1:8099/context".to_owned());
        assert!(build_assistant(&config).expect("assistant").has_context());
    }
}
