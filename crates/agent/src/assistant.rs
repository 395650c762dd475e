use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::llm::LlmClient;
use crate::service::{AgentError, AgentService, QueryFn};

const PREAMBLE: &str =
    "You are a personal assistant. Your job is to find the best answer to the questions asked.";
const SEPARATOR: &str = "###";

/// General-purpose question answering over a single completion backend.
pub struct AssistantAgent {
    llm: Arc<dyn LlmClient>,
    context: Option<Arc<dyn QueryFn>>,
}

impl AssistantAgent {
    pub fn new(llm: Arc<dyn LlmClient>, context: Option<Arc<dyn QueryFn>>) -> Self {
        Self { llm, context }
    }

    pub fn has_context(&self) -> bool {
        self.context.is_some()
    }

    async fn lookup_context(&self, query: &str) -> Option<String> {
        let source = self.context.as_ref()?;
        match source.query(query).await {
            Ok(context) => context.filter(|text| !text.trim().is_empty()),
            Err(error) => {
                // A failed lookup degrades to an answer without context.
                warn!(
                    event_name = "agent.context.failed",
                    error = %error,
                    "context lookup failed; answering without it"
                );
                None
            }
        }
    }
}

pub fn render_prompt(query: &str, context: Option<&str>) -> String {
    match context {
        Some(context) => {
            format!("{PREAMBLE}\n{SEPARATOR}\nContext:\n{}\n{SEPARATOR}\n{query}", context.trim())
        }
        None => format!("{PREAMBLE}\n{SEPARATOR}\n{query}"),
    }
}

#[async_trait]
impl AgentService for AssistantAgent {
    async fn answer(&self, query: &str) -> Result<String, AgentError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AgentError::EmptyQuery);
        }

        let context = self.lookup_context(query).await;
        let prompt = render_prompt(query, context.as_deref());
        debug!(
            event_name = "agent.answer.started",
            provider = self.llm.provider(),
            with_context = context.is_some(),
            prompt_chars = prompt.chars().count(),
        );

        Ok(self.llm.complete(&prompt).await?)
    }
}
