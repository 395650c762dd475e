//! HTTP-backed context lookup.
//!
//! POSTs `{"query": "..."}` to `agent.context_url` and expects
//! `{"context": "..."}` back. `204 No Content` or a null/blank `context`
//! means nothing relevant was found.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;

use crate::service::{AgentError, QueryFn};

const CONTEXT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct HttpContextQuery {
    http: reqwest::Client,
    url: String,
}

#[derive(Debug, Deserialize)]
struct ContextResponse {
    context: Option<String>,
}

impl HttpContextQuery {
    pub fn new(url: impl Into<String>) -> Result<Self, AgentError> {
        let http = reqwest::Client::builder()
            .timeout(CONTEXT_TIMEOUT)
            .build()
            .map_err(|error| AgentError::Context(error.to_string()))?;
        Ok(Self { http, url: url.into() })
    }
}

fn context_from(body: ContextResponse) -> Option<String> {
    body.context.map(|text| text.trim().to_owned()).filter(|text| !text.is_empty())
}

#[async_trait]
impl QueryFn for HttpContextQuery {
    async fn query(&self, question: &str) -> Result<Option<String>, AgentError> {
        let response = self
            .http
            .post(&self.url)
            .json(&json!({ "query": question }))
            .send()
            .await
            .map_err(|error| AgentError::Context(error.to_string()))?;

        match response.status() {
            StatusCode::NO_CONTENT => Ok(None),
            status if status.is_success() => {
                let body: ContextResponse =
                    response.json().await.map_err(|error| AgentError::Context(error.to_string()))?;
                Ok(context_from(body))
            }
            status => Err(AgentError::Context(format!("context service returned http {status}"))),
        }
    }
}
