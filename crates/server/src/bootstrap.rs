use std::sync::Arc;
use std::time::Duration;

use askbot_agent::{build_assistant, AgentError, AgentService};
use askbot_core::config::{AppConfig, ConfigError, LoadOptions};
use askbot_core::{work_queue, WorkQueueSender};
use askbot_slack::{ChatClient, ChatError, ReplyDispatcher, SlackWebClient};
use thiserror::Error;
use tracing::info;

use crate::ingress::IngressState;
use crate::worker::DispatchWorker;

pub struct Application {
    pub config: AppConfig,
    pub ingress: IngressState,
    pub queue: WorkQueueSender,
    pub worker: DispatchWorker,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("slack client setup failed: {0}")]
    Slack(#[source] ChatError),
    #[error("agent setup failed: {0}")]
    Agent(#[source] AgentError),
}

pub fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        thread_id = "unknown",
        "starting application bootstrap"
    );
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config)
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    let chat = SlackWebClient::new(&config.slack).map_err(BootstrapError::Slack)?;
    let agent = build_assistant(&config.agent).map_err(BootstrapError::Agent)?;
    info!(
        event_name = "system.bootstrap.clients_ready",
        correlation_id = "bootstrap",
        thread_id = "unknown",
        agent_provider = ?config.agent.provider,
        agent_model = %config.agent.model,
        context_lookup = agent.has_context(),
        "slack and agent clients constructed"
    );

    Ok(assemble(config, Arc::new(chat), Arc::new(agent)))
}

/// Wires the pipeline around already-built collaborators.
pub fn assemble(
    config: AppConfig,
    chat: Arc<dyn ChatClient>,
    agent: Arc<dyn AgentService>,
) -> Application {
    let (queue, receiver) = work_queue(config.queue.capacity);
    let dispatcher = ReplyDispatcher::new(chat, config.slack.reply_channel.clone());
    let ingress =
        IngressState::new(queue.clone(), dispatcher.clone(), config.slack.signing_secret.clone());
    let worker = DispatchWorker::new(
        receiver,
        agent,
        dispatcher,
        Duration::from_secs(config.agent.timeout_secs),
    );

    info!(
        event_name = "system.bootstrap.pipeline_ready",
        correlation_id = "bootstrap",
        thread_id = "unknown",
        queue_capacity = config.queue.capacity,
        reply_channel = config.slack.reply_channel.as_deref().unwrap_or("origin"),
        "ingestion pipeline assembled"
    );

    Application { config, ingress, queue, worker }
}
