use std::time::Duration;

use askbot_agent::{build_assistant, AgentService};
use askbot_core::config::{AppConfig, LoadOptions};
use askbot_core::strip_mention;

use crate::commands::{CommandResult, EXIT_CONFIG, EXIT_RUNTIME};

pub fn run(question: &str) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure("ask", "config_validation", error.to_string(), EXIT_CONFIG)
        }
    };

    let query = strip_mention(question, None);
    if query.trim().is_empty() {
        return CommandResult::failure("ask", "empty_question", "the question was empty", EXIT_RUNTIME);
    }

    let agent = match build_assistant(&config.agent) {
        Ok(agent) => agent,
        Err(error) => {
            return CommandResult::failure("ask", "agent_setup", error.to_string(), EXIT_RUNTIME)
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "ask",
                "runtime",
                format!("failed to initialize async runtime: {error}"),
                EXIT_RUNTIME,
            )
        }
    };

    let deadline = Duration::from_secs(config.agent.timeout_secs);
    let answer = runtime.block_on(async { tokio::time::timeout(deadline, agent.answer(&query)).await });

    match answer {
        Ok(Ok(answer)) => CommandResult::success("ask", answer),
        Ok(Err(error)) => CommandResult::failure("ask", "agent_failure", error.to_string(), EXIT_RUNTIME),
        Err(_) => CommandResult::failure(
            "ask",
            "agent_timeout",
            format!("the agent did not answer within {}s", deadline.as_secs()),
            EXIT_RUNTIME,
        ),
    }
}
