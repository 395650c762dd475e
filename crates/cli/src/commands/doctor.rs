use askbot_agent::build_assistant;
use askbot_core::config::{AgentProvider, AppConfig, LoadOptions};
use askbot_slack::SlackWebClient;
use serde::Serialize;

use crate::commands::{CommandResult, EXIT_CONFIG, EXIT_RUNTIME};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

impl DoctorReport {
    fn exit_code(&self) -> u8 {
        let failed = |name: &str| {
            self.checks.iter().any(|check| check.name == name && check.status == CheckStatus::Fail)
        };
        if failed("config_validation") {
            EXIT_CONFIG
        } else if self.overall_status == CheckStatus::Fail {
            EXIT_RUNTIME
        } else {
            0
        }
    }
}

pub fn run(json_output: bool) -> CommandResult {
    let report = build_report();
    let exit_code = report.exit_code();

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_slack_auth(&config));
            checks.push(check_agent_backend(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(skipped("slack_auth"));
            checks.push(skipped("agent_backend"));
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn skipped(name: &'static str) -> DoctorCheck {
    DoctorCheck {
        name,
        status: CheckStatus::Skipped,
        details: "skipped because configuration did not load".to_string(),
    }
}

fn check_slack_auth(config: &AppConfig) -> DoctorCheck {
    let fail = |details: String| DoctorCheck { name: "slack_auth", status: CheckStatus::Fail, details };

    let client = match SlackWebClient::new(&config.slack) {
        Ok(client) => client,
        Err(error) => return fail(error.to_string()),
    };
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => return fail(format!("failed to initialize async runtime: {error}")),
    };

    match runtime.block_on(client.auth_test()) {
        Ok(identity) => DoctorCheck {
            name: "slack_auth",
            status: CheckStatus::Pass,
            details: format!("bot token accepted; bot user is `{}`", identity.user_id),
        },
        Err(error) => fail(error.to_string()),
    }
}

fn check_agent_backend(config: &AppConfig) -> DoctorCheck {
    match build_assistant(&config.agent) {
        Ok(agent) => {
            let endpoint = match (config.agent.provider, config.agent.base_url.as_deref()) {
                (_, Some(base_url)) => base_url.to_string(),
                (AgentProvider::OpenAi, None) => "openai default endpoint".to_string(),
                (AgentProvider::Anthropic, None) => "anthropic default endpoint".to_string(),
                (AgentProvider::Ollama, None) => "<unset>".to_string(),
            };
            let context = if agent.has_context() { "with context lookup" } else { "no context lookup" };
            DoctorCheck {
                name: "agent_backend",
                status: CheckStatus::Pass,
                details: format!(
                    "{:?} model `{}` via {endpoint}, {context}",
                    config.agent.provider, config.agent.model
                ),
            }
        }
        Err(error) => DoctorCheck {
            name: "agent_backend",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
