use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use askbot_core::config::{resolve_config_path, AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

use crate::commands::{CommandResult, EXIT_CONFIG};

const UNSET: &str = "<unset>";

pub fn run() -> CommandResult {
    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            let file = ConfigFile::detect();
            CommandResult { exit_code: 0, output: render(&config, &file) }
        }
        Err(error) => CommandResult::failure(
            "config",
            "config_validation",
            format!("config validation failed: {error}"),
            EXIT_CONFIG,
        ),
    }
}

struct ConfigFile {
    path: Option<PathBuf>,
    doc: Option<Value>,
}

impl ConfigFile {
    fn detect() -> Self {
        let path = resolve_config_path(None);
        let doc = path.as_deref().and_then(load_doc);
        Self { path, doc }
    }

    fn source_of(&self, key_path: &str) -> String {
        for env_key in env_keys(key_path) {
            if env::var_os(&env_key).is_some() {
                return format!("env ({env_key})");
            }
        }

        if self.doc.as_ref().is_some_and(|doc| contains_path(doc, key_path)) {
            let file_path = self
                .path
                .as_deref()
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }

        "default".to_string()
    }
}

fn render(config: &AppConfig, file: &ConfigFile) -> String {
    let slack = &config.slack;
    let agent = &config.agent;

    let fields: Vec<(&str, String)> = vec![
        ("slack.bot_token", redact_token(slack.bot_token.expose_secret())),
        ("slack.signing_secret", redact_optional(slack.signing_secret.is_some())),
        ("slack.reply_channel", slack.reply_channel.clone().unwrap_or_else(|| UNSET.to_string())),
        ("slack.ack_reaction", slack.ack_reaction.clone()),
        ("slack.api_base", slack.api_base.clone()),
        ("slack.request_timeout_ms", slack.request_timeout_ms.to_string()),
        ("queue.capacity", config.queue.capacity.to_string()),
        ("agent.provider", format!("{:?}", agent.provider)),
        ("agent.api_key", redact_optional(agent.api_key.is_some())),
        ("agent.base_url", agent.base_url.clone().unwrap_or_else(|| UNSET.to_string())),
        ("agent.model", agent.model.clone()),
        ("agent.temperature", agent.temperature.to_string()),
        ("agent.timeout_secs", agent.timeout_secs.to_string()),
        ("agent.context_url", agent.context_url.clone().unwrap_or_else(|| UNSET.to_string())),
        ("server.bind_address", config.server.bind_address.clone()),
        ("server.port", config.server.port.to_string()),
        ("server.graceful_shutdown_secs", config.server.graceful_shutdown_secs.to_string()),
        ("logging.level", config.logging.level.clone()),
        ("logging.format", format!("{:?}", config.logging.format)),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    lines.extend(
        fields
            .into_iter()
            .map(|(key, value)| format!("- {key} = {value} (source: {})", file.source_of(key))),
    );
    lines.join("\n")
}

/// `slack.bot_token` -> `ASKBOT_SLACK_BOT_TOKEN`, plus the short logging aliases.
fn env_keys(key_path: &str) -> Vec<String> {
    let canonical = format!("ASKBOT_{}", key_path.replace('.', "_").to_ascii_uppercase());
    match key_path {
        "logging.level" => vec![canonical, "ASKBOT_LOG_LEVEL".to_string()],
        "logging.format" => vec![canonical, "ASKBOT_LOG_FORMAT".to_string()],
        _ => vec![canonical],
    }
}

fn load_doc(path: &Path) -> Option<Value> {
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn redact_optional(present: bool) -> String {
    if present { "<redacted>" } else { UNSET }.to_string()
}

fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once('-') {
        return format!("{prefix}-***");
    }

    "<redacted>".to_string()
}

#[cfg(test)]
mod tests {
    use super::{env_keys, redact_token};

    #[test]
    fn env_keys_follow_askbot_prefix() {
        assert_eq!(env_keys("queue.capacity"), vec!["ASKBOT_QUEUE_CAPACITY".to_string()]);
        assert_eq!(
            env_keys("logging.level"),
            vec!["ASKBOT_LOGGING_LEVEL".to_string(), "ASKBOT_LOG_LEVEL".to_string()]
        );
    }

    #[test]
    fn tokens_keep_only_their_prefix() {
        assert_eq!(redact_token("xoxb-123-456"), "xoxb-***");
        assert_eq!(redact_token("  "), "<empty>");
        assert_eq!(redact_token("opaque"), "<redacted>");
    }
}
