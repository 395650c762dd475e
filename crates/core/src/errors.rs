use thiserror::Error;

/// Prefix that makes pipeline failures stand out from normal answers in a thread.
pub const ERROR_MARKER: &str = ":exclamation::exclamation::exclamation:";

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error("Too many requests")]
    Overload,
    #[error("{0}")]
    AgentFailure(String),
    #[error("could not read the mention: {0}")]
    NormalizationFailure(String),
    #[error("reply delivery failed: {0}")]
    DeliveryFailure(String),
    #[error("The bot is shutting down, please try again shortly")]
    ShuttingDown,
}

impl PipelineError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Overload => "overload",
            Self::AgentFailure(_) => "agent_failure",
            Self::NormalizationFailure(_) => "normalization_failure",
            Self::DeliveryFailure(_) => "delivery_failure",
            Self::ShuttingDown => "shutting_down",
        }
    }

    /// Whether this failure is reported back into the originating thread.
    pub fn is_user_visible(&self) -> bool {
        !matches!(self, Self::DeliveryFailure(_))
    }

    pub fn user_message(&self) -> String {
        format_error_reply(self)
    }
}

pub fn format_error_reply(detail: impl std::fmt::Display) -> String {
    format!("{ERROR_MARKER} Error: {detail}")
}

pub fn is_error_reply(text: &str) -> bool {
    text.starts_with(ERROR_MARKER)
}

#[cfg(test)]
mod tests {
    use super::{format_error_reply, is_error_reply, PipelineError, ERROR_MARKER};

    #[test]
    fn overload_reply_carries_marker_and_reason() {
        let message = PipelineError::Overload.user_message();
        assert_eq!(message, ":exclamation::exclamation::exclamation: Error: Too many requests");
        assert!(is_error_reply(&message));
    }

    #[test]
    fn agent_failure_keeps_underlying_detail() {
        let message = PipelineError::AgentFailure("model quota exhausted".to_owned()).user_message();
        assert!(message.starts_with(ERROR_MARKER));
        assert!(message.ends_with("Error: model quota exhausted"));
    }

    #[test]
    fn delivery_failures_are_not_user_visible() {
        assert!(!PipelineError::DeliveryFailure("channel_not_found".to_owned()).is_user_visible());
        assert!(PipelineError::Overload.is_user_visible());
        assert_eq!(PipelineError::ShuttingDown.kind(), "shutting_down");
    }

    #[test]
    fn normal_answers_are_not_mistaken_for_errors() {
        assert!(!is_error_reply("4"));
        assert!(is_error_reply(&format_error_reply("boom")));
    }
}
