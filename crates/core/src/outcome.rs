use crate::errors::{format_error_reply, PipelineError};
use crate::event::ThreadTarget;

/// Terminal result of processing one queued mention.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReplyOutcome {
    Success { thread: ThreadTarget, text: String },
    Failure { thread: ThreadTarget, text: String },
}

impl ReplyOutcome {
    pub fn success(thread: ThreadTarget, text: impl Into<String>) -> Self {
        Self::Success { thread, text: text.into() }
    }

    pub fn failure(thread: ThreadTarget, error: &PipelineError) -> Self {
        Self::Failure { thread, text: format_error_reply(error) }
    }

    pub fn thread(&self) -> &ThreadTarget {
        match self {
            Self::Success { thread, .. } | Self::Failure { thread, .. } => thread,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Success { text, .. } | Self::Failure { text, .. } => text,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}
