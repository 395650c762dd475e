use std::borrow::Cow;
use std::sync::Arc;

use askbot_core::{PipelineError, ReplyOutcome, ThreadTarget};
use tracing::{debug, warn};

use crate::client::ChatClient;

/// Slack rejects `chat.postMessage` text beyond this many characters.
pub const MAX_MESSAGE_CHARS: usize = 40_000;

/// Posts replies and acknowledgments back into the originating thread.
///
/// Every method is fire-and-forget: a delivery failure is logged and reported
/// as `false`, never returned as an error, because there is no further place
/// to send it.
#[derive(Clone)]
pub struct ReplyDispatcher {
    client: Arc<dyn ChatClient>,
    reply_channel: Option<String>,
}

impl ReplyDispatcher {
    pub fn new(client: Arc<dyn ChatClient>, reply_channel: Option<String>) -> Self {
        Self { client, reply_channel }
    }

    pub fn route(&self, thread: &ThreadTarget) -> ThreadTarget {
        match &self.reply_channel {
            Some(channel) => thread.rerouted(channel),
            None => thread.clone(),
        }
    }

    pub async fn post(&self, thread: &ThreadTarget, text: &str) -> bool {
        let target = self.route(thread);
        let text = truncate_message(text);
        match self.client.post_message(&target, &text).await {
            Ok(()) => {
                debug!(
                    event_name = "reply.slack.delivered",
                    thread_id = %target,
                    chars = text.chars().count(),
                    "reply delivered"
                );
                true
            }
            Err(error) => {
                let failure = PipelineError::DeliveryFailure(error.to_string());
                warn!(
                    event_name = "reply.slack.delivery_failed",
                    thread_id = %target,
                    error_kind = failure.kind(),
                    error = %failure,
                    "reply could not be delivered; dropping"
                );
                false
            }
        }
    }

    pub async fn deliver(&self, outcome: &ReplyOutcome) -> bool {
        self.post(outcome.thread(), outcome.text()).await
    }

    pub async fn report(&self, thread: &ThreadTarget, error: &PipelineError) -> bool {
        self.post(thread, &error.user_message()).await
    }

    /// Reacts to the original mention. Always targets the mention's own channel.
    pub async fn acknowledge(&self, thread: &ThreadTarget) -> bool {
        match self.client.add_acknowledgment(thread).await {
            Ok(()) => true,
            Err(error) => {
                warn!(
                    event_name = "reply.slack.ack_failed",
                    thread_id = %thread,
                    error = %error,
                    "acknowledgment reaction could not be added"
                );
                false
            }
        }
    }
}

fn truncate_message(text: &str) -> Cow<'_, str> {
    if text.chars().count() <= MAX_MESSAGE_CHARS {
        return Cow::Borrowed(text);
    }
    let cut = text
        .char_indices()
        .nth(MAX_MESSAGE_CHARS - 1)
        .map(|(index, _)| index)
        .unwrap_or(text.len());
    let mut truncated = text[..cut].to_owned();
    truncated.push('…');
    Cow::Owned(truncated)
}
