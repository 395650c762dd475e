use std::fmt;

/// Where a reply for an inbound mention must land.
///
/// `thread_ts` anchors the reply thread and `message_ts` identifies the
/// mention itself, which is what the acknowledgment reaction attaches to.
/// Both come from the originating callback and are never rewritten.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ThreadTarget {
    pub channel_id: String,
    pub thread_ts: String,
    pub message_ts: String,
}

impl ThreadTarget {
    pub fn new(channel_id: impl Into<String>, thread_ts: impl Into<String>) -> Self {
        let thread_ts = thread_ts.into();
        Self { channel_id: channel_id.into(), message_ts: thread_ts.clone(), thread_ts }
    }

    pub fn with_message_ts(mut self, message_ts: impl Into<String>) -> Self {
        self.message_ts = message_ts.into();
        self
    }

    /// Same thread, posted into a different channel.
    pub fn rerouted(&self, channel_id: &str) -> Self {
        Self { channel_id: channel_id.to_owned(), ..self.clone() }
    }
}

impl fmt::Display for ThreadTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.channel_id, self.thread_ts)
    }
}

/// A normalized mention, ready for the work queue.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InboundEvent {
    pub id: String,
    pub thread: ThreadTarget,
    pub channel_id: String,
    pub user_id: String,
    pub raw_text: String,
    pub mentioned_user_id: Option<String>,
}

impl InboundEvent {
    pub fn thread_id(&self) -> String {
        self.thread.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::ThreadTarget;

    #[test]
    fn thread_target_defaults_message_ts_to_thread_ts() {
        let target = ThreadTarget::new("C1", "1730000000.1000");
        assert_eq!(target.message_ts, "1730000000.1000");
        assert_eq!(target.to_string(), "C1/1730000000.1000");
    }

    #[test]
    fn rerouting_keeps_thread_and_message_anchor() {
        let target = ThreadTarget::new("C1", "1730000000.1000").with_message_ts("1730000000.2000");
        let rerouted = target.rerouted("C9");

        assert_eq!(rerouted.channel_id, "C9");
        assert_eq!(rerouted.thread_ts, "1730000000.1000");
        assert_eq!(rerouted.message_ts, "1730000000.2000");
    }
}
