use askbot_core::{InboundEvent, ThreadTarget};
use serde::Deserialize;
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SlackCallback {
    UrlVerification { challenge: String },
    Mention(InboundEvent),
    Ignored { callback_type: String, event_type: Option<String> },
}

impl SlackCallback {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UrlVerification { .. } => "url_verification",
            Self::Mention(_) => "app_mention",
            Self::Ignored { .. } => "ignored",
        }
    }
}

/// A payload that could not be turned into an `InboundEvent`.
///
/// `thread` is set when the payload still identified where the mention came
/// from, so the caller can report the problem in that thread.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{reason}")]
pub struct NormalizationError {
    pub reason: String,
    pub thread: Option<ThreadTarget>,
}

impl NormalizationError {
    fn new(reason: impl Into<String>, thread: Option<ThreadTarget>) -> Self {
        Self { reason: reason.into(), thread }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawCallback {
    #[serde(rename = "type", default)]
    callback_type: String,
    challenge: Option<String>,
    event_id: Option<String>,
    event: Option<RawEvent>,
    #[serde(default)]
    authorizations: Vec<RawAuthorization>,
}

#[derive(Debug, Default, Deserialize)]
struct RawEvent {
    #[serde(rename = "type", default)]
    event_type: String,
    user: Option<String>,
    bot_id: Option<String>,
    text: Option<String>,
    ts: Option<String>,
    thread_ts: Option<String>,
    channel: Option<String>,
    client_msg_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawAuthorization {
    user_id: Option<String>,
    #[serde(default)]
    is_bot: bool,
}

/// Parses one Events API request body.
pub fn parse_callback(body: &[u8]) -> Result<SlackCallback, NormalizationError> {
    let raw: RawCallback = serde_json::from_slice(body)
        .map_err(|error| NormalizationError::new(format!("invalid callback json: {error}"), None))?;

    match raw.callback_type.as_str() {
        "url_verification" => {
            let challenge = raw.challenge.filter(|value| !value.is_empty()).ok_or_else(|| {
                NormalizationError::new("url_verification without challenge", None)
            })?;
            Ok(SlackCallback::UrlVerification { challenge })
        }
        "event_callback" => {
            let Some(event) = raw.event.as_ref() else {
                return Err(NormalizationError::new("event_callback without event", None));
            };
            if event.event_type != "app_mention" {
                return Ok(SlackCallback::Ignored {
                    callback_type: raw.callback_type.clone(),
                    event_type: Some(event.event_type.clone()),
                });
            }
            if event.bot_id.is_some() {
                return Ok(SlackCallback::Ignored {
                    callback_type: raw.callback_type.clone(),
                    event_type: Some("app_mention.bot_message".to_owned()),
                });
            }
            normalize_mention(&raw, event).map(SlackCallback::Mention)
        }
        _ => Ok(SlackCallback::Ignored { callback_type: raw.callback_type, event_type: None }),
    }
}

fn normalize_mention(raw: &RawCallback, event: &RawEvent) -> Result<InboundEvent, NormalizationError> {
    let channel_id = non_empty(event.channel.as_deref());
    let ts = non_empty(event.ts.as_deref());

    let thread = match (channel_id, ts) {
        (Some(channel_id), Some(ts)) => {
            let thread_ts = non_empty(event.thread_ts.as_deref()).unwrap_or(ts);
            ThreadTarget::new(channel_id, thread_ts).with_message_ts(ts)
        }
        (None, _) => return Err(NormalizationError::new("app_mention without channel", None)),
        (_, None) => return Err(NormalizationError::new("app_mention without ts", None)),
    };

    let Some(user_id) = non_empty(event.user.as_deref()) else {
        return Err(NormalizationError::new("app_mention without user", Some(thread)));
    };
    let Some(text) = event.text.as_deref() else {
        return Err(NormalizationError::new("app_mention without text", Some(thread)));
    };

    let id = non_empty(event.client_msg_id.as_deref())
        .or_else(|| non_empty(raw.event_id.as_deref()))
        .map(str::to_owned)
        .unwrap_or_else(|| format!("{}-{}", thread.channel_id, thread.message_ts));

    let mentioned_user_id = raw
        .authorizations
        .iter()
        .find(|authorization| authorization.is_bot)
        .or_else(|| raw.authorizations.first())
        .and_then(|authorization| non_empty(authorization.user_id.as_deref()))
        .map(str::to_owned);

    Ok(InboundEvent {
        id,
        channel_id: thread.channel_id.clone(),
        thread,
        user_id: user_id.to_owned(),
        raw_text: text.to_owned(),
        mentioned_user_id,
    })
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
