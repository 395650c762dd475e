//! Slack Events API endpoint.
//!
//! Every callback is answered within the request: accepted mentions get an
//! acknowledgment reaction, rejected ones get an overload reply. The answer
//! itself is produced later by the dispatch worker. Redeliveries are
//! recognized by event id, so a mention gets exactly one outcome.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use askbot_core::{EnqueueError, InboundEvent, PipelineError, WorkQueueSender};
use askbot_slack::events::{parse_callback, SlackCallback};
use askbot_slack::signature::{self, SIGNATURE_HEADER, TIMESTAMP_HEADER};
use askbot_slack::ReplyDispatcher;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const EVENTS_PATH: &str = "/slack/events";
const RETRY_HEADER: &str = "x-slack-retry-num";
const RECENT_EVENT_WINDOW: usize = 1024;

#[derive(Clone)]
pub struct IngressState {
    queue: WorkQueueSender,
    dispatcher: ReplyDispatcher,
    signing_secret: Option<SecretString>,
    recent: Arc<Mutex<RecentEvents>>,
}

/// Ids of mentions that already got an outcome, oldest evicted first.
#[derive(Debug)]
struct RecentEvents {
    window: usize,
    order: VecDeque<String>,
    seen: HashSet<String>,
}

impl RecentEvents {
    fn new(window: usize) -> Self {
        Self { window, order: VecDeque::with_capacity(window), seen: HashSet::with_capacity(window) }
    }

    /// Returns `false` when `id` is still inside the window.
    fn record(&mut self, id: &str) -> bool {
        if self.seen.contains(id) {
            return false;
        }
        if self.order.len() >= self.window {
            if let Some(oldest) = self.order.pop_front() {
                self.seen.remove(&oldest);
            }
        }
        self.order.push_back(id.to_owned());
        self.seen.insert(id.to_owned());
        true
    }
}

impl IngressState {
    pub fn new(
        queue: WorkQueueSender,
        dispatcher: ReplyDispatcher,
        signing_secret: Option<SecretString>,
    ) -> Self {
        Self {
            queue,
            dispatcher,
            signing_secret,
            recent: Arc::new(Mutex::new(RecentEvents::new(RECENT_EVENT_WINDOW))),
        }
    }
}

pub fn router(state: IngressState) -> Router {
    Router::new().route(EVENTS_PATH, post(slack_events)).with_state(state)
}

pub async fn slack_events(
    State(state): State<IngressState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let correlation_id = Uuid::new_v4().to_string();

    if let Some(secret) = &state.signing_secret {
        let verified = signature::verify(
            secret.expose_secret(),
            header(&headers, TIMESTAMP_HEADER),
            header(&headers, SIGNATURE_HEADER),
            &body,
            Utc::now().timestamp(),
        );
        if let Err(error) = verified {
            warn!(
                event_name = "ingress.slack.signature_rejected",
                correlation_id = %correlation_id,
                error = %error,
                "rejecting unsigned or mis-signed callback"
            );
            return StatusCode::UNAUTHORIZED.into_response();
        }
    }

    let callback = match parse_callback(&body) {
        Ok(callback) => callback,
        Err(error) => {
            let failure = PipelineError::NormalizationFailure(error.reason.clone());
            match error.thread {
                Some(thread) => {
                    warn!(
                        event_name = "ingress.slack.normalization_failed",
                        correlation_id = %correlation_id,
                        thread_id = %thread,
                        error = %failure,
                        "malformed mention; reporting in thread"
                    );
                    state.dispatcher.report(&thread, &failure).await;
                }
                None => warn!(
                    event_name = "ingress.slack.normalization_failed",
                    correlation_id = %correlation_id,
                    thread_id = "unknown",
                    error = %failure,
                    "malformed callback with no reply target; dropping"
                ),
            }
            return StatusCode::OK.into_response();
        }
    };

    match callback {
        SlackCallback::UrlVerification { challenge } => {
            info!(
                event_name = "ingress.slack.url_verification",
                correlation_id = %correlation_id,
                "answering url verification challenge"
            );
            Json(json!({ "challenge": challenge })).into_response()
        }
        SlackCallback::Ignored { callback_type, event_type } => {
            debug!(
                event_name = "ingress.slack.ignored",
                correlation_id = %correlation_id,
                callback_type = %callback_type,
                event_type = event_type.as_deref().unwrap_or("none"),
                "callback is not a mention"
            );
            StatusCode::OK.into_response()
        }
        SlackCallback::Mention(event) => {
            let retry_num = header(&headers, RETRY_HEADER).unwrap_or("0");
            if !state.recent.lock().await.record(&event.id) {
                debug!(
                    event_name = "ingress.slack.duplicate_ignored",
                    correlation_id = %correlation_id,
                    event_id = %event.id,
                    thread_id = %event.thread,
                    retry_num,
                    "mention already has an outcome; ignoring redelivery"
                );
                return StatusCode::OK.into_response();
            }
            accept_mention(&state, event, &correlation_id).await;
            StatusCode::OK.into_response()
        }
    }
}

async fn accept_mention(state: &IngressState, event: InboundEvent, correlation_id: &str) {
    let thread = event.thread.clone();
    let event_id = event.id.clone();

    match state.queue.try_enqueue(event) {
        Ok(()) => {
            info!(
                event_name = "ingress.slack.enqueued",
                correlation_id,
                event_id = %event_id,
                thread_id = %thread,
                "mention accepted"
            );
            state.dispatcher.acknowledge(&thread).await;
        }
        Err(rejection) => {
            let failure = match rejection {
                EnqueueError::Full(_) => PipelineError::Overload,
                EnqueueError::Closed(_) => PipelineError::ShuttingDown,
            };
            warn!(
                event_name = "ingress.slack.rejected",
                correlation_id,
                event_id = %event_id,
                thread_id = %thread,
                error_kind = failure.kind(),
                "mention rejected"
            );
            state.dispatcher.report(&thread, &failure).await;
        }
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}
