use askbot_core::{QueueStats, WorkQueueSender};
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

#[derive(Clone)]
pub struct HealthState {
    queue: WorkQueueSender,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub queue: QueueStats,
    pub checked_at: String,
}

pub fn router(queue: WorkQueueSender) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { queue })
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let queue = state.queue.stats();
    let accepting = queue.accepting;

    let payload = HealthResponse {
        status: if accepting { "ready" } else { "draining" },
        queue,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if accepting { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

#[cfg(test)]
mod tests {
    use askbot_core::{work_queue, InboundEvent, ThreadTarget};
    use axum::{extract::State, http::StatusCode, Json};

    use crate::health::{health, HealthState};

    #[tokio::test]
    async fn health_reports_queue_occupancy_while_accepting() {
        let (queue, _receiver) = work_queue(3);
        queue
            .try_enqueue(InboundEvent {
                id: "ev-1".to_owned(),
                thread: ThreadTarget::new("C1", "1"),
                channel_id: "C1".to_owned(),
                user_id: "U1".to_owned(),
                raw_text: "<@U0BOT> hi".to_owned(),
                mentioned_user_id: None,
            })
            .expect("enqueue");

        let (status, Json(payload)) = health(State(HealthState { queue })).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "ready");
        assert_eq!(payload.queue.capacity, 3);
        assert_eq!(payload.queue.queued, 1);
        assert_eq!(payload.queue.in_flight, 0);
    }

    #[tokio::test]
    async fn health_returns_service_unavailable_once_draining() {
        let (queue, mut receiver) = work_queue(3);
        receiver.close();

        let (status, Json(payload)) = health(State(HealthState { queue })).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload.status, "draining");
        assert!(!payload.queue.accepting);
    }
}
