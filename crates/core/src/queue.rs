//! Bounded FIFO between the ingress endpoint and the dispatch worker.
//!
//! The producer half is cheap to clone and shared by every request handler.
//! The consumer half is not `Clone`, so exactly one worker can drain it.
//! `try_enqueue` never waits: a full queue is reported back to the caller
//! together with the rejected event.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::event::InboundEvent;

#[derive(Debug, Error)]
pub enum EnqueueError {
    #[error("work queue is at capacity")]
    Full(InboundEvent),
    #[error("work queue is closed")]
    Closed(InboundEvent),
}

impl EnqueueError {
    pub fn into_event(self) -> InboundEvent {
        match self {
            Self::Full(event) | Self::Closed(event) => event,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    pub capacity: usize,
    pub queued: usize,
    pub in_flight: usize,
    pub accepting: bool,
}

struct Shared {
    capacity: usize,
    in_flight: AtomicUsize,
}

pub fn work_queue(capacity: usize) -> (WorkQueueSender, WorkQueueReceiver) {
    let capacity = capacity.max(1);
    let (tx, rx) = mpsc::channel(capacity);
    let shared = Arc::new(Shared { capacity, in_flight: AtomicUsize::new(0) });
    (WorkQueueSender { tx, shared: shared.clone() }, WorkQueueReceiver { rx, shared })
}

#[derive(Clone)]
pub struct WorkQueueSender {
    tx: mpsc::Sender<InboundEvent>,
    shared: Arc<Shared>,
}

impl WorkQueueSender {
    pub fn try_enqueue(&self, event: InboundEvent) -> Result<(), EnqueueError> {
        self.tx.try_send(event).map_err(|error| match error {
            TrySendError::Full(event) => EnqueueError::Full(event),
            TrySendError::Closed(event) => EnqueueError::Closed(event),
        })
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    pub fn stats(&self) -> QueueStats {
        QueueStats {
            capacity: self.shared.capacity,
            queued: self.shared.capacity.saturating_sub(self.tx.capacity()),
            in_flight: self.shared.in_flight.load(Ordering::Acquire),
            accepting: !self.tx.is_closed(),
        }
    }
}

pub struct WorkQueueReceiver {
    rx: mpsc::Receiver<InboundEvent>,
    shared: Arc<Shared>,
}

impl WorkQueueReceiver {
    /// Waits for the next event. Returns `None` once the queue is closed and empty.
    pub async fn dequeue(&mut self) -> Option<QueueLease> {
        let event = self.rx.recv().await?;
        self.shared.in_flight.fetch_add(1, Ordering::AcqRel);
        Some(QueueLease { event, shared: self.shared.clone() })
    }

    /// Rejects further enqueues; already queued events stay available to `dequeue`.
    pub fn close(&mut self) {
        self.rx.close();
    }

    pub fn queued(&self) -> usize {
        self.rx.len()
    }

    pub fn in_flight(&self) -> usize {
        self.shared.in_flight.load(Ordering::Acquire)
    }
}

/// A dequeued event whose slot stays counted as in flight until `done` or drop.
pub struct QueueLease {
    event: InboundEvent,
    shared: Arc<Shared>,
}

impl QueueLease {
    pub fn event(&self) -> &InboundEvent {
        &self.event
    }

    pub fn done(self) {}
}

impl Drop for QueueLease {
    fn drop(&mut self) {
        self.shared.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{work_queue, EnqueueError};
    use crate::event::{InboundEvent, ThreadTarget};

    fn event(id: &str) -> InboundEvent {
        InboundEvent {
            id: id.to_owned(),
            thread: ThreadTarget::new("C1", format!("1730000000.{id}")),
            channel_id: "C1".to_owned(),
            user_id: "U1".to_owned(),
            raw_text: format!("<@U0BOT> question {id}"),
            mentioned_user_id: Some("U0BOT".to_owned()),
        }
    }

    #[tokio::test]
    async fn third_enqueue_on_capacity_two_is_rejected_and_order_is_kept() {
        let (sender, mut receiver) = work_queue(2);

        sender.try_enqueue(event("a")).expect("a accepted");
        sender.try_enqueue(event("b")).expect("b accepted");
        let rejected = sender.try_enqueue(event("c"));

        match rejected {
            Err(EnqueueError::Full(event)) => assert_eq!(event.id, "c"),
            other => panic!("expected full rejection, got {other:?}"),
        }

        let first = receiver.dequeue().await.expect("first item");
        assert_eq!(first.event().id, "a");
        first.done();
        let second = receiver.dequeue().await.expect("second item");
        assert_eq!(second.event().id, "b");
    }

    #[tokio::test]
    async fn full_queue_rejects_without_blocking() {
        let (sender, _receiver) = work_queue(1);
        sender.try_enqueue(event("a")).expect("a accepted");

        let attempt = tokio::time::timeout(Duration::from_millis(50), async {
            sender.try_enqueue(event("b"))
        })
        .await
        .expect("try_enqueue must return immediately");

        assert!(matches!(attempt, Err(EnqueueError::Full(_))));
    }

    #[tokio::test]
    async fn concurrent_producers_never_exceed_capacity() {
        let (sender, receiver) = work_queue(4);
        let mut handles = Vec::new();
        for index in 0..16 {
            let sender = sender.clone();
            handles.push(tokio::spawn(async move {
                sender.try_enqueue(event(&index.to_string())).is_ok()
            }));
        }

        let mut accepted = 0;
        for handle in handles {
            if handle.await.expect("producer task") {
                accepted += 1;
            }
        }

        assert_eq!(accepted, 4);
        assert_eq!(receiver.queued(), 4);
        assert_eq!(sender.stats().queued, 4);
    }

    #[tokio::test]
    async fn slot_is_freed_on_dequeue_and_tracked_until_done() {
        let (sender, mut receiver) = work_queue(1);
        sender.try_enqueue(event("a")).expect("a accepted");

        let lease = receiver.dequeue().await.expect("lease");
        let stats = sender.stats();
        assert_eq!(stats.queued, 0);
        assert_eq!(stats.in_flight, 1);

        sender.try_enqueue(event("b")).expect("slot is free again once dequeued");

        lease.done();
        assert_eq!(receiver.in_flight(), 0);
    }

    #[tokio::test]
    async fn dropped_lease_still_completes_slot() {
        let (sender, mut receiver) = work_queue(2);
        sender.try_enqueue(event("a")).expect("a accepted");

        {
            let _lease = receiver.dequeue().await.expect("lease");
            assert_eq!(receiver.in_flight(), 1);
        }

        assert_eq!(receiver.in_flight(), 0);
    }

    #[tokio::test]
    async fn close_rejects_new_work_but_drains_queued_events() {
        let (sender, mut receiver) = work_queue(4);
        sender.try_enqueue(event("a")).expect("a accepted");
        sender.try_enqueue(event("b")).expect("b accepted");

        receiver.close();
        assert!(matches!(sender.try_enqueue(event("c")), Err(EnqueueError::Closed(_))));
        assert!(!sender.stats().accepting);

        let drained_a = receiver.dequeue().await.expect("a drained");
        assert_eq!(drained_a.event().id, "a");
        let drained_b = receiver.dequeue().await.expect("b drained");
        assert_eq!(drained_b.event().id, "b");
        drop((drained_a, drained_b));
        assert!(receiver.dequeue().await.is_none());
    }
}
