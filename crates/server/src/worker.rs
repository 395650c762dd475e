use std::sync::Arc;
use std::time::Duration;

use askbot_agent::AgentService;
use askbot_core::{
    strip_mention, InboundEvent, PipelineError, QueueLease, ReplyOutcome, WorkQueueReceiver,
};
use askbot_slack::ReplyDispatcher;
use tokio::sync::watch;
use tracing::{info, warn};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WorkerSummary {
    pub processed: usize,
    pub failed: usize,
}

/// The single consumer of the work queue.
///
/// One event is processed at a time, so at most one agent call is ever in
/// flight. Every dequeued event ends in exactly one delivered outcome.
pub struct DispatchWorker {
    receiver: WorkQueueReceiver,
    agent: Arc<dyn AgentService>,
    dispatcher: ReplyDispatcher,
    agent_timeout: Duration,
}

impl DispatchWorker {
    pub fn new(
        receiver: WorkQueueReceiver,
        agent: Arc<dyn AgentService>,
        dispatcher: ReplyDispatcher,
        agent_timeout: Duration,
    ) -> Self {
        Self { receiver, agent, dispatcher, agent_timeout }
    }

    /// Runs until `shutdown` flips (or its sender drops) and the queue has drained.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> WorkerSummary {
        let mut summary = WorkerSummary::default();
        let mut draining = false;

        info!(event_name = "worker.dispatch.started", correlation_id = "worker", "dispatch worker started");

        loop {
            if !draining && *shutdown.borrow() {
                draining = true;
                self.start_draining();
            }

            let next = tokio::select! {
                biased;
                _ = shutdown.changed(), if !draining => None,
                lease = self.receiver.dequeue() => Some(lease),
            };

            match next {
                None => {
                    draining = true;
                    self.start_draining();
                }
                Some(Some(lease)) => {
                    let success = self.handle(lease).await;
                    summary.processed += 1;
                    if !success {
                        summary.failed += 1;
                    }
                }
                Some(None) => break,
            }
        }

        info!(
            event_name = "worker.dispatch.stopped",
            correlation_id = "worker",
            processed = summary.processed,
            failed = summary.failed,
            "dispatch worker drained and stopped"
        );
        summary
    }

    fn start_draining(&mut self) {
        self.receiver.close();
        info!(
            event_name = "worker.dispatch.draining",
            correlation_id = "worker",
            queued = self.receiver.queued(),
            "no longer accepting work; draining queue"
        );
    }

    async fn handle(&self, lease: QueueLease) -> bool {
        let outcome = self.process(lease.event()).await;
        self.dispatcher.deliver(&outcome).await;
        lease.done();
        outcome.is_success()
    }

    /// Turns one event into its terminal outcome. Never fails.
    pub async fn process(&self, event: &InboundEvent) -> ReplyOutcome {
        let thread = event.thread.clone();
        let query = strip_mention(&event.raw_text, event.mentioned_user_id.as_deref());
        if query.trim().is_empty() {
            return self.fail(event, PipelineError::AgentFailure("the question was empty".to_owned()));
        }

        let agent = self.agent.clone();
        let mut call = tokio::spawn(async move { agent.answer(&query).await });

        match tokio::time::timeout(self.agent_timeout, &mut call).await {
            Ok(Ok(Ok(answer))) => {
                info!(
                    event_name = "worker.agent.answered",
                    correlation_id = %event.id,
                    thread_id = %thread,
                    answer_chars = answer.chars().count(),
                    "agent answered"
                );
                ReplyOutcome::success(thread, answer)
            }
            Ok(Ok(Err(error))) => self.fail(event, PipelineError::AgentFailure(error.to_string())),
            Ok(Err(join_error)) => {
                let detail = if join_error.is_panic() {
                    "the agent crashed while answering"
                } else {
                    "the agent call was cancelled"
                };
                self.fail(event, PipelineError::AgentFailure(detail.to_owned()))
            }
            Err(_) => {
                call.abort();
                self.fail(
                    event,
                    PipelineError::AgentFailure(format!(
                        "the agent did not answer within {}s",
                        self.agent_timeout.as_secs()
                    )),
                )
            }
        }
    }

    fn fail(&self, event: &InboundEvent, error: PipelineError) -> ReplyOutcome {
        warn!(
            event_name = "worker.agent.failed",
            correlation_id = %event.id,
            thread_id = %event.thread,
            error_kind = error.kind(),
            error = %error,
            "agent call failed"
        );
        ReplyOutcome::failure(event.thread.clone(), &error)
    }
}
