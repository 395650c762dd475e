//! Askbot Core - pipeline types shared by the ingress, worker and reply paths
//!
//! - **Config** (`config`) - layered application configuration
//! - **Events** (`event`) - normalized mentions and their reply targets
//! - **Queue** (`queue`) - the bounded work queue and its backpressure signal
//! - **Outcomes** (`outcome`, `errors`) - terminal results and error replies
//! - **Mentions** (`mention`) - addressing-token removal

pub mod config;
pub mod errors;
pub mod event;
pub mod mention;
pub mod outcome;
pub mod queue;

pub use errors::{format_error_reply, is_error_reply, PipelineError, ERROR_MARKER};
pub use event::{InboundEvent, ThreadTarget};
pub use mention::strip_mention;
pub use outcome::ReplyOutcome;
pub use queue::{work_queue, EnqueueError, QueueLease, QueueStats, WorkQueueReceiver, WorkQueueSender};
