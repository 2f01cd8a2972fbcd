//! Redis Streams task queue.
//!
//! Jobs are pushed as XADD entries and consumed through a consumer
//! group; unacknowledged entries from crashed workers are reclaimed
//! with XCLAIM and moved to a dead-letter stream after too many
//! retries.

pub mod error;
pub mod job;
pub mod queue;

pub use error::{QueueError, QueueResult};
pub use job::ProcessTaskJob;
pub use queue::{QueueConfig, TaskQueue};
