//! TaskStore seam for the pipeline.

use async_trait::async_trait;

use vtrim_models::{KeepRange, TaskId, VideoTask};

use crate::error::TaskStoreResult;

/// Durable record store keyed by task ID, with atomic per-call updates.
///
/// Status writes enforce the state machine: `pending -> processing ->
/// completed | failed`. Terminal states never change again under the
/// same task ID.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Persist a freshly created task. Fails if the ID already exists;
    /// task IDs are never reused.
    async fn create(&self, task: &VideoTask) -> TaskStoreResult<()>;

    /// Fetch a task by ID, or `None` if unknown.
    async fn get(&self, task_id: &TaskId) -> TaskStoreResult<Option<VideoTask>>;

    /// Atomically claim the task: `pending -> processing`.
    ///
    /// Returns `true` if this caller won the claim. A concurrent
    /// duplicate dispatch observes `processing` (or a terminal state)
    /// and gets `false` — the single-flight guard.
    async fn begin_processing(&self, task_id: &TaskId) -> TaskStoreResult<bool>;

    /// Persist the analysis keep-ranges. Written as soon as analysis
    /// finishes so the decision survives a later stage failure.
    async fn set_analysis_result(
        &self,
        task_id: &TaskId,
        ranges: &[KeepRange],
    ) -> TaskStoreResult<()>;

    /// Atomically transition `processing -> completed` and set the
    /// processed blob reference. The two fields change together so
    /// `processed_ref` is observable iff the task is completed.
    async fn complete(&self, task_id: &TaskId, processed_ref: &str) -> TaskStoreResult<()>;

    /// Atomically transition `processing -> failed`.
    async fn fail(&self, task_id: &TaskId) -> TaskStoreResult<()>;
}
