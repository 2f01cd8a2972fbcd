//! Worker error types.
//!
//! Stage errors carry distinct variants because they have distinct
//! handling: analysis failures are recovered inline with a full-keep
//! fallback, persistence failures after the claim are logged and do
//! not abort, and everything else fails the task.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Transcription failed: {0}")]
    Transcription(#[source] vtrim_ai::AiError),

    #[error("Analysis failed: {0}")]
    Analysis(#[source] vtrim_ai::AiError),

    #[error("Storage error: {0}")]
    Storage(#[from] vtrim_storage::StorageError),

    #[error("Media error: {0}")]
    Media(#[from] vtrim_media::MediaError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] vtrim_taskstore::TaskStoreError),

    #[error("Queue error: {0}")]
    Queue(#[from] vtrim_queue::QueueError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn task_not_found(task_id: impl std::fmt::Display) -> Self {
        Self::TaskNotFound(task_id.to_string())
    }

    /// Short stable label for operator-facing logs.
    pub fn kind(&self) -> &'static str {
        match self {
            WorkerError::TaskNotFound(_) => "task_not_found",
            WorkerError::Transcription(_) => "transcription",
            WorkerError::Analysis(_) => "analysis",
            WorkerError::Storage(_) => "storage",
            WorkerError::Media(_) => "media",
            WorkerError::Persistence(_) => "persistence",
            WorkerError::Queue(_) => "queue",
            WorkerError::Io(_) => "io",
        }
    }
}
