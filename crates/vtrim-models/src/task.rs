//! Video task record and its status state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::segment::KeepRange;

/// Unique task identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Generate a fresh task ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Processing status of a video task.
///
/// Transitions are monotonic and one-directional:
/// `pending -> processing -> completed | failed`. No transition skips
/// `processing` and no transition leaves a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task is created and waiting for a worker.
    #[default]
    Pending,
    /// A worker claimed the task and is running the pipeline.
    Processing,
    /// Pipeline finished and the trimmed video was uploaded.
    Completed,
    /// Pipeline aborted; the task will not be retried under this ID.
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Processing => "processing",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }

    /// Check whether moving to `next` is a legal transition.
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (TaskStatus::Pending, TaskStatus::Processing)
                | (TaskStatus::Processing, TaskStatus::Completed)
                | (TaskStatus::Processing, TaskStatus::Failed)
        )
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TaskStatus::Pending),
            "processing" => Ok(TaskStatus::Processing),
            "completed" => Ok(TaskStatus::Completed),
            "failed" => Ok(TaskStatus::Failed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Error for unrecognized status strings read back from storage.
#[derive(Debug, thiserror::Error)]
#[error("unknown task status: {0}")]
pub struct UnknownStatus(pub String);

/// The unit of work and its own audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoTask {
    /// Opaque unique identifier, assigned at creation, immutable.
    pub task_id: TaskId,
    /// Original client-supplied filename, immutable.
    pub filename: String,
    /// Storage key of the uploaded source blob, set at creation.
    pub original_ref: String,
    /// Storage key of the trimmed output; set iff status is `completed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_ref: Option<String>,
    /// Current lifecycle status.
    pub status: TaskStatus,
    /// Keep-ranges decided by the analysis stage; persisted even when a
    /// later stage fails, for diagnostics.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_result: Option<Vec<KeepRange>>,
    /// When the task was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl VideoTask {
    /// Create a new pending task for an uploaded blob.
    pub fn new(task_id: TaskId, filename: impl Into<String>, original_ref: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            task_id,
            filename: filename.into(),
            original_ref: original_ref.into(),
            processed_ref: None,
            status: TaskStatus::Pending,
            analysis_result: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
