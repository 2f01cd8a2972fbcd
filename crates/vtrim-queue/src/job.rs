//! Job types for the queue.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vtrim_models::TaskId;

/// Job to run the full trimming pipeline for one uploaded video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessTaskJob {
    /// Unique job ID
    pub job_id: String,
    /// Task this job drives
    pub task_id: TaskId,
    /// When the job was created
    pub created_at: DateTime<Utc>,
}

impl ProcessTaskJob {
    /// Create a new job for a task.
    pub fn new(task_id: TaskId) -> Self {
        Self {
            job_id: Uuid::new_v4().to_string(),
            task_id,
            created_at: Utc::now(),
        }
    }

    /// Generate idempotency key for deduplication.
    ///
    /// Keyed on the task, not the job: re-submitting the same task
    /// while a job for it is still live is a duplicate.
    pub fn idempotency_key(&self) -> String {
        format!("process:{}", self.task_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idempotency_key_is_per_task() {
        let a = ProcessTaskJob::new(TaskId::from("t-1".to_string()));
        let b = ProcessTaskJob::new(TaskId::from("t-1".to_string()));
        assert_ne!(a.job_id, b.job_id);
        assert_eq!(a.idempotency_key(), b.idempotency_key());
    }

    #[test]
    fn test_job_round_trips_through_json() {
        let job = ProcessTaskJob::new(TaskId::from("t-2".to_string()));
        let json = serde_json::to_string(&job).unwrap();
        let back: ProcessTaskJob = serde_json::from_str(&json).unwrap();
        assert_eq!(back.job_id, job.job_id);
        assert_eq!(back.task_id, job.task_id);
    }
}
