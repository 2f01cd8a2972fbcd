//! In-memory task store for tests and local single-process runs.
//!
//! Enforces the same transition rules as the Redis store; the map lock
//! makes every operation atomic.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use vtrim_models::{KeepRange, TaskId, TaskStatus, VideoTask};

use crate::error::{TaskStoreError, TaskStoreResult};
use crate::store::TaskStore;

/// Task store backed by a process-local map.
#[derive(Clone, Default)]
pub struct MemoryTaskStore {
    tasks: Arc<Mutex<HashMap<String, VideoTask>>>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observed status history is not tracked here; tests that need it
    /// wrap the store. This helper exists for assertions on the final
    /// record.
    pub async fn snapshot(&self, task_id: &TaskId) -> Option<VideoTask> {
        self.tasks.lock().await.get(task_id.as_str()).cloned()
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn create(&self, task: &VideoTask) -> TaskStoreResult<()> {
        let mut tasks = self.tasks.lock().await;
        if tasks.contains_key(task.task_id.as_str()) {
            return Err(TaskStoreError::AlreadyExists {
                task_id: task.task_id.to_string(),
            });
        }
        tasks.insert(task.task_id.to_string(), task.clone());
        Ok(())
    }

    async fn get(&self, task_id: &TaskId) -> TaskStoreResult<Option<VideoTask>> {
        Ok(self.tasks.lock().await.get(task_id.as_str()).cloned())
    }

    async fn begin_processing(&self, task_id: &TaskId) -> TaskStoreResult<bool> {
        let mut tasks = self.tasks.lock().await;
        match tasks.get_mut(task_id.as_str()) {
            Some(task) if task.status == TaskStatus::Pending => {
                task.status = TaskStatus::Processing;
                task.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn set_analysis_result(
        &self,
        task_id: &TaskId,
        ranges: &[KeepRange],
    ) -> TaskStoreResult<()> {
        let mut tasks = self.tasks.lock().await;
        let task = tasks
            .get_mut(task_id.as_str())
            .ok_or_else(|| TaskStoreError::not_found(task_id.as_str()))?;
        task.analysis_result = Some(ranges.to_vec());
        task.updated_at = Utc::now();
        Ok(())
    }

    async fn complete(&self, task_id: &TaskId, processed_ref: &str) -> TaskStoreResult<()> {
        let mut tasks = self.tasks.lock().await;
        let task = tasks
            .get_mut(task_id.as_str())
            .ok_or_else(|| TaskStoreError::not_found(task_id.as_str()))?;

        if !task.status.can_transition_to(TaskStatus::Completed) {
            return Err(TaskStoreError::invalid_transition(
                task_id.as_str(),
                task.status.as_str(),
                "completed",
            ));
        }
        task.status = TaskStatus::Completed;
        task.processed_ref = Some(processed_ref.to_string());
        task.updated_at = Utc::now();
        Ok(())
    }

    async fn fail(&self, task_id: &TaskId) -> TaskStoreResult<()> {
        let mut tasks = self.tasks.lock().await;
        let task = tasks
            .get_mut(task_id.as_str())
            .ok_or_else(|| TaskStoreError::not_found(task_id.as_str()))?;

        if !task.status.can_transition_to(TaskStatus::Failed) {
            return Err(TaskStoreError::invalid_transition(
                task_id.as_str(),
                task.status.as_str(),
                "failed",
            ));
        }
        task.status = TaskStatus::Failed;
        task.updated_at = Utc::now();
        Ok(())
    }
}
