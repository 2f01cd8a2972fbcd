//! Application state.

use std::sync::Arc;

use vtrim_queue::TaskQueue;
use vtrim_storage::S3ObjectStore;
use vtrim_taskstore::RedisTaskStore;

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub storage: Arc<S3ObjectStore>,
    pub tasks: Arc<RedisTaskStore>,
    pub queue: Arc<TaskQueue>,
}

impl AppState {
    /// Create new application state from the environment.
    pub async fn new(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let storage = S3ObjectStore::from_env()?;
        let tasks = RedisTaskStore::from_env()?;
        let queue = TaskQueue::from_env()?;

        storage.check_connectivity().await?;
        queue.init().await?;

        Ok(Self {
            config,
            storage: Arc::new(storage),
            tasks: Arc::new(tasks),
            queue: Arc::new(queue),
        })
    }
}
