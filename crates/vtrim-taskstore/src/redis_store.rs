//! Redis-backed task store.
//!
//! Each task is one Redis hash (`vtrim:task:{id}`). Field updates are
//! single HSET calls; status transitions run as Lua scripts so the
//! check-then-write is atomic — that is what makes the
//! `pending -> processing` claim safe under duplicate dispatch.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::Script;
use tracing::debug;

use vtrim_models::{KeepRange, TaskId, TaskStatus, VideoTask};

use crate::error::{TaskStoreError, TaskStoreResult};
use crate::store::TaskStore;

const CREATE_SCRIPT: &str = r#"
if redis.call('EXISTS', KEYS[1]) == 1 then
  return 0
end
redis.call('HSET', KEYS[1],
  'filename', ARGV[1],
  'original_ref', ARGV[2],
  'status', ARGV[3],
  'created_at', ARGV[4],
  'updated_at', ARGV[4])
return 1
"#;

const BEGIN_PROCESSING_SCRIPT: &str = r#"
local status = redis.call('HGET', KEYS[1], 'status')
if status == 'pending' then
  redis.call('HSET', KEYS[1], 'status', 'processing', 'updated_at', ARGV[1])
  return 1
end
return 0
"#;

const COMPLETE_SCRIPT: &str = r#"
local status = redis.call('HGET', KEYS[1], 'status')
if status == 'processing' then
  redis.call('HSET', KEYS[1],
    'status', 'completed',
    'processed_ref', ARGV[1],
    'updated_at', ARGV[2])
  return 1
end
return 0
"#;

const FAIL_SCRIPT: &str = r#"
local status = redis.call('HGET', KEYS[1], 'status')
if status == 'processing' then
  redis.call('HSET', KEYS[1], 'status', 'failed', 'updated_at', ARGV[1])
  return 1
end
return 0
"#;

/// Task store backed by Redis hashes.
pub struct RedisTaskStore {
    client: redis::Client,
}

impl RedisTaskStore {
    /// Create a new store from a Redis URL.
    pub fn new(redis_url: &str) -> TaskStoreResult<Self> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self { client })
    }

    /// Create from the `REDIS_URL` environment variable.
    pub fn from_env() -> TaskStoreResult<Self> {
        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
        Self::new(&redis_url)
    }

    fn task_key(task_id: &TaskId) -> String {
        format!("vtrim:task:{}", task_id)
    }

    async fn current_status(&self, task_id: &TaskId) -> TaskStoreResult<String> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let status: Option<String> = redis::cmd("HGET")
            .arg(Self::task_key(task_id))
            .arg("status")
            .query_async(&mut conn)
            .await?;
        status.ok_or_else(|| TaskStoreError::not_found(task_id.as_str()))
    }
}

#[async_trait]
impl TaskStore for RedisTaskStore {
    async fn create(&self, task: &VideoTask) -> TaskStoreResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let created: i64 = Script::new(CREATE_SCRIPT)
            .key(Self::task_key(&task.task_id))
            .arg(&task.filename)
            .arg(&task.original_ref)
            .arg(task.status.as_str())
            .arg(task.created_at.to_rfc3339())
            .invoke_async(&mut conn)
            .await?;

        if created == 0 {
            return Err(TaskStoreError::AlreadyExists {
                task_id: task.task_id.to_string(),
            });
        }

        debug!(task_id = %task.task_id, "Created task record");
        Ok(())
    }

    async fn get(&self, task_id: &TaskId) -> TaskStoreResult<Option<VideoTask>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let fields: std::collections::HashMap<String, String> = redis::cmd("HGETALL")
            .arg(Self::task_key(task_id))
            .query_async(&mut conn)
            .await?;

        if fields.is_empty() {
            return Ok(None);
        }

        Ok(Some(parse_task(task_id.clone(), &fields)?))
    }

    async fn begin_processing(&self, task_id: &TaskId) -> TaskStoreResult<bool> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let claimed: i64 = Script::new(BEGIN_PROCESSING_SCRIPT)
            .key(Self::task_key(task_id))
            .arg(Utc::now().to_rfc3339())
            .invoke_async(&mut conn)
            .await?;

        Ok(claimed == 1)
    }

    async fn set_analysis_result(
        &self,
        task_id: &TaskId,
        ranges: &[KeepRange],
    ) -> TaskStoreResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let json = serde_json::to_string(ranges)?;
        redis::cmd("HSET")
            .arg(Self::task_key(task_id))
            .arg("analysis_result")
            .arg(json)
            .arg("updated_at")
            .arg(Utc::now().to_rfc3339())
            .query_async::<()>(&mut conn)
            .await?;

        Ok(())
    }

    async fn complete(&self, task_id: &TaskId, processed_ref: &str) -> TaskStoreResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let done: i64 = Script::new(COMPLETE_SCRIPT)
            .key(Self::task_key(task_id))
            .arg(processed_ref)
            .arg(Utc::now().to_rfc3339())
            .invoke_async(&mut conn)
            .await?;

        if done == 0 {
            let from = self.current_status(task_id).await?;
            return Err(TaskStoreError::invalid_transition(
                task_id.as_str(),
                from,
                "completed",
            ));
        }
        Ok(())
    }

    async fn fail(&self, task_id: &TaskId) -> TaskStoreResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let done: i64 = Script::new(FAIL_SCRIPT)
            .key(Self::task_key(task_id))
            .arg(Utc::now().to_rfc3339())
            .invoke_async(&mut conn)
            .await?;

        if done == 0 {
            let from = self.current_status(task_id).await?;
            return Err(TaskStoreError::invalid_transition(
                task_id.as_str(),
                from,
                "failed",
            ));
        }
        Ok(())
    }
}

fn parse_task(
    task_id: TaskId,
    fields: &std::collections::HashMap<String, String>,
) -> TaskStoreResult<VideoTask> {
    let get = |name: &str| -> TaskStoreResult<&String> {
        fields
            .get(name)
            .ok_or_else(|| TaskStoreError::corrupt(format!("missing field '{}'", name)))
    };

    let status: TaskStatus = get("status")?
        .parse()
        .map_err(|e| TaskStoreError::corrupt(format!("{}", e)))?;

    let analysis_result = match fields.get("analysis_result") {
        Some(json) => Some(serde_json::from_str::<Vec<KeepRange>>(json)?),
        None => None,
    };

    let parse_time = |raw: &str| -> TaskStoreResult<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(raw)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| TaskStoreError::corrupt(format!("bad timestamp: {}", e)))
    };

    Ok(VideoTask {
        task_id,
        filename: get("filename")?.clone(),
        original_ref: get("original_ref")?.clone(),
        processed_ref: fields.get("processed_ref").cloned(),
        status,
        analysis_result,
        created_at: parse_time(get("created_at")?)?,
        updated_at: parse_time(get("updated_at")?)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_task_roundtrip() {
        let mut fields = std::collections::HashMap::new();
        fields.insert("filename".to_string(), "talk.mp4".to_string());
        fields.insert("original_ref".to_string(), "t-1_talk.mp4".to_string());
        fields.insert("status".to_string(), "processing".to_string());
        fields.insert("analysis_result".to_string(), "[[2.0,9.0]]".to_string());
        fields.insert("created_at".to_string(), Utc::now().to_rfc3339());
        fields.insert("updated_at".to_string(), Utc::now().to_rfc3339());

        let task = parse_task(TaskId::from("t-1"), &fields).unwrap();
        assert_eq!(task.status, TaskStatus::Processing);
        assert_eq!(task.analysis_result, Some(vec![KeepRange::new(2.0, 9.0)]));
        assert!(task.processed_ref.is_none());
    }

    #[test]
    fn test_parse_task_rejects_unknown_status() {
        let mut fields = std::collections::HashMap::new();
        fields.insert("filename".to_string(), "talk.mp4".to_string());
        fields.insert("original_ref".to_string(), "k".to_string());
        fields.insert("status".to_string(), "melted".to_string());
        fields.insert("created_at".to_string(), Utc::now().to_rfc3339());
        fields.insert("updated_at".to_string(), Utc::now().to_rfc3339());

        assert!(parse_task(TaskId::from("t-1"), &fields).is_err());
    }
}
