//! Upload and task status handlers.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::{info, warn};

use vtrim_models::{TaskId, TaskStatus, VideoTask};
use vtrim_queue::ProcessTaskJob;
use vtrim_storage::{keys, ObjectStore};
use vtrim_taskstore::TaskStore;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const ALLOWED_EXTENSIONS: &[&str] = &["mp4", "mov", "avi"];
const VIDEO_CONTENT_TYPE: &str = "video/mp4";

/// Response for a successful upload.
#[derive(Serialize)]
pub struct UploadResponse {
    pub task_id: TaskId,
    pub original_ref: String,
    pub status: TaskStatus,
}

/// Response for a status poll.
#[derive(Serialize)]
pub struct TaskStatusResponse {
    pub task_id: TaskId,
    pub status: TaskStatus,
    pub processed_ref: Option<String>,
}

fn extension_of(filename: &str) -> Option<String> {
    std::path::Path::new(filename)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
}

/// Accept a video upload, persist the blob and the task record, and
/// dispatch a processing job.
///
/// Processing is asynchronous: the response returns as soon as the
/// task is durable and enqueued, while the task is still `pending`.
pub async fn upload_video(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<UploadResponse>)> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .map(|n| n.to_string())
            .ok_or_else(|| ApiError::validation("Missing filename"))?;

        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read upload: {}", e)))?;

        upload = Some((filename, data.to_vec()));
        break;
    }

    let (filename, data) =
        upload.ok_or_else(|| ApiError::validation("Missing file field in upload"))?;

    let extension = extension_of(&filename)
        .ok_or_else(|| ApiError::validation("Filename has no extension"))?;
    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(ApiError::validation(format!(
            "Unsupported file type .{}; expected one of: {}",
            extension,
            ALLOWED_EXTENSIONS.join(", ")
        )));
    }

    if data.is_empty() {
        return Err(ApiError::validation("Uploaded file is empty"));
    }

    let task_id = TaskId::new();
    let original_ref = keys::source_key(&task_id, &filename);

    info!(
        task_id = %task_id,
        filename = %filename,
        size = data.len(),
        "Accepting video upload"
    );

    state
        .storage
        .put_bytes(&original_ref, data, VIDEO_CONTENT_TYPE)
        .await?;

    let task = VideoTask::new(task_id.clone(), &filename, &original_ref);
    state.tasks.create(&task).await?;

    let job = ProcessTaskJob::new(task_id.clone());
    if let Err(e) = state.queue.enqueue(job).await {
        // The record stays pending; an operator can re-dispatch it.
        warn!(task_id = %task_id, "Failed to enqueue processing job: {}", e);
        return Err(e.into());
    }

    Ok((
        StatusCode::ACCEPTED,
        Json(UploadResponse {
            task_id,
            original_ref,
            status: TaskStatus::Pending,
        }),
    ))
}

/// Poll the status of a task.
pub async fn get_task_status(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> ApiResult<Json<TaskStatusResponse>> {
    let task_id = TaskId::from(task_id);

    let task = state
        .tasks
        .get(&task_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Unknown task: {}", task_id)))?;

    Ok(Json(TaskStatusResponse {
        task_id: task.task_id,
        status: task.status,
        processed_ref: task.processed_ref,
    }))
}
