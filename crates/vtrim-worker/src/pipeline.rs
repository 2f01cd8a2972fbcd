//! Task processing pipeline.
//!
//! One task runs end to end on one worker: download the source,
//! extract audio, transcribe, decide keep-ranges, cut, upload the
//! trimmed result and finalize the record. Every run scratches inside
//! its own work directory, which is removed no matter how the run
//! ends.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{error, info, warn};

use vtrim_ai::{LlmAnalyzer, SegmentAnalyzer, Transcriber, WhisperApiClient};
use vtrim_media::{merge_keep_ranges, FfmpegMediaTool, MediaTool};
use vtrim_models::{KeepRange, TaskId, VideoTask};
use vtrim_storage::{processed_key, ObjectStore, S3ObjectStore};
use vtrim_taskstore::{RedisTaskStore, TaskStore};

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};

const VIDEO_CONTENT_TYPE: &str = "video/mp4";

/// Shared services for the pipeline.
///
/// Everything behind a trait object so tests can run the pipeline
/// against in-memory fakes.
pub struct ProcessingContext {
    pub config: WorkerConfig,
    pub tasks: Arc<dyn TaskStore>,
    pub storage: Arc<dyn ObjectStore>,
    pub transcriber: Arc<dyn Transcriber>,
    pub analyzer: Arc<dyn SegmentAnalyzer>,
    pub media: Arc<dyn MediaTool>,
}

impl ProcessingContext {
    /// Create a context wired to the real backing services.
    pub fn from_env(config: WorkerConfig) -> WorkerResult<Self> {
        let tasks = RedisTaskStore::from_env()?;
        let storage = S3ObjectStore::from_env()?;
        let transcriber = WhisperApiClient::from_env()
            .map_err(WorkerError::Transcription)?;
        let analyzer = LlmAnalyzer::from_env().map_err(WorkerError::Analysis)?;

        Ok(Self {
            config,
            tasks: Arc::new(tasks),
            storage: Arc::new(storage),
            transcriber: Arc::new(transcriber),
            analyzer: Arc::new(analyzer),
            media: Arc::new(FfmpegMediaTool::new()),
        })
    }
}

/// Run the pipeline for one task.
///
/// An unknown task ID is a logged no-op: the message may be stale or
/// the record was removed. A task that is not `pending` is skipped —
/// the claim is an atomic compare-and-swap, so a redelivered message
/// for a live or finished task does nothing.
pub async fn run_task(ctx: &ProcessingContext, task_id: &TaskId) -> WorkerResult<()> {
    let Some(task) = ctx.tasks.get(task_id).await? else {
        warn!(task_id = %task_id, "Ignoring job for unknown task");
        return Ok(());
    };

    if !ctx.tasks.begin_processing(task_id).await? {
        info!(
            task_id = %task_id,
            status = %task.status,
            "Task already claimed or finished, skipping"
        );
        return Ok(());
    }

    let work_dir = PathBuf::from(&ctx.config.work_dir).join(task_id.as_str());

    let result = execute(ctx, &task, &work_dir).await;

    match &result {
        Ok(processed_ref) => {
            if let Err(e) = ctx.tasks.complete(task_id, processed_ref).await {
                // The trimmed blob is uploaded; only the record is behind.
                error!(task_id = %task_id, "Failed to record completion: {}", e);
            } else {
                info!(task_id = %task_id, processed_ref = %processed_ref, "Task completed");
            }
        }
        Err(e) => {
            error!(task_id = %task_id, kind = e.kind(), "Task failed: {}", e);
            if let Err(fail_err) = ctx.tasks.fail(task_id).await {
                error!(task_id = %task_id, "Failed to record failure: {}", fail_err);
            }
        }
    }

    // Scratch files never outlive the run, success or not.
    if let Err(e) = tokio::fs::remove_dir_all(&work_dir).await {
        warn!(task_id = %task_id, "Failed to clean work dir: {}", e);
    }

    result.map(|_| ())
}

/// The fallible middle of the pipeline: everything between the claim
/// and the terminal status write, work directory setup included, so
/// any failure past the claim commits a `failed` status. Returns the
/// processed blob key.
async fn execute(
    ctx: &ProcessingContext,
    task: &VideoTask,
    work_dir: &Path,
) -> WorkerResult<String> {
    let task_id = &task.task_id;

    tokio::fs::create_dir_all(work_dir).await?;

    let source_path = work_dir.join(source_file_name(&task.filename));
    info!(task_id = %task_id, key = %task.original_ref, "Downloading source video");
    ctx.storage.get_to_file(&task.original_ref, &source_path).await?;

    let audio_path = work_dir.join("audio.wav");
    ctx.media.extract_audio(&source_path, &audio_path).await?;

    let segments = ctx
        .transcriber
        .transcribe(&audio_path)
        .await
        .map_err(WorkerError::Transcription)?;
    info!(task_id = %task_id, segments = segments.len(), "Transcription done");

    let ranges = match ctx.analyzer.analyze(&segments).await {
        Ok(ranges) => ranges,
        Err(e) => {
            // Analysis is advisory: fall back to keeping the whole
            // video rather than failing the task.
            warn!(task_id = %task_id, "Analysis failed, keeping full video: {}", e);
            full_keep_fallback(&segments)
        }
    };

    // Persist the decision before cutting so it survives a later
    // stage failure.
    if let Err(e) = ctx.tasks.set_analysis_result(task_id, &ranges).await {
        warn!(task_id = %task_id, "Failed to persist analysis result: {}", e);
    }

    let merged = merge_keep_ranges(&ranges);
    info!(
        task_id = %task_id,
        raw = ranges.len(),
        merged = merged.len(),
        "Keep-ranges normalized"
    );

    let output_path = work_dir.join("trimmed.mp4");
    ctx.media.cut_and_merge(&source_path, &output_path, &merged).await?;

    let processed_ref = processed_key(&task.filename);
    info!(task_id = %task_id, key = %processed_ref, "Uploading trimmed video");
    ctx.storage
        .put_file(&processed_ref, &output_path, VIDEO_CONTENT_TYPE)
        .await?;

    Ok(processed_ref)
}

/// Keep everything from zero to the end of the last segment. With no
/// segments there is nothing to anchor the range on, and the cut stage
/// rejects the empty list.
fn full_keep_fallback(segments: &[vtrim_models::TranscriptSegment]) -> Vec<KeepRange> {
    match segments.last() {
        Some(last) => vec![KeepRange::new(0.0, last.end)],
        None => Vec::new(),
    }
}

/// Scratch file name for the downloaded source, preserving the
/// client extension so FFmpeg picks the right demuxer.
fn source_file_name(filename: &str) -> String {
    let ext = Path::new(filename)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_else(|| "mp4".to_string());
    format!("source.{}", ext)
}
