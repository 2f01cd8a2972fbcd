//! End-to-end pipeline behavior against in-memory fakes.
//!
//! Exercises the lifecycle guarantees: monotonic status transitions,
//! `processed_ref` set only on completion, the full-keep fallback when
//! analysis fails, single-flight redelivery handling, and work
//! directory cleanup on every outcome.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use vtrim_ai::{AiError, AiResult, SegmentAnalyzer, Transcriber};
use vtrim_media::{MediaError, MediaResult, MediaTool};
use vtrim_models::{KeepRange, TaskId, TaskStatus, TranscriptSegment, VideoTask};
use vtrim_storage::{ObjectStore, StorageError, StorageResult};
use vtrim_taskstore::{MemoryTaskStore, TaskStore};
use vtrim_worker::{run_task, ProcessingContext, WorkerConfig};

#[derive(Default)]
struct FakeStorage {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    fail_uploads: bool,
}

impl FakeStorage {
    fn with_object(key: &str, data: &[u8]) -> Self {
        let mut objects = HashMap::new();
        objects.insert(key.to_string(), data.to_vec());
        Self {
            objects: Mutex::new(objects),
            fail_uploads: false,
        }
    }

    async fn has_object(&self, key: &str) -> bool {
        self.objects.lock().await.contains_key(key)
    }
}

#[async_trait]
impl ObjectStore for FakeStorage {
    async fn put_bytes(&self, key: &str, data: Vec<u8>, _content_type: &str) -> StorageResult<String> {
        if self.fail_uploads {
            return Err(StorageError::upload_failed("bucket unavailable"));
        }
        self.objects.lock().await.insert(key.to_string(), data);
        Ok(key.to_string())
    }

    async fn put_file(&self, key: &str, path: &Path, content_type: &str) -> StorageResult<String> {
        let data = tokio::fs::read(path).await?;
        self.put_bytes(key, data, content_type).await
    }

    async fn get_to_file(&self, key: &str, path: &Path) -> StorageResult<()> {
        let objects = self.objects.lock().await;
        let data = objects
            .get(key)
            .ok_or_else(|| StorageError::not_found(key))?;
        tokio::fs::write(path, data).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.objects.lock().await.remove(key);
        Ok(())
    }
}

struct FakeTranscriber {
    segments: Vec<TranscriptSegment>,
    fail: bool,
}

#[async_trait]
impl Transcriber for FakeTranscriber {
    async fn transcribe(&self, _audio_path: &Path) -> AiResult<Vec<TranscriptSegment>> {
        if self.fail {
            return Err(AiError::Status {
                status: 500,
                body: "model overloaded".to_string(),
            });
        }
        Ok(self.segments.clone())
    }
}

struct FakeAnalyzer {
    /// `None` simulates an analysis failure.
    ranges: Option<Vec<KeepRange>>,
}

#[async_trait]
impl SegmentAnalyzer for FakeAnalyzer {
    async fn analyze(&self, _segments: &[TranscriptSegment]) -> AiResult<Vec<KeepRange>> {
        match &self.ranges {
            Some(ranges) => Ok(ranges.clone()),
            None => Err(AiError::Status {
                status: 429,
                body: "rate limited".to_string(),
            }),
        }
    }
}

#[derive(Default)]
struct FakeMedia {
    fail_cut: bool,
    cut_calls: AtomicUsize,
    last_ranges: Mutex<Option<Vec<KeepRange>>>,
}

#[async_trait]
impl MediaTool for FakeMedia {
    async fn extract_audio(&self, _video_path: &Path, audio_path: &Path) -> MediaResult<()> {
        tokio::fs::write(audio_path, b"RIFF....WAVE").await?;
        Ok(())
    }

    async fn cut_and_merge(
        &self,
        _video_path: &Path,
        output_path: &Path,
        ranges: &[KeepRange],
    ) -> MediaResult<()> {
        self.cut_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_ranges.lock().await = Some(ranges.to_vec());

        if ranges.is_empty() {
            return Err(MediaError::NoRangesToKeep);
        }
        if self.fail_cut {
            return Err(MediaError::ffmpeg_failed("boom", None, Some(1)));
        }
        tokio::fs::write(output_path, b"trimmed").await?;
        Ok(())
    }
}

struct Harness {
    ctx: ProcessingContext,
    tasks: Arc<MemoryTaskStore>,
    storage: Arc<FakeStorage>,
    media: Arc<FakeMedia>,
    work_root: tempfile::TempDir,
    task_id: TaskId,
}

impl Harness {
    fn work_dir(&self) -> PathBuf {
        self.work_root.path().join(self.task_id.as_str())
    }
}

async fn harness(
    storage: FakeStorage,
    transcriber: FakeTranscriber,
    analyzer: FakeAnalyzer,
    media: FakeMedia,
) -> Harness {
    let work_root = tempfile::tempdir().unwrap();
    let config = WorkerConfig {
        work_dir: work_root.path().to_string_lossy().to_string(),
        ..Default::default()
    };

    let tasks = Arc::new(MemoryTaskStore::new());
    let storage = Arc::new(storage);
    let media = Arc::new(media);

    let task_id = TaskId::from("task-1");
    let task = VideoTask::new(task_id.clone(), "talk.mp4", "task-1_talk.mp4");
    tasks.create(&task).await.unwrap();

    let ctx = ProcessingContext {
        config,
        tasks: tasks.clone(),
        storage: storage.clone(),
        transcriber: Arc::new(transcriber),
        analyzer: Arc::new(analyzer),
        media: media.clone(),
    };

    Harness {
        ctx,
        tasks,
        storage,
        media,
        work_root,
        task_id,
    }
}

fn segments() -> Vec<TranscriptSegment> {
    vec![
        TranscriptSegment::new(0.0, 2.0, "uh well"),
        TranscriptSegment::new(2.0, 9.0, "actual content"),
        TranscriptSegment::new(9.0, 42.0, "more content"),
    ]
}

#[tokio::test]
async fn test_successful_run_completes_task() {
    let h = harness(
        FakeStorage::with_object("task-1_talk.mp4", b"video"),
        FakeTranscriber {
            segments: segments(),
            fail: false,
        },
        FakeAnalyzer {
            ranges: Some(vec![KeepRange::new(2.0, 9.0)]),
        },
        FakeMedia::default(),
    )
    .await;

    run_task(&h.ctx, &h.task_id).await.unwrap();

    let task = h.tasks.snapshot(&h.task_id).await.unwrap();
    assert_eq!(task.status, TaskStatus::Completed);
    assert_eq!(task.processed_ref.as_deref(), Some("processed_talk.mp4"));
    assert_eq!(task.analysis_result, Some(vec![KeepRange::new(2.0, 9.0)]));

    assert!(h.storage.has_object("processed_talk.mp4").await);
    assert!(!h.work_dir().exists());
}

#[tokio::test]
async fn test_overlapping_ranges_are_normalized_before_cutting() {
    let h = harness(
        FakeStorage::with_object("task-1_talk.mp4", b"video"),
        FakeTranscriber {
            segments: segments(),
            fail: false,
        },
        FakeAnalyzer {
            ranges: Some(vec![
                KeepRange::new(12.0, 15.0),
                KeepRange::new(0.0, 5.0),
                KeepRange::new(4.0, 9.0),
            ]),
        },
        FakeMedia::default(),
    )
    .await;

    run_task(&h.ctx, &h.task_id).await.unwrap();

    let cut_ranges = h.media.last_ranges.lock().await.clone().unwrap();
    assert_eq!(
        cut_ranges,
        vec![KeepRange::new(0.0, 9.0), KeepRange::new(12.0, 15.0)]
    );
}

#[tokio::test]
async fn test_analysis_failure_keeps_full_video() {
    let h = harness(
        FakeStorage::with_object("task-1_talk.mp4", b"video"),
        FakeTranscriber {
            segments: segments(),
            fail: false,
        },
        FakeAnalyzer { ranges: None },
        FakeMedia::default(),
    )
    .await;

    run_task(&h.ctx, &h.task_id).await.unwrap();

    let task = h.tasks.snapshot(&h.task_id).await.unwrap();
    assert_eq!(task.status, TaskStatus::Completed);
    assert_eq!(task.analysis_result, Some(vec![KeepRange::new(0.0, 42.0)]));

    let cut_ranges = h.media.last_ranges.lock().await.clone().unwrap();
    assert_eq!(cut_ranges, vec![KeepRange::new(0.0, 42.0)]);
}

#[tokio::test]
async fn test_transcription_failure_fails_task() {
    let h = harness(
        FakeStorage::with_object("task-1_talk.mp4", b"video"),
        FakeTranscriber {
            segments: Vec::new(),
            fail: true,
        },
        FakeAnalyzer {
            ranges: Some(vec![KeepRange::new(0.0, 1.0)]),
        },
        FakeMedia::default(),
    )
    .await;

    let err = run_task(&h.ctx, &h.task_id).await.unwrap_err();
    assert_eq!(err.kind(), "transcription");

    let task = h.tasks.snapshot(&h.task_id).await.unwrap();
    assert_eq!(task.status, TaskStatus::Failed);
    assert!(task.processed_ref.is_none());
    assert_eq!(h.media.cut_calls.load(Ordering::SeqCst), 0);
    assert!(!h.work_dir().exists());
}

#[tokio::test]
async fn test_missing_source_fails_task() {
    let h = harness(
        FakeStorage::default(),
        FakeTranscriber {
            segments: segments(),
            fail: false,
        },
        FakeAnalyzer {
            ranges: Some(vec![KeepRange::new(0.0, 1.0)]),
        },
        FakeMedia::default(),
    )
    .await;

    let err = run_task(&h.ctx, &h.task_id).await.unwrap_err();
    assert_eq!(err.kind(), "storage");

    let task = h.tasks.snapshot(&h.task_id).await.unwrap();
    assert_eq!(task.status, TaskStatus::Failed);
    assert!(task.processed_ref.is_none());
    assert!(!h.work_dir().exists());
}

#[tokio::test]
async fn test_cut_failure_fails_task_but_keeps_analysis_result() {
    let h = harness(
        FakeStorage::with_object("task-1_talk.mp4", b"video"),
        FakeTranscriber {
            segments: segments(),
            fail: false,
        },
        FakeAnalyzer {
            ranges: Some(vec![KeepRange::new(2.0, 9.0)]),
        },
        FakeMedia {
            fail_cut: true,
            ..Default::default()
        },
    )
    .await;

    let err = run_task(&h.ctx, &h.task_id).await.unwrap_err();
    assert_eq!(err.kind(), "media");

    let task = h.tasks.snapshot(&h.task_id).await.unwrap();
    assert_eq!(task.status, TaskStatus::Failed);
    assert!(task.processed_ref.is_none());
    // The decision survives the downstream failure
    assert_eq!(task.analysis_result, Some(vec![KeepRange::new(2.0, 9.0)]));
    assert!(!h.work_dir().exists());
}

#[tokio::test]
async fn test_upload_failure_fails_task() {
    let h = harness(
        FakeStorage {
            objects: Mutex::new(HashMap::from([(
                "task-1_talk.mp4".to_string(),
                b"video".to_vec(),
            )])),
            fail_uploads: true,
        },
        FakeTranscriber {
            segments: segments(),
            fail: false,
        },
        FakeAnalyzer {
            ranges: Some(vec![KeepRange::new(2.0, 9.0)]),
        },
        FakeMedia::default(),
    )
    .await;

    let err = run_task(&h.ctx, &h.task_id).await.unwrap_err();
    assert_eq!(err.kind(), "storage");

    let task = h.tasks.snapshot(&h.task_id).await.unwrap();
    assert_eq!(task.status, TaskStatus::Failed);
    assert!(task.processed_ref.is_none());
    assert!(!h.work_dir().exists());
}

#[tokio::test]
async fn test_empty_transcript_with_failed_analysis_fails_task() {
    // No segments means the fallback has nothing to anchor on; the cut
    // stage rejects the empty range list rather than keeping nothing.
    let h = harness(
        FakeStorage::with_object("task-1_talk.mp4", b"video"),
        FakeTranscriber {
            segments: Vec::new(),
            fail: false,
        },
        FakeAnalyzer { ranges: None },
        FakeMedia::default(),
    )
    .await;

    let err = run_task(&h.ctx, &h.task_id).await.unwrap_err();
    assert_eq!(err.kind(), "media");

    let task = h.tasks.snapshot(&h.task_id).await.unwrap();
    assert_eq!(task.status, TaskStatus::Failed);
}

#[tokio::test]
async fn test_unknown_task_is_logged_noop() {
    let h = harness(
        FakeStorage::default(),
        FakeTranscriber {
            segments: Vec::new(),
            fail: false,
        },
        FakeAnalyzer { ranges: None },
        FakeMedia::default(),
    )
    .await;

    run_task(&h.ctx, &TaskId::from("ghost")).await.unwrap();
    assert_eq!(h.media.cut_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_redelivery_after_completion_is_skipped() {
    let h = harness(
        FakeStorage::with_object("task-1_talk.mp4", b"video"),
        FakeTranscriber {
            segments: segments(),
            fail: false,
        },
        FakeAnalyzer {
            ranges: Some(vec![KeepRange::new(2.0, 9.0)]),
        },
        FakeMedia::default(),
    )
    .await;

    run_task(&h.ctx, &h.task_id).await.unwrap();
    // Redelivered message for the same task: claim loses, no rerun
    run_task(&h.ctx, &h.task_id).await.unwrap();

    assert_eq!(h.media.cut_calls.load(Ordering::SeqCst), 1);
    let task = h.tasks.snapshot(&h.task_id).await.unwrap();
    assert_eq!(task.status, TaskStatus::Completed);
}

#[tokio::test]
async fn test_work_dir_setup_failure_fails_task() {
    // A claimed task whose scratch directory cannot be created must
    // still reach a terminal state; otherwise it sits in `processing`
    // forever and redelivery cannot recover it.
    let mut h = harness(
        FakeStorage::with_object("task-1_talk.mp4", b"video"),
        FakeTranscriber {
            segments: segments(),
            fail: false,
        },
        FakeAnalyzer {
            ranges: Some(vec![KeepRange::new(2.0, 9.0)]),
        },
        FakeMedia::default(),
    )
    .await;

    // A regular file where the work root should be makes
    // create_dir_all fail for every task under it
    let blocked = h.work_root.path().join("blocked");
    tokio::fs::write(&blocked, b"not a directory").await.unwrap();
    h.ctx.config.work_dir = blocked.to_string_lossy().to_string();

    let err = run_task(&h.ctx, &h.task_id).await.unwrap_err();
    assert_eq!(err.kind(), "io");

    let task = h.tasks.snapshot(&h.task_id).await.unwrap();
    assert_eq!(task.status, TaskStatus::Failed);
    assert!(task.processed_ref.is_none());

    // Redelivery observes the terminal state and skips
    run_task(&h.ctx, &h.task_id).await.unwrap();
    let task = h.tasks.snapshot(&h.task_id).await.unwrap();
    assert_eq!(task.status, TaskStatus::Failed);
    assert_eq!(h.media.cut_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_concurrent_runs_execute_pipeline_once() {
    let h = harness(
        FakeStorage::with_object("task-1_talk.mp4", b"video"),
        FakeTranscriber {
            segments: segments(),
            fail: false,
        },
        FakeAnalyzer {
            ranges: Some(vec![KeepRange::new(2.0, 9.0)]),
        },
        FakeMedia::default(),
    )
    .await;

    let Harness {
        ctx,
        tasks,
        media,
        task_id,
        work_root: _work_root,
        ..
    } = h;
    let ctx = Arc::new(ctx);

    // Two deliveries race for the same pending task; the claim is a
    // compare-and-swap, so exactly one runs the pipeline
    let a = tokio::spawn({
        let ctx = Arc::clone(&ctx);
        let task_id = task_id.clone();
        async move { run_task(&ctx, &task_id).await }
    });
    let b = tokio::spawn({
        let ctx = Arc::clone(&ctx);
        let task_id = task_id.clone();
        async move { run_task(&ctx, &task_id).await }
    });

    a.await.unwrap().unwrap();
    b.await.unwrap().unwrap();

    assert_eq!(media.cut_calls.load(Ordering::SeqCst), 1);
    let task = tasks.snapshot(&task_id).await.unwrap();
    assert_eq!(task.status, TaskStatus::Completed);
    assert_eq!(task.processed_ref.as_deref(), Some("processed_talk.mp4"));
}

#[tokio::test]
async fn test_redelivery_after_failure_stays_failed() {
    let h = harness(
        FakeStorage::with_object("task-1_talk.mp4", b"video"),
        FakeTranscriber {
            segments: Vec::new(),
            fail: true,
        },
        FakeAnalyzer { ranges: None },
        FakeMedia::default(),
    )
    .await;

    assert!(run_task(&h.ctx, &h.task_id).await.is_err());
    // Terminal states are final under the same task ID
    run_task(&h.ctx, &h.task_id).await.unwrap();

    let task = h.tasks.snapshot(&h.task_id).await.unwrap();
    assert_eq!(task.status, TaskStatus::Failed);
}
