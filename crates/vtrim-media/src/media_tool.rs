//! MediaTool seam for the pipeline.
//!
//! The orchestrator depends on this trait rather than on FFmpeg
//! directly, so tests can substitute a fake that materializes files
//! without invoking a codec.

use std::path::Path;

use async_trait::async_trait;

use vtrim_models::KeepRange;

use crate::error::MediaResult;

/// Media encode/decode capability: extract audio and cut-by-ranges.
#[async_trait]
pub trait MediaTool: Send + Sync {
    /// Extract the audio track as mono 16 kHz WAV.
    async fn extract_audio(&self, video_path: &Path, audio_path: &Path) -> MediaResult<()>;

    /// Cut the video to the given non-overlapping, ordered keep-ranges
    /// and concatenate the pieces into `output_path`.
    async fn cut_and_merge(
        &self,
        video_path: &Path,
        output_path: &Path,
        ranges: &[KeepRange],
    ) -> MediaResult<()>;
}

/// FFmpeg-backed implementation.
#[derive(Debug, Clone, Default)]
pub struct FfmpegMediaTool;

impl FfmpegMediaTool {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MediaTool for FfmpegMediaTool {
    async fn extract_audio(&self, video_path: &Path, audio_path: &Path) -> MediaResult<()> {
        crate::audio::extract_audio(video_path, audio_path).await
    }

    async fn cut_and_merge(
        &self,
        video_path: &Path,
        output_path: &Path,
        ranges: &[KeepRange],
    ) -> MediaResult<()> {
        crate::cut::cut_and_merge(video_path, output_path, ranges).await
    }
}
