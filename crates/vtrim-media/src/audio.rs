//! Audio extraction for transcription.

use std::path::Path;

use tracing::info;

use crate::command::FfmpegCommand;
use crate::error::{MediaError, MediaResult};

/// Extract the audio track from a video as mono 16 kHz WAV.
///
/// The fixed mono/16 kHz target bounds transcription cost and upload
/// bandwidth regardless of the source format.
pub async fn extract_audio(video_path: &Path, audio_path: &Path) -> MediaResult<()> {
    if !video_path.exists() {
        return Err(MediaError::FileNotFound(video_path.to_path_buf()));
    }

    info!(
        input = %video_path.display(),
        output = %audio_path.display(),
        "Extracting audio track"
    );

    FfmpegCommand::new(video_path, audio_path)
        .no_video()
        .output_args(["-ac", "1", "-ar", "16000"])
        .audio_codec("pcm_s16le")
        .run()
        .await
}
