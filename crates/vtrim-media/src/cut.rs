//! Cut a video down to its keep-ranges and concatenate the result.
//!
//! # Strategy
//!
//! Segment extraction + concat demuxer:
//! 1. Extract each keep-range to a temporary file, re-encoding for
//!    frame-accurate cuts (stream copy can't cut between keyframes).
//! 2. Concatenate the segment files with the concat demuxer using
//!    stream copy, so the join itself adds no generation loss.
//!
//! Seeking is two-pass: a fast input seek lands near the range start on
//! a keyframe, then an accurate output seek covers the remainder. This
//! avoids the duplicate frames that input-seek stream copy produces.

use std::path::Path;

use tracing::{debug, info};

use vtrim_models::KeepRange;

use crate::command::FfmpegCommand;
use crate::error::{MediaError, MediaResult};

/// Cut `input_path` down to `ranges` and write the concatenated result
/// to `output_path`.
///
/// `ranges` must be non-overlapping and ordered by start ascending —
/// run them through [`crate::merge_keep_ranges`] first. The concat
/// demuxer emits segments in list order, which is what makes the output
/// ordering deterministic.
pub async fn cut_and_merge(
    input_path: &Path,
    output_path: &Path,
    ranges: &[KeepRange],
) -> MediaResult<()> {
    if ranges.is_empty() {
        return Err(MediaError::NoRangesToKeep);
    }
    if !input_path.exists() {
        return Err(MediaError::FileNotFound(input_path.to_path_buf()));
    }

    info!(
        input = %input_path.display(),
        output = %output_path.display(),
        segments = ranges.len(),
        "Cutting video to keep-ranges"
    );

    let temp_dir = tempfile::tempdir()?;
    let mut segment_paths = Vec::with_capacity(ranges.len());

    for (i, range) in ranges.iter().enumerate() {
        let seg_path = temp_dir.path().join(format!("seg_{:04}.mp4", i));

        // Fast seek to within 5 seconds of the range, then accurate seek
        let fast_seek = if range.start > 5.0 { range.start - 5.0 } else { 0.0 };
        let accurate_seek = range.start - fast_seek;

        debug!(
            segment = i,
            start = range.start,
            duration = range.duration(),
            "Extracting segment"
        );

        FfmpegCommand::new(input_path, &seg_path)
            .seek(fast_seek)
            .output_arg("-ss")
            .output_arg(format!("{:.3}", accurate_seek))
            .duration(range.duration())
            .video_codec("libx264")
            .output_args(["-preset", "veryfast", "-crf", "20"])
            .audio_codec("aac")
            .output_args(["-b:a", "128k"])
            .output_args(["-avoid_negative_ts", "make_zero"])
            .run()
            .await
            .map_err(|e| match e {
                MediaError::FfmpegFailed { message, stderr, exit_code } => {
                    MediaError::FfmpegFailed {
                        message: format!("segment {} extraction failed: {}", i, message),
                        stderr,
                        exit_code,
                    }
                }
                other => other,
            })?;

        segment_paths.push(seg_path);
    }

    // Concat list for the demuxer
    let concat_list = temp_dir.path().join("concat.txt");
    let list_content: String = segment_paths
        .iter()
        .map(|p| format!("file '{}'\n", p.display()))
        .collect();
    tokio::fs::write(&concat_list, &list_content).await?;

    FfmpegCommand::new(&concat_list, output_path)
        .input_arg("-f")
        .input_arg("concat")
        .input_arg("-safe")
        .input_arg("0")
        .output_args(["-c", "copy", "-movflags", "+faststart"])
        .run()
        .await?;

    info!(segments = ranges.len(), "Cut and concat completed");

    // temp_dir and segment files are removed when dropped
    Ok(())
}
