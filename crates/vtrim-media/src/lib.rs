//! FFmpeg CLI wrapper for the vtrim pipeline.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building
//! - Audio extraction (mono, 16 kHz) for transcription
//! - Keep-range cutting and concatenation
//! - The pure keep-range merge algorithm

pub mod audio;
pub mod command;
pub mod cut;
pub mod error;
pub mod media_tool;
pub mod merge;

pub use audio::extract_audio;
pub use command::{check_ffmpeg, FfmpegCommand};
pub use cut::cut_and_merge;
pub use error::{MediaError, MediaResult};
pub use media_tool::{FfmpegMediaTool, MediaTool};
pub use merge::merge_keep_ranges;
