//! Speech-to-text and segment-analysis service clients.
//!
//! This crate provides:
//! - `Transcriber`: audio file -> ordered transcript segments, backed
//!   by an OpenAI-compatible transcription endpoint
//! - `SegmentAnalyzer`: transcript segments -> keep-ranges, backed by
//!   an OpenAI-compatible chat completion endpoint

pub mod analyzer;
pub mod error;
pub mod transcriber;

pub use analyzer::{LlmAnalyzer, SegmentAnalyzer};
pub use error::{AiError, AiResult};
pub use transcriber::{Transcriber, WhisperApiClient};
