//! Shared data models for the vtrim backend.
//!
//! This crate provides Serde-serializable types for:
//! - Video tasks and their status state machine
//! - Transcript segments and keep-ranges

pub mod segment;
pub mod task;

pub use segment::{KeepRange, TranscriptSegment};
pub use task::{TaskId, TaskStatus, VideoTask};
