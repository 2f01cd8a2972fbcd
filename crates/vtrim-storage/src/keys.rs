//! Object key conventions.
//!
//! Keys are stored on the task record at creation time; the pipeline
//! never derives a key by parsing a URL.

use vtrim_models::TaskId;

/// Key for an uploaded source blob. Prefixed with the task ID so two
/// uploads with the same client filename never collide.
pub fn source_key(task_id: &TaskId, filename: &str) -> String {
    format!("{}_{}", task_id, filename)
}

/// Key for the trimmed output blob.
pub fn processed_key(filename: &str) -> String {
    format!("processed_{}", filename)
}
