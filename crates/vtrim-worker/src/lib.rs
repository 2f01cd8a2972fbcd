//! Video trimming worker.
//!
//! Consumes processing jobs from the queue and runs the pipeline:
//! download, audio extraction, transcription, keep-range analysis,
//! cutting and upload, with the task record updated at each durable
//! point.

pub mod config;
pub mod error;
pub mod executor;
pub mod pipeline;

pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use executor::JobExecutor;
pub use pipeline::{run_task, ProcessingContext};
