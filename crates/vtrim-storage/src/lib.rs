//! S3-compatible object storage for source and trimmed videos.
//!
//! This crate provides:
//! - The `ObjectStore` trait consumed by the pipeline
//! - An aws-sdk-s3 implementation targeting MinIO/R2 endpoints
//! - Object key conventions for source and processed blobs

pub mod client;
pub mod error;
pub mod keys;
pub mod store;

pub use client::{S3Config, S3ObjectStore};
pub use error::{StorageError, StorageResult};
pub use keys::{processed_key, source_key};
pub use store::ObjectStore;
