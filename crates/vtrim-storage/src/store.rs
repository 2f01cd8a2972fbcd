//! ObjectStore seam for the pipeline.

use std::path::Path;

use async_trait::async_trait;

use crate::error::StorageResult;

/// Content-addressable blob storage: put/get by key.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload raw bytes under `key`, returning the stored key.
    async fn put_bytes(&self, key: &str, data: Vec<u8>, content_type: &str)
        -> StorageResult<String>;

    /// Upload a local file under `key`, returning the stored key.
    async fn put_file(&self, key: &str, path: &Path, content_type: &str)
        -> StorageResult<String>;

    /// Download an object to a local file.
    async fn get_to_file(&self, key: &str, path: &Path) -> StorageResult<()>;

    /// Delete an object. Missing objects are not an error.
    async fn delete(&self, key: &str) -> StorageResult<()>;
}
