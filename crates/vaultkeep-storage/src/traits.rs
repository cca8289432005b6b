//! Storage abstraction trait
//!
//! This module defines the trait the backup pipeline and retention manager
//! program against, keeping them independent of the concrete bucket backend.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("List failed: {0}")]
    ListFailed(String),

    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Metadata view of one stored object, as returned by a listing.
#[derive(Debug, Clone)]
pub struct RemoteObject {
    /// Object key, unique within the bucket.
    pub name: String,
    /// Remote last-modified timestamp; the retention ordering key.
    pub last_modified: DateTime<Utc>,
    /// Object size in bytes.
    pub size: u64,
}

/// Narrow storage-client capability consumed by the backup core.
///
/// Callers time-box these operations with `tokio::time::timeout`; dropping the
/// returned future cancels the in-flight request.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Upload the local file at `path` under its file name as key and return
    /// the public download URL.
    async fn upload(&self, path: &Path) -> StorageResult<String>;

    /// Delete the object with the given key.
    async fn delete(&self, name: &str) -> StorageResult<()>;

    /// List all objects whose key starts with `prefix`, with metadata.
    /// No ordering is guaranteed.
    async fn list_with_metadata(&self, prefix: &str) -> StorageResult<Vec<RemoteObject>>;

    /// The public download URL an object with this name is served from.
    fn public_url(&self, name: &str) -> String;
}
