//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Object already exists: {0}")]
    AlreadyExists(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send>>;

/// Storage abstraction trait
///
/// All storage backends (S3, local filesystem) implement this trait so the
/// re-hosting pipeline never depends on a specific backend.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Store `data` under `storage_key`, failing with `AlreadyExists` instead
    /// of overwriting an existing object.
    async fn put_new(
        &self,
        storage_key: &str,
        data: Bytes,
        content_type: &str,
        cache_control: &str,
    ) -> StorageResult<()>;

    /// Download an object as a stream of chunks
    async fn download_stream(&self, storage_key: &str) -> StorageResult<ByteStream>;

    /// Check if an object exists
    async fn exists(&self, storage_key: &str) -> StorageResult<bool>;

    /// Cheap round trip to the backend, used by the health endpoint
    async fn health_check(&self) -> StorageResult<()>;

    /// Public URL prefix of stored objects, if the backend exposes them publicly
    fn public_base_url(&self) -> Option<String>;

    /// Public URL of a stored object
    fn public_url(&self, storage_key: &str) -> Option<String> {
        self.public_base_url()
            .map(|base| format!("{}/{}", base.trim_end_matches('/'), storage_key))
    }

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
