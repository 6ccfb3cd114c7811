//! Waypoint Storage Library
//!
//! Object storage for re-hosted external images. Provides the `Storage`
//! trait plus S3-compatible (object_store) and local filesystem backends.
//!
//! # Storage key format
//!
//! Re-hosted images live under `cached/external/{uuid}.{ext}`. Keys must not
//! contain `..` or a leading `/`. Key generation is centralized in the
//! `keys` module so all backends stay consistent.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{ByteStream, Storage, StorageError, StorageResult};
pub use waypoint_core::StorageBackend;
