//! Object store trait and shared types.
//!
//! The pipeline needs exactly two store operations: fetch one object and
//! store one object. The [`ObjectStore`] trait is the seam between the
//! pipeline and the backend, so tests swap in an in-memory double and the
//! binary picks [`S3Store`] or [`FsStore`] at start-up.
//!
//! Retries are not the pipeline's business: errors carry an
//! [`is_retriable`](StoreError::is_retriable) hint for the invoking runtime,
//! and each operation is attempted once.

pub mod fs;
pub mod s3;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

pub use fs::FsStore;
pub use s3::S3Store;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },
    #[error("access denied: {bucket}/{key}")]
    AccessDenied { bucket: String, key: String },
    #[error("transient store failure: {0}")]
    Transient(String),
    #[error("store failure: {0}")]
    Permanent(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Whether repeating the same request could succeed.
    pub fn is_retriable(&self) -> bool {
        match self {
            StoreError::Transient(_) => true,
            StoreError::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::Interrupted
                    | std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::WouldBlock
            ),
            _ => false,
        }
    }
}

/// A fetched object: its payload plus whatever content type the store knows.
#[derive(Debug, Clone)]
pub struct FetchedObject {
    pub body: Bytes,
    pub content_type: Option<String>,
}

/// Bucket + key addressed object storage.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Download one object.
    async fn fetch(&self, bucket: &str, key: &str) -> Result<FetchedObject, StoreError>;

    /// Upload one object, overwriting any existing object at the same key.
    async fn store(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> Result<(), StoreError>;
}
