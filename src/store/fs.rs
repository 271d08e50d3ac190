//! Local filesystem store: one directory per bucket under a root.
//!
//! ```text
//! root/
//! ├── photos/
//! │   └── sunset.jpg
//! └── photos-resized/
//!     ├── 120_sunset.jpg
//!     └── 512_sunset.jpg
//! ```
//!
//! Keys may contain `/`; intermediate directories are created on store.
//! Content types are not persisted, so `fetch` reports none and the pipeline
//! falls back to the type derived from the key.

use super::{FetchedObject, ObjectStore, StoreError};
use async_trait::async_trait;
use bytes::Bytes;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve `bucket/key` under the root, refusing anything that would escape it.
    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf, StoreError> {
        let confined = |s: &str| {
            !s.is_empty()
                && Path::new(s)
                    .components()
                    .all(|c| matches!(c, Component::Normal(_)))
        };
        if !confined(bucket) || bucket.contains('/') || !confined(key) {
            return Err(StoreError::Permanent(format!(
                "invalid object address: {bucket}/{key}"
            )));
        }
        Ok(self.root.join(bucket).join(key))
    }
}

fn map_io(err: std::io::Error, bucket: &str, key: &str) -> StoreError {
    match err.kind() {
        ErrorKind::NotFound => StoreError::NotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        },
        ErrorKind::PermissionDenied => StoreError::AccessDenied {
            bucket: bucket.to_string(),
            key: key.to_string(),
        },
        _ => StoreError::Io(err),
    }
}

#[async_trait]
impl ObjectStore for FsStore {
    async fn fetch(&self, bucket: &str, key: &str) -> Result<FetchedObject, StoreError> {
        let path = self.object_path(bucket, key)?;
        let body = tokio::fs::read(&path)
            .await
            .map_err(|e| map_io(e, bucket, key))?;
        Ok(FetchedObject {
            body: Bytes::from(body),
            content_type: None,
        })
    }

    async fn store(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        _content_type: &str,
    ) -> Result<(), StoreError> {
        let path = self.object_path(bucket, key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| map_io(e, bucket, key))?;
        }
        tokio::fs::write(&path, &body)
            .await
            .map_err(|e| map_io(e, bucket, key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn store_then_fetch() {
        let tmp = TempDir::new().unwrap();
        let store = FsStore::new(tmp.path());

        store
            .store("photos-resized", "120_a.jpg", Bytes::from_static(b"abc"), "image/jpeg")
            .await
            .unwrap();

        assert!(tmp.path().join("photos-resized/120_a.jpg").exists());
        let obj = store.fetch("photos-resized", "120_a.jpg").await.unwrap();
        assert_eq!(obj.body, Bytes::from_static(b"abc"));
        assert_eq!(obj.content_type, None);
    }

    #[tokio::test]
    async fn nested_keys_create_directories() {
        let tmp = TempDir::new().unwrap();
        let store = FsStore::new(tmp.path());

        store
            .store("b", "512_2024/trip/a.png", Bytes::from_static(b"x"), "image/png")
            .await
            .unwrap();
        assert!(tmp.path().join("b/512_2024/trip/a.png").exists());
    }

    #[tokio::test]
    async fn missing_object_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let store = FsStore::new(tmp.path());
        let err = store.fetch("photos", "nope.jpg").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn traversal_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let store = FsStore::new(tmp.path());

        for (bucket, key) in [("b", "../escape.jpg"), ("..", "a.jpg"), ("b", "/abs.jpg"), ("b", "")] {
            let err = store.fetch(bucket, key).await.unwrap_err();
            assert!(matches!(err, StoreError::Permanent(_)), "{bucket}/{key}");
        }
    }
}
