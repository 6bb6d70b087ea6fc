//! Object storage backends used by the replication trigger.
//!
//! `GcsClient` (see `gcs.rs`) talks to Cloud Storage. `LocalObjectStore` keeps
//! one directory per bucket and is used for local runs.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::{StorageError, StorageResult};
use super::event::ObjectLocation;

/// A bucket that exists and is visible to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BucketHandle {
    pub name: String,
}

/// Metadata of an object after it was written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredObject {
    pub bucket: String,
    pub name: String,
    pub size: Option<u64>,
}

#[async_trait]
/// Storage operations required by the replication trigger.
pub trait ObjectStore: Send + Sync {
    /// Looks up `bucket`; fails with a not-found error if it does not exist.
    async fn get_bucket(&self, bucket: &str) -> StorageResult<BucketHandle>;
    /// Server-side copy. Overwrites `destination` if it exists.
    async fn copy_object(
        &self,
        source: &ObjectLocation,
        destination: &ObjectLocation,
    ) -> StorageResult<StoredObject>;
}

/// Filesystem implementation: `{root}/{bucket}/{object}`.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn bucket_dir(&self, bucket: &str) -> StorageResult<PathBuf> {
        if !is_plain_name(bucket) {
            return Err(StorageError::InvalidEvent {
                reason: format!("bucket name '{bucket}' is not a plain name"),
            });
        }
        Ok(self.root.join(bucket))
    }

    fn object_path(&self, location: &ObjectLocation) -> StorageResult<PathBuf> {
        let bucket = self.bucket_dir(&location.bucket)?;
        let parts: Vec<&str> = location.object.split('/').collect();
        if parts.iter().any(|part| !is_plain_name(part)) {
            return Err(StorageError::InvalidEvent {
                reason: format!("object name '{}' escapes its bucket", location.object),
            });
        }
        Ok(parts.iter().fold(bucket, |path, part| path.join(part)))
    }
}

/// A single path component that stays under its parent directory.
fn is_plain_name(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && !segment.contains(['/', '\\'])
        && !Path::new(segment).is_absolute()
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn get_bucket(&self, bucket: &str) -> StorageResult<BucketHandle> {
        let dir = self.bucket_dir(bucket)?;
        let meta = tokio::fs::metadata(&dir)
            .await
            .map_err(|e| StorageError::from_io(dir.clone(), e))?;
        if !meta.is_dir() {
            return Err(StorageError::NotFound {
                resource: dir.display().to_string(),
            });
        }
        Ok(BucketHandle {
            name: bucket.to_string(),
        })
    }

    async fn copy_object(
        &self,
        source: &ObjectLocation,
        destination: &ObjectLocation,
    ) -> StorageResult<StoredObject> {
        let from = self.object_path(source)?;
        let to = self.object_path(destination)?;

        self.get_bucket(&destination.bucket).await?;
        if let Some(parent) = to.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::from_io(parent.to_path_buf(), e))?;
        }

        let size = tokio::fs::copy(&from, &to)
            .await
            .map_err(|e| StorageError::from_io(from.clone(), e))?;

        tracing::debug!(from = %from.display(), to = %to.display(), size, "Copied local object");
        Ok(StoredObject {
            bucket: destination.bucket.clone(),
            name: destination.object.clone(),
            size: Some(size),
        })
    }
}
