//! In-memory [`ObjectStore`] for tests.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::error::{StorageError, StorageResult};
use super::event::{CopyRequest, ObjectLocation};
use super::store::{BucketHandle, ObjectStore, StoredObject};

/// Failure a [`MockObjectStore`] can be told to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    NotFound,
    Forbidden,
    /// Anything that is neither of the above (surfaces as an I/O error).
    Unavailable,
}

impl MockFailure {
    fn into_error(self, resource: &str) -> StorageError {
        match self {
            Self::NotFound => StorageError::NotFound {
                resource: resource.to_string(),
            },
            Self::Forbidden => StorageError::Forbidden {
                resource: resource.to_string(),
            },
            Self::Unavailable => StorageError::Io {
                path: resource.into(),
                source: std::io::Error::other("injected failure"),
            },
        }
    }
}

#[derive(Debug, Default)]
struct MockState {
    buckets: HashSet<String>,
    bucket_failures: HashMap<String, MockFailure>,
    copy_failure: Option<MockFailure>,
    lookups: Vec<String>,
    copies: Vec<CopyRequest>,
}

/// Bucket registry that records every copy instead of moving bytes.
///
/// Unregistered buckets are reported as not found.
#[derive(Debug, Default)]
pub struct MockObjectStore {
    state: Mutex<MockState>,
}

impl MockObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bucket(self, bucket: &str) -> Self {
        self.state.lock().buckets.insert(bucket.to_string());
        self
    }

    pub fn failing_bucket(self, bucket: &str, failure: MockFailure) -> Self {
        self.state
            .lock()
            .bucket_failures
            .insert(bucket.to_string(), failure);
        self
    }

    pub fn failing_copy(self, failure: MockFailure) -> Self {
        self.state.lock().copy_failure = Some(failure);
        self
    }

    /// Bucket names passed to `get_bucket`, in call order.
    pub fn lookups(&self) -> Vec<String> {
        self.state.lock().lookups.clone()
    }

    pub fn copies(&self) -> Vec<CopyRequest> {
        self.state.lock().copies.clone()
    }
}

#[async_trait]
impl ObjectStore for MockObjectStore {
    async fn get_bucket(&self, bucket: &str) -> StorageResult<BucketHandle> {
        let mut state = self.state.lock();
        state.lookups.push(bucket.to_string());

        if let Some(failure) = state.bucket_failures.get(bucket) {
            return Err(failure.into_error(bucket));
        }
        if !state.buckets.contains(bucket) {
            return Err(MockFailure::NotFound.into_error(bucket));
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
        let mut state = self.state.lock();
        if let Some(failure) = state.copy_failure {
            return Err(failure.into_error(&source.to_string()));
        }

        state.copies.push(CopyRequest {
            source: source.clone(),
            destination: destination.clone(),
        });
        Ok(StoredObject {
            bucket: destination.bucket.clone(),
            name: destination.object.clone(),
            size: None,
        })
    }
}
