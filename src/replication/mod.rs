//! Object replication trigger: copy each uploaded object to a fixed destination.

pub mod error;
pub mod event;
pub mod factory;
pub mod gcs;
pub mod store;
pub mod trigger;

#[cfg(any(test, feature = "mock"))]
pub mod mock;


pub use error::{StorageError, StorageResult};
pub use event::{CopyRequest, ObjectLocation, StorageObjectEvent};
pub use factory::build_object_store;
pub use gcs::GcsClient;
pub use store::{BucketHandle, LocalObjectStore, ObjectStore, StoredObject};
pub use trigger::{ReplicationOutcome, ReplicationTrigger};

#[cfg(any(test, feature = "mock"))]
pub use mock::{MockFailure, MockObjectStore};
