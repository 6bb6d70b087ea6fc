//! Cloudhand library crate (used by the `cloudhand` CLI, the `cloudhand-copy`
//! trigger host, and integration tests).
//!
//! # Public API Surface
//!
//! ## Instance Lifecycle Controller
//! - [`InstanceController`] - list/create/get/start/stop/reset/delete for one instance
//! - [`ComputeApi`], [`GceClient`] - Compute Engine v1 access
//! - [`PollPolicy`], [`StartOutcome`] - start-operation polling and its result
//!
//! ## Object Replication Trigger
//! - [`ReplicationTrigger`], [`ReplicationOutcome`] - copy-on-upload handler
//! - [`ObjectStore`], [`GcsClient`], [`LocalObjectStore`] - storage backends
//! - [`gateway`] - Axum host that feeds storage events into the trigger
//!
//! ## Shared
//! - [`ComputeConfig`], [`ReplicationConfig`], [`ConfigError`] - environment-backed configuration
//! - [`TokenProvider`] and friends - Google OAuth access tokens
//! - [`ApiError`] - HTTP error classification shared by both REST clients
//! - [`Console`] - operator-facing output sink
//!
//! ## Test/Mock Support
//! In-memory providers are available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod compute;
pub mod config;
pub mod console;
pub mod constants;
pub mod gateway;
pub mod google;
pub mod replication;

pub use compute::{
    ComputeApi, ComputeError, ComputeResult, GceClient, Instance, InstanceController,
    InstanceIdentity, InstanceTemplate, Operation, OperationStatus, PollPolicy, StartOutcome,
    StartStage, build_instance_template,
};
#[cfg(any(test, feature = "mock"))]
pub use compute::{MockCall, MockComputeApi};

pub use config::{ComputeConfig, ConfigError, ReplicationConfig, StorageProviderType};
pub use console::{Console, StdoutConsole};
#[cfg(any(test, feature = "mock"))]
pub use console::BufferConsole;

pub use google::{
    ApiError, ApiResult, AuthError, AuthResult, MetadataTokenProvider, ServiceAccountKey,
    ServiceAccountTokenProvider, StaticTokenProvider, TokenProvider,
};

pub use replication::{
    BucketHandle, CopyRequest, GcsClient, LocalObjectStore, ObjectLocation, ObjectStore,
    ReplicationOutcome, ReplicationTrigger, StorageError, StorageObjectEvent, StorageResult,
    StoredObject, build_object_store,
};
#[cfg(any(test, feature = "mock"))]
pub use replication::{MockFailure, MockObjectStore};
