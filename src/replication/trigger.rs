use std::sync::Arc;

use serde::Serialize;

use super::error::StorageResult;
use super::event::{CopyRequest, ObjectLocation, StorageObjectEvent};
use super::store::ObjectStore;
use crate::console::{Console, StdoutConsole};

/// How one delivery ended. Every variant is a handled outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplicationOutcome {
    Copied,
    /// A bucket or the source object does not exist.
    NotFound,
    /// The caller lacks access to a bucket or object.
    Forbidden,
}

impl ReplicationOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Copied => "copied",
            Self::NotFound => "not_found",
            Self::Forbidden => "forbidden",
        }
    }
}

/// Copies every uploaded object to one fixed destination.
pub struct ReplicationTrigger {
    store: Arc<dyn ObjectStore>,
    destination: ObjectLocation,
    console: Arc<dyn Console>,
}

impl ReplicationTrigger {
    pub fn new(store: Arc<dyn ObjectStore>, destination: ObjectLocation) -> Self {
        Self {
            store,
            destination,
            console: Arc::new(StdoutConsole),
        }
    }

    pub fn with_console(mut self, console: Arc<dyn Console>) -> Self {
        self.console = console;
        self
    }

    pub fn destination(&self) -> &ObjectLocation {
        &self.destination
    }

    /// Handles one storage notification.
    ///
    /// Missing resources and access denials are reported and absorbed; any
    /// other storage failure is returned so the delivery can be retried.
    /// Repeated deliveries overwrite the destination each time.
    pub async fn handle(&self, event: &StorageObjectEvent) -> StorageResult<ReplicationOutcome> {
        let request = CopyRequest::for_event(event, &self.destination);
        let console = self.console.as_ref();

        console.line(&format!("From - bucket: {}", request.source.bucket));
        console.line(&format!("From - object: {}", request.source.object));
        console.line(&format!("To - bucket:   {}", request.destination.bucket));
        console.line(&format!("To - object:   {}", request.destination.object));
        console.line("Copying object ...");

        match self.copy(&request).await {
            Ok(()) => {
                tracing::info!(source = %request.source, destination = %request.destination, "Copied object");
                console.line("Copied");
                Ok(ReplicationOutcome::Copied)
            }
            Err(err) if err.is_not_found() => {
                tracing::warn!(source = %request.source, error = %err, "Bucket or object missing");
                console.line("Error: Bucket/Blob does NOT exist!!");
                Ok(ReplicationOutcome::NotFound)
            }
            Err(err) if err.is_forbidden() => {
                tracing::warn!(source = %request.source, error = %err, "Access denied");
                console.line("Error: Forbidden, you do not have access to it!!");
                Ok(ReplicationOutcome::Forbidden)
            }
            Err(err) => {
                tracing::error!(source = %request.source, error = %err, "Copy failed");
                Err(err)
            }
        }
    }

    async fn copy(&self, request: &CopyRequest) -> StorageResult<()> {
        self.store.get_bucket(&request.source.bucket).await?;
        self.store.get_bucket(&request.destination.bucket).await?;
        self.store
            .copy_object(&request.source, &request.destination)
            .await?;
        Ok(())
    }
}
