use std::sync::Arc;

use super::error::StorageResult;
use super::gcs::GcsClient;
use super::store::{LocalObjectStore, ObjectStore};
use crate::config::{ReplicationConfig, StorageProviderType};
use crate::constants::STORAGE_READ_WRITE_SCOPE;
use crate::google::{self, ApiError};

/// Builds the appropriate [`ObjectStore`] implementation for the config.
pub fn build_object_store(config: &ReplicationConfig) -> StorageResult<Arc<dyn ObjectStore>> {
    match config.storage_provider {
        StorageProviderType::Gcs => {
            let tokens = google::token_provider(
                config.credentials_path.as_deref(),
                STORAGE_READ_WRITE_SCOPE,
            )
            .map_err(ApiError::from)?;
            Ok(Arc::new(GcsClient::new(&config.storage_endpoint, tokens)?))
        }
        StorageProviderType::Local => {
            Ok(Arc::new(LocalObjectStore::new(config.local_storage_root.clone())))
        }
    }
}
