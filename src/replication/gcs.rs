//! Cloud Storage JSON API v1.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::error::StorageResult;
use super::event::ObjectLocation;
use super::store::{BucketHandle, ObjectStore, StoredObject};
use crate::google::{ApiResult, GoogleHttp, TokenProvider};

/// [`ObjectStore`] backed by `storage.googleapis.com`.
#[derive(Clone)]
pub struct GcsClient {
    http: GoogleHttp,
}

/// Object resource as returned by `objects.copy`. Sizes are decimal strings.
#[derive(Debug, Deserialize)]
struct ObjectResource {
    bucket: String,
    name: String,
    #[serde(default)]
    size: Option<String>,
}

impl GcsClient {
    pub fn new(endpoint: &str, tokens: Arc<dyn TokenProvider>) -> ApiResult<Self> {
        Ok(Self {
            http: GoogleHttp::new(endpoint, tokens)?,
        })
    }
}

#[async_trait]
impl ObjectStore for GcsClient {
    async fn get_bucket(&self, bucket: &str) -> StorageResult<BucketHandle> {
        let url = self.http.url(&["storage", "v1", "b", bucket])?;
        let resource = format!("bucket {bucket}");
        Ok(self.http.get_json(url, &resource).await?)
    }

    #[tracing::instrument(skip_all, fields(%source, %destination))]
    async fn copy_object(
        &self,
        source: &ObjectLocation,
        destination: &ObjectLocation,
    ) -> StorageResult<StoredObject> {
        let url = self.http.url(&[
            "storage",
            "v1",
            "b",
            source.bucket.as_str(),
            "o",
            source.object.as_str(),
            "copyTo",
            "b",
            destination.bucket.as_str(),
            "o",
            destination.object.as_str(),
        ])?;
        let resource = format!("copy {source} -> {destination}");

        let object: ObjectResource = self
            .http
            .post_json(url, Some(&json!({})), &resource)
            .await?;

        Ok(StoredObject {
            size: object.size.and_then(|raw| raw.parse().ok()),
            bucket: object.bucket,
            name: object.name,
        })
    }
}
