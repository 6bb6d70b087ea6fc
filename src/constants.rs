//! Cross-cutting, shared constants.
//!
//! Provider endpoints, OAuth scopes, and deployment defaults live here so the
//! compute and storage sides agree on them.

use std::time::Duration;

/// Compute Engine REST root (the `compute/v1` path is appended by the client).
pub const COMPUTE_ENDPOINT: &str = "https://compute.googleapis.com";
/// Cloud Storage JSON API root (the `storage/v1` path is appended by the client).
pub const STORAGE_ENDPOINT: &str = "https://storage.googleapis.com";
/// GCE metadata server, reachable from Compute Engine, Cloud Run and Cloud Functions.
pub const METADATA_ENDPOINT: &str = "http://metadata.google.internal";
/// Default OAuth token endpoint when a key file omits `token_uri`.
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";
pub const STORAGE_READ_WRITE_SCOPE: &str = "https://www.googleapis.com/auth/devstorage.read_write";
pub const LOGGING_WRITE_SCOPE: &str = "https://www.googleapis.com/auth/logging.write";

/// Service account attached to created instances.
pub const DEFAULT_SERVICE_ACCOUNT: &str = "default";

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Tokens are refreshed this long before the provider-reported expiry.
pub const TOKEN_EXPIRY_SKEW_SECS: i64 = 60;

pub const DEFAULT_DESTINATION_BUCKET: &str = "bucketdestinationtest";
pub const DEFAULT_DESTINATION_OBJECT: &str = "agentes-IA.jpg";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_LOCAL_STORAGE_ROOT: &str = "./.buckets";

/// Upper bound for any single provider HTTP request.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
