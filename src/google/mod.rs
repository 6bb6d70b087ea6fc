//! Google REST plumbing: OAuth tokens, the authenticated JSON transport, and
//! error classification.

pub mod auth;
pub mod error;
pub mod http;


pub use auth::{
    AuthError, AuthResult, MetadataTokenProvider, ServiceAccountKey, ServiceAccountTokenProvider,
    StaticTokenProvider, TokenProvider,
};
pub use error::{ApiError, ApiResult};
pub use http::GoogleHttp;

use std::path::Path;
use std::sync::Arc;

/// Picks the token source: a key file when given, the metadata server otherwise.
pub fn token_provider(
    credentials_path: Option<&Path>,
    scope: &str,
) -> AuthResult<Arc<dyn TokenProvider>> {
    match credentials_path {
        Some(path) => Ok(Arc::new(ServiceAccountTokenProvider::from_file(path, scope)?)),
        None => Ok(Arc::new(MetadataTokenProvider::new())),
    }
}
