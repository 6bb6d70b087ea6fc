//! OAuth access tokens for Google APIs.
//!
//! `ServiceAccountTokenProvider` signs a JWT assertion with a service account
//! key and exchanges it at the key's token endpoint. `MetadataTokenProvider`
//! asks the metadata server of the runtime the code is deployed on. Both cache
//! the token until shortly before it expires.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use parking_lot::Mutex;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{DEFAULT_TOKEN_URI, HTTP_TIMEOUT, METADATA_ENDPOINT, TOKEN_EXPIRY_SKEW_SECS};

/// Lifetime requested for signed assertions; Google caps it at one hour.
const ASSERTION_LIFETIME_SECS: i64 = 3600;
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("failed to read credentials from {path}: {source}")]
    ReadCredentials {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid service account key in {path}: {source}")]
    ParseCredentials {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to sign token assertion: {0}")]
    Sign(#[from] jsonwebtoken::errors::Error),

    #[error("token request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("token endpoint returned HTTP {status}: {body}")]
    Rejected { status: u16, body: String },
}

pub type AuthResult<T> = Result<T, AuthError>;

#[async_trait]
/// Source of bearer tokens for outgoing API requests.
pub trait TokenProvider: Send + Sync {
    async fn access_token(&self) -> AuthResult<String>;
}

/// The parts of a service account JSON key needed to mint tokens.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub project_id: Option<String>,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    pub fn from_file(path: &Path) -> AuthResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| AuthError::ReadCredentials {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| AuthError::ParseCredentials {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: i64,
}

impl CachedToken {
    fn is_fresh(&self, now: i64) -> bool {
        now + TOKEN_EXPIRY_SKEW_SECS < self.expires_at
    }
}

#[derive(Debug, Default)]
struct TokenCache {
    slot: Mutex<Option<CachedToken>>,
}

impl TokenCache {
    fn get(&self, now: i64) -> Option<String> {
        self.slot
            .lock()
            .as_ref()
            .filter(|token| token.is_fresh(now))
            .map(|token| token.value.clone())
    }

    fn put(&self, value: &str, now: i64, expires_in: i64) {
        *self.slot.lock() = Some(CachedToken {
            value: value.to_string(),
            expires_at: now + expires_in,
        });
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

fn http_client() -> HttpClient {
    HttpClient::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .unwrap_or_else(|_| HttpClient::new())
}

async fn read_token_response(response: reqwest::Response) -> AuthResult<TokenResponse> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AuthError::Rejected {
            status: status.as_u16(),
            body: super::error::provider_message(&body),
        });
    }
    Ok(response.json().await?)
}

/// Mints tokens from a service account key (JWT bearer grant).
pub struct ServiceAccountTokenProvider {
    key: ServiceAccountKey,
    scope: String,
    http: HttpClient,
    cache: TokenCache,
}

impl ServiceAccountTokenProvider {
    pub fn new(key: ServiceAccountKey, scope: impl Into<String>) -> Self {
        Self {
            key,
            scope: scope.into(),
            http: http_client(),
            cache: TokenCache::default(),
        }
    }

    pub fn from_file(path: &Path, scope: impl Into<String>) -> AuthResult<Self> {
        Ok(Self::new(ServiceAccountKey::from_file(path)?, scope))
    }

    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    fn signed_assertion(&self, now: i64) -> AuthResult<String> {
        let claims = AssertionClaims {
            iss: &self.key.client_email,
            scope: &self.scope,
            aud: &self.key.token_uri,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };
        let key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())?;
        Ok(jsonwebtoken::encode(
            &Header::new(Algorithm::RS256),
            &claims,
            &key,
        )?)
    }
}

#[async_trait]
impl TokenProvider for ServiceAccountTokenProvider {
    async fn access_token(&self) -> AuthResult<String> {
        let now = chrono::Utc::now().timestamp();
        if let Some(token) = self.cache.get(now) {
            return Ok(token);
        }

        let assertion = self.signed_assertion(now)?;
        let response = self
            .http
            .post(&self.key.token_uri)
            .form(&[
                ("grant_type", JWT_BEARER_GRANT),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await?;
        let token = read_token_response(response).await?;

        tracing::debug!(
            client_email = %self.key.client_email,
            expires_in = token.expires_in,
            "Fetched service account access token"
        );
        self.cache.put(&token.access_token, now, token.expires_in);
        Ok(token.access_token)
    }
}

/// Fetches tokens for the runtime's default service account from the metadata server.
pub struct MetadataTokenProvider {
    endpoint: String,
    http: HttpClient,
    cache: TokenCache,
}

impl MetadataTokenProvider {
    pub fn new() -> Self {
        Self::with_endpoint(METADATA_ENDPOINT)
    }

    pub fn with_endpoint(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            http: http_client(),
            cache: TokenCache::default(),
        }
    }
}

impl Default for MetadataTokenProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenProvider for MetadataTokenProvider {
    async fn access_token(&self) -> AuthResult<String> {
        let now = chrono::Utc::now().timestamp();
        if let Some(token) = self.cache.get(now) {
            return Ok(token);
        }

        let url = format!(
            "{}/computeMetadata/v1/instance/service-accounts/default/token",
            self.endpoint
        );
        let response = self
            .http
            .get(&url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await?;
        let token = read_token_response(response).await?;

        self.cache.put(&token.access_token, now, token.expires_in);
        Ok(token.access_token)
    }
}

/// Hands out a fixed token (emulators, tests).
#[derive(Debug, Clone)]
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> AuthResult<String> {
        Ok(self.token.clone())
    }
}

#[cfg(test)]
pub(super) fn cache_is_fresh(expires_at: i64, now: i64) -> bool {
    CachedToken {
        value: String::new(),
        expires_at,
    }
    .is_fresh(now)
}
