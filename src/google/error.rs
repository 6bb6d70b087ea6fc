use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use super::auth::AuthError;

/// Longest provider message kept verbatim in an error.
const MAX_MESSAGE_LEN: usize = 512;

/// Failure of a Google REST call, classified by what callers act on.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("not found: {resource} ({message})")]
    NotFound { resource: String, message: String },

    #[error("forbidden: {resource} ({message})")]
    Forbidden { resource: String, message: String },

    #[error("{resource} returned HTTP {status}: {message}")]
    Status {
        status: u16,
        resource: String,
        message: String,
    },

    #[error("request for {resource} failed: {source}")]
    Transport {
        resource: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("could not decode response for {resource}: {source}")]
    Decode {
        resource: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid request URL {url}")]
    InvalidUrl { url: String },

    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// Classifies a non-success HTTP response.
    pub fn from_status(status: StatusCode, resource: impl Into<String>, body: &str) -> Self {
        let resource = resource.into();
        let message = provider_message(body);
        match status {
            StatusCode::NOT_FOUND => Self::NotFound { resource, message },
            StatusCode::FORBIDDEN => Self::Forbidden { resource, message },
            other => Self::Status {
                status: other.as_u16(),
                resource,
                message,
            },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_forbidden(&self) -> bool {
        matches!(self, Self::Forbidden { .. })
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// Pulls `error.message` out of a Google error envelope, falling back to the raw body.
pub(crate) fn provider_message(body: &str) -> String {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error.message)
        .unwrap_or_else(|| body.trim().to_string());

    if message.is_empty() {
        return "no details".to_string();
    }

    match message.char_indices().nth(MAX_MESSAGE_LEN) {
        Some((cut, _)) => format!("{}...", &message[..cut]),
        None => message,
    }
}
