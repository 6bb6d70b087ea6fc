use std::path::PathBuf;

use thiserror::Error;

use crate::google::ApiError;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("not found: {resource}")]
    NotFound { resource: String },

    #[error("forbidden: {resource}")]
    Forbidden { resource: String },

    #[error("storage I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid storage event: {reason}")]
    InvalidEvent { reason: String },
}

pub type StorageResult<T> = Result<T, StorageError>;

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Api(err) => err.is_not_found(),
            _ => false,
        }
    }

    pub fn is_forbidden(&self) -> bool {
        match self {
            Self::Forbidden { .. } => true,
            Self::Api(err) => err.is_forbidden(),
            _ => false,
        }
    }

    /// Maps a filesystem error, folding missing paths and permission errors
    /// into the same outcomes the Cloud Storage API reports.
    pub(crate) fn from_io(path: PathBuf, source: std::io::Error) -> Self {
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound {
                resource: path.display().to_string(),
            },
            std::io::ErrorKind::PermissionDenied => Self::Forbidden {
                resource: path.display().to_string(),
            },
            _ => Self::Io { path, source },
        }
    }
}
