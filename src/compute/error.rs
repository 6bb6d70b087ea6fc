use std::time::Duration;

use thiserror::Error;

use crate::google::ApiError;

#[derive(Debug, Error)]
pub enum ComputeError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("provider response is missing `{field}`")]
    MissingField { field: &'static str },

    #[error("operation {operation} still not done after {waited:?}")]
    OperationTimedOut { operation: String, waited: Duration },
}

pub type ComputeResult<T> = Result<T, ComputeError>;

impl ComputeError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Api(err) if err.is_not_found())
    }
}
