//! Storage notification payloads.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::{StorageError, StorageResult};

/// The part of a Cloud Storage object-finalized notification the trigger reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageObjectEvent {
    pub bucket: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl StorageObjectEvent {
    pub fn new(bucket: &str, name: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            name: name.to_string(),
            generation: None,
            content_type: None,
        }
    }

    /// Accepts either the object resource itself (binary-mode CloudEvent) or
    /// an envelope carrying it under `data` (structured mode).
    pub fn from_payload(payload: Value) -> StorageResult<Self> {
        let object = match payload {
            Value::Object(mut map) => match map.remove("data") {
                Some(data @ Value::Object(_)) => data,
                _ => Value::Object(map),
            },
            other => {
                return Err(StorageError::InvalidEvent {
                    reason: format!("expected a JSON object, got {}", json_kind(&other)),
                });
            }
        };

        let event: Self =
            serde_json::from_value(object).map_err(|e| StorageError::InvalidEvent {
                reason: e.to_string(),
            })?;

        if event.bucket.trim().is_empty() {
            return Err(StorageError::InvalidEvent {
                reason: "`bucket` is empty".to_string(),
            });
        }
        if event.name.trim().is_empty() {
            return Err(StorageError::InvalidEvent {
                reason: "`name` is empty".to_string(),
            });
        }
        Ok(event)
    }

    pub fn location(&self) -> ObjectLocation {
        ObjectLocation::new(&self.bucket, &self.name)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// A bucket/object pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectLocation {
    pub bucket: String,
    pub object: String,
}

impl ObjectLocation {
    pub fn new(bucket: &str, object: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            object: object.to_string(),
        }
    }
}

impl fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gs://{}/{}", self.bucket, self.object)
    }
}

/// One copy derived from an event and the fixed destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CopyRequest {
    pub source: ObjectLocation,
    pub destination: ObjectLocation,
}

impl CopyRequest {
    pub fn for_event(event: &StorageObjectEvent, destination: &ObjectLocation) -> Self {
        Self {
            source: event.location(),
            destination: destination.clone(),
        }
    }
}
