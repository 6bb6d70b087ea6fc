use std::fmt;

use serde::{Deserialize, Serialize};

/// The one instance a deployment manages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceIdentity {
    pub project: String,
    pub zone: String,
    pub instance: String,
}

/// An instance as reported by `instances.get` / `instances.list`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    /// Decimal string (the API encodes uint64 as a string).
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub machine_type: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InstanceList {
    #[serde(default)]
    pub items: Vec<Instance>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub self_link: String,
    #[serde(default)]
    pub name: String,
}

/// Zone operation status. Unknown values are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum OperationStatus {
    Pending,
    Running,
    Done,
    Other(String),
}

impl From<String> for OperationStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "PENDING" => Self::Pending,
            "RUNNING" => Self::Running,
            "DONE" => Self::Done,
            _ => Self::Other(raw),
        }
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => f.write_str("PENDING"),
            Self::Running => f.write_str("RUNNING"),
            Self::Done => f.write_str("DONE"),
            Self::Other(raw) => f.write_str(raw),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct OperationErrorDetail {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub location: Option<String>,
}

/// Error payload attached to a finished operation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct OperationError {
    #[serde(default)]
    pub errors: Vec<OperationErrorDetail>,
}

impl fmt::Display for OperationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.errors.is_empty() {
            return f.write_str("operation reported an error");
        }
        for (i, detail) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", detail.code, detail.message)?;
        }
        Ok(())
    }
}

/// Handle to a long-running zone operation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub name: String,
    #[serde(default)]
    pub target_id: Option<String>,
    pub status: OperationStatus,
    #[serde(default)]
    pub error: Option<OperationError>,
}

impl Operation {
    pub fn is_done(&self) -> bool {
        self.status == OperationStatus::Done
    }
}

/// Where in the start sequence a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartStage {
    ReadStatus,
    Submit,
    Poll,
    ReadFinalStatus,
}

impl fmt::Display for StartStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::ReadStatus => "reading current status",
            Self::Submit => "submitting start",
            Self::Poll => "polling operation",
            Self::ReadFinalStatus => "reading final status",
        };
        f.write_str(label)
    }
}

/// Result of [`InstanceController::start`](super::InstanceController::start).
///
/// `start` never returns an error; every failure ends up here and in the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    /// Operation finished cleanly; `status` is the instance status read afterwards.
    Started { status: String },
    /// Operation reached `DONE` carrying an error payload.
    OperationFailed { error: OperationError },
    /// The poll policy's `max_wait` elapsed first.
    TimedOut { operation: String },
    /// A provider call failed before the operation could be observed to completion.
    Failed { stage: StartStage, message: String },
}

impl StartOutcome {
    pub fn is_started(&self) -> bool {
        matches!(self, Self::Started { .. })
    }
}
