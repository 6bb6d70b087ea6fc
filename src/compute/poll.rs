use std::time::Duration;

use tokio::time::{self, Instant};

use super::api::ComputeApi;
use super::error::{ComputeError, ComputeResult};
use super::types::{InstanceIdentity, Operation};
use crate::console::Console;
use crate::constants::{DEFAULT_OPERATION_TIMEOUT, DEFAULT_POLL_INTERVAL};

/// How long and how often to wait on a zone operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    /// `None` waits until the operation finishes, however long that takes.
    pub max_wait: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_wait: Some(DEFAULT_OPERATION_TIMEOUT),
        }
    }
}

impl PollPolicy {
    pub fn unbounded(interval: Duration) -> Self {
        Self {
            interval,
            max_wait: None,
        }
    }

    fn expired(&self, waited: Duration) -> bool {
        self.max_wait.is_some_and(|limit| waited >= limit)
    }
}

/// Fetches `operation` until it reports `DONE`, one request at a time.
///
/// Returns the terminal operation, error payload included; interpreting it is
/// up to the caller.
pub async fn wait_for_operation(
    api: &dyn ComputeApi,
    id: &InstanceIdentity,
    operation: &str,
    policy: PollPolicy,
    console: &dyn Console,
) -> ComputeResult<Operation> {
    let started = Instant::now();
    let mut polls = 0u32;

    loop {
        let current = api
            .get_zone_operation(&id.project, &id.zone, operation)
            .await?;
        polls += 1;

        if current.is_done() {
            tracing::debug!(operation, polls, "Operation finished");
            return Ok(current);
        }

        let waited = started.elapsed();
        if policy.expired(waited) {
            tracing::warn!(operation, ?waited, "Gave up waiting on operation");
            return Err(ComputeError::OperationTimedOut {
                operation: operation.to_string(),
                waited,
            });
        }

        tracing::trace!(operation, status = %current.status, "Operation not done yet");
        console.line("Operation still in progress...");
        time::sleep(policy.interval).await;
    }
}
