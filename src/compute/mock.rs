//! In-memory [`ComputeApi`] for tests.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::StatusCode;
use tokio::time::Instant;

use super::api::ComputeApi;
use super::error::{ComputeError, ComputeResult};
use super::template::InstanceTemplate;
use super::types::{
    Image, Instance, InstanceIdentity, Operation, OperationError, OperationStatus,
};
use crate::google::ApiError;

const MOCK_TARGET_ID: &str = "4815162342";

/// Provider call recorded by [`MockComputeApi`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockCall {
    ListInstances,
    GetInstance,
    ImageFromFamily,
    InsertInstance,
    StartInstance,
    StopInstance,
    ResetInstance,
    DeleteInstance,
    GetZoneOperation,
}

#[derive(Debug)]
struct MockState {
    instances: Vec<Instance>,
    image: Image,
    operation_script: VecDeque<OperationStatus>,
    operation_error: Option<OperationError>,
    insert_target_id: Option<String>,
    /// Status to fail with, and how many calls succeed first.
    failures: HashMap<MockCall, (u16, usize)>,
    calls: Vec<(MockCall, Instant)>,
    last_template: Option<InstanceTemplate>,
    next_operation: u32,
}

/// Scriptable Compute Engine stand-in.
///
/// Zone operations report the scripted statuses in order and `DONE` once the
/// script runs out. Any call can be made to fail with an HTTP status.
#[derive(Debug)]
pub struct MockComputeApi {
    state: Mutex<MockState>,
}

impl Default for MockComputeApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockComputeApi {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                instances: Vec::new(),
                image: Image {
                    self_link: "https://www.googleapis.com/compute/v1/projects/debian-cloud/global/images/debian-12-bookworm-v20240709".to_string(),
                    name: "debian-12-bookworm-v20240709".to_string(),
                },
                operation_script: VecDeque::new(),
                operation_error: None,
                insert_target_id: Some(MOCK_TARGET_ID.to_string()),
                failures: HashMap::new(),
                calls: Vec::new(),
                last_template: None,
                next_operation: 0,
            }),
        }
    }

    pub fn with_instance(self, instance: Instance) -> Self {
        self.state.lock().instances.push(instance);
        self
    }

    pub fn with_image(self, self_link: &str) -> Self {
        self.state.lock().image = Image {
            self_link: self_link.to_string(),
            name: self_link.rsplit('/').next().unwrap_or_default().to_string(),
        };
        self
    }

    /// Statuses returned by successive `get_zone_operation` calls.
    pub fn with_operation_statuses<I>(self, statuses: I) -> Self
    where
        I: IntoIterator<Item = OperationStatus>,
    {
        self.state.lock().operation_script = statuses.into_iter().collect();
        self
    }

    /// Error payload attached to the operation once it reports `DONE`.
    pub fn with_operation_error(self, error: OperationError) -> Self {
        self.state.lock().operation_error = Some(error);
        self
    }

    pub fn with_insert_target_id(self, target_id: Option<&str>) -> Self {
        self.state.lock().insert_target_id = target_id.map(str::to_string);
        self
    }

    /// Makes every `call` fail with the given HTTP status.
    pub fn failing(self, call: MockCall, status: u16) -> Self {
        self.failing_after(call, 0, status)
    }

    /// Lets the first `successes` calls through, then fails every later `call`.
    pub fn failing_after(self, call: MockCall, successes: usize, status: u16) -> Self {
        self.state.lock().failures.insert(call, (status, successes));
        self
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.state.lock().calls.iter().map(|(call, _)| *call).collect()
    }

    pub fn count(&self, call: MockCall) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|(recorded, _)| *recorded == call)
            .count()
    }

    /// When each `call` was made, on the tokio clock.
    pub fn call_times(&self, call: MockCall) -> Vec<Instant> {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|(recorded, _)| *recorded == call)
            .map(|(_, at)| *at)
            .collect()
    }

    pub fn last_template(&self) -> Option<InstanceTemplate> {
        self.state.lock().last_template.clone()
    }

    fn record(&self, call: MockCall, resource: &str) -> ComputeResult<()> {
        let mut state = self.state.lock();
        let previous = state.calls.iter().filter(|(c, _)| *c == call).count();
        state.calls.push((call, Instant::now()));
        match state.failures.get(&call) {
            Some(&(status, successes)) if previous >= successes => {
                let status =
                    StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                Err(ApiError::from_status(status, resource, "injected failure").into())
            }
            _ => Ok(()),
        }
    }

    fn operation(&self, kind: &str, target_id: Option<String>) -> Operation {
        let mut state = self.state.lock();
        state.next_operation += 1;
        Operation {
            name: format!("operation-{kind}-{}", state.next_operation),
            target_id,
            status: OperationStatus::Pending,
            error: None,
        }
    }

    fn set_status(&self, name: &str, status: &str) {
        let mut state = self.state.lock();
        if let Some(instance) = state.instances.iter_mut().find(|i| i.name == name) {
            instance.status = status.to_string();
        }
    }

    fn not_found(resource: &str) -> ComputeError {
        ApiError::from_status(StatusCode::NOT_FOUND, resource, "").into()
    }
}

#[async_trait]
impl ComputeApi for MockComputeApi {
    async fn list_instances(&self, _project: &str, _zone: &str) -> ComputeResult<Vec<Instance>> {
        self.record(MockCall::ListInstances, "instances")?;
        Ok(self.state.lock().instances.clone())
    }

    async fn get_instance(&self, id: &InstanceIdentity) -> ComputeResult<Instance> {
        self.record(MockCall::GetInstance, &id.instance)?;
        self.state
            .lock()
            .instances
            .iter()
            .find(|instance| instance.name == id.instance)
            .cloned()
            .ok_or_else(|| Self::not_found(&id.instance))
    }

    async fn image_from_family(&self, _project: &str, family: &str) -> ComputeResult<Image> {
        self.record(MockCall::ImageFromFamily, family)?;
        Ok(self.state.lock().image.clone())
    }

    async fn insert_instance(
        &self,
        _project: &str,
        _zone: &str,
        template: &InstanceTemplate,
    ) -> ComputeResult<Operation> {
        self.record(MockCall::InsertInstance, &template.name)?;
        let target_id = {
            let mut state = self.state.lock();
            state.last_template = Some(template.clone());
            state.instances.push(Instance {
                id: MOCK_TARGET_ID.to_string(),
                name: template.name.clone(),
                status: "PROVISIONING".to_string(),
                machine_type: template.machine_type.clone(),
            });
            state.insert_target_id.clone()
        };
        Ok(self.operation("insert", target_id))
    }

    async fn start_instance(&self, id: &InstanceIdentity) -> ComputeResult<Operation> {
        self.record(MockCall::StartInstance, &id.instance)?;
        self.set_status(&id.instance, "RUNNING");
        Ok(self.operation("start", None))
    }

    async fn stop_instance(&self, id: &InstanceIdentity) -> ComputeResult<Operation> {
        self.record(MockCall::StopInstance, &id.instance)?;
        self.set_status(&id.instance, "STOPPING");
        Ok(self.operation("stop", None))
    }

    async fn reset_instance(&self, id: &InstanceIdentity) -> ComputeResult<Operation> {
        self.record(MockCall::ResetInstance, &id.instance)?;
        Ok(self.operation("reset", None))
    }

    async fn delete_instance(&self, id: &InstanceIdentity) -> ComputeResult<Operation> {
        self.record(MockCall::DeleteInstance, &id.instance)?;
        self.state
            .lock()
            .instances
            .retain(|instance| instance.name != id.instance);
        Ok(self.operation("delete", None))
    }

    async fn get_zone_operation(
        &self,
        _project: &str,
        _zone: &str,
        operation: &str,
    ) -> ComputeResult<Operation> {
        self.record(MockCall::GetZoneOperation, operation)?;
        let mut state = self.state.lock();
        let status = state
            .operation_script
            .pop_front()
            .unwrap_or(OperationStatus::Done);
        let error = match status {
            OperationStatus::Done => state.operation_error.clone(),
            _ => None,
        };
        Ok(Operation {
            name: operation.to_string(),
            target_id: None,
            status,
            error,
        })
    }
}
