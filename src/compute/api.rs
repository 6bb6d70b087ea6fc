use async_trait::async_trait;

use super::error::ComputeResult;
use super::template::InstanceTemplate;
use super::types::{Image, Instance, InstanceIdentity, Operation};

#[async_trait]
/// Compute Engine calls used by the lifecycle controller.
///
/// Each method is a single provider request (pagination aside); nothing here
/// waits on operations.
pub trait ComputeApi: Send + Sync {
    /// Every instance in the identity's project and zone.
    async fn list_instances(&self, project: &str, zone: &str) -> ComputeResult<Vec<Instance>>;
    async fn get_instance(&self, id: &InstanceIdentity) -> ComputeResult<Instance>;
    /// Latest non-deprecated image in `family`.
    async fn image_from_family(&self, project: &str, family: &str) -> ComputeResult<Image>;
    async fn insert_instance(
        &self,
        project: &str,
        zone: &str,
        template: &InstanceTemplate,
    ) -> ComputeResult<Operation>;
    async fn start_instance(&self, id: &InstanceIdentity) -> ComputeResult<Operation>;
    async fn stop_instance(&self, id: &InstanceIdentity) -> ComputeResult<Operation>;
    async fn reset_instance(&self, id: &InstanceIdentity) -> ComputeResult<Operation>;
    async fn delete_instance(&self, id: &InstanceIdentity) -> ComputeResult<Operation>;
    async fn get_zone_operation(
        &self,
        project: &str,
        zone: &str,
        operation: &str,
    ) -> ComputeResult<Operation>;
}
