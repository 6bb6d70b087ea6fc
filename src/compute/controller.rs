use std::sync::Arc;

use super::api::ComputeApi;
use super::client::GceClient;
use super::error::{ComputeError, ComputeResult};
use super::poll::{PollPolicy, wait_for_operation};
use super::template::build_instance_template;
use super::types::{Instance, InstanceIdentity, Operation, StartOutcome, StartStage};
use crate::config::ComputeConfig;
use crate::console::{Console, StdoutConsole};
use crate::constants::CLOUD_PLATFORM_SCOPE;
use crate::google::{self, ApiError};

/// Drives the lifecycle of the single configured instance.
///
/// The `label` argument taken by the per-instance operations is only echoed in
/// output; every call targets [`ComputeConfig::identity`].
pub struct InstanceController {
    config: ComputeConfig,
    identity: InstanceIdentity,
    policy: PollPolicy,
    api: Arc<dyn ComputeApi>,
    console: Arc<dyn Console>,
}

impl InstanceController {
    /// Creates a controller with an explicit [`ComputeApi`] implementation.
    pub fn new(config: ComputeConfig, api: Arc<dyn ComputeApi>) -> Self {
        Self {
            identity: config.identity(),
            policy: config.poll_policy(),
            config,
            api,
            console: Arc::new(StdoutConsole),
        }
    }

    /// Creates a controller talking to Compute Engine with the configured key file.
    pub fn from_config(config: ComputeConfig) -> ComputeResult<Self> {
        let tokens = google::token_provider(
            Some(config.credentials_path.as_path()),
            CLOUD_PLATFORM_SCOPE,
        )
        .map_err(ApiError::from)?;
        let api = GceClient::new(&config.endpoint, tokens)?;
        Ok(Self::new(config, Arc::new(api)))
    }

    pub fn with_console(mut self, console: Arc<dyn Console>) -> Self {
        self.console = console;
        self
    }

    pub fn with_poll_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn config(&self) -> &ComputeConfig {
        &self.config
    }

    pub fn identity(&self) -> &InstanceIdentity {
        &self.identity
    }

    pub fn poll_policy(&self) -> PollPolicy {
        self.policy
    }

    fn say(&self, text: impl AsRef<str>) {
        self.console.line(text.as_ref());
    }

    fn print_instance(&self, instance: &Instance) {
        self.say(format!(" - Id:           {}", instance.id));
        self.say(format!("   Name:         {}", instance.name));
        self.say(format!("   Status:       {}", instance.status));
        self.say(format!("   Machine type: {}", instance.machine_type));
    }

    /// Lists every instance in the configured project and zone.
    pub async fn list_all(&self) -> ComputeResult<Vec<Instance>> {
        let InstanceIdentity { project, zone, .. } = &self.identity;
        self.say("Listing VM instances ...");

        let instances = self.api.list_instances(project, zone).await?;
        tracing::info!(%project, %zone, count = instances.len(), "Listed instances");

        self.say(format!(
            "Instances in project \"{project}\" and zone \"{zone}\":"
        ));
        if instances.is_empty() {
            self.say("NO instances");
        }
        for instance in &instances {
            self.print_instance(instance);
        }
        Ok(instances)
    }

    /// Creates the configured instance from the latest image of the configured family.
    ///
    /// Returns the provider-assigned instance id.
    pub async fn create(&self) -> ComputeResult<String> {
        let config = &self.config;
        self.say("Creating VM instance ...");

        let image = self
            .api
            .image_from_family(&config.image_project, &config.image_family)
            .await?;
        tracing::debug!(image = %image.self_link, "Resolved image family");

        let template = build_instance_template(config, &image.self_link);
        let operation = self
            .api
            .insert_instance(&config.project, &config.zone, &template)
            .await?;

        let target_id = operation
            .target_id
            .ok_or(ComputeError::MissingField { field: "targetId" })?;
        tracing::info!(
            instance = %config.instance_name,
            %target_id,
            operation = %operation.name,
            "Submitted instance insert"
        );

        self.say(format!("Instance Id: {target_id}"));
        Ok(target_id)
    }

    /// Fetches and prints the configured instance.
    pub async fn get(&self, label: &str) -> ComputeResult<Instance> {
        self.say("Listing VM instance ...");
        self.say(format!("Instance Id: {label}"));

        let instance = self.api.get_instance(&self.identity).await?;
        self.print_instance(&instance);
        Ok(instance)
    }

    /// Starts the configured instance and waits for the operation to finish.
    ///
    /// Never fails: every error is printed, logged and folded into the outcome.
    pub async fn start(&self, label: &str) -> StartOutcome {
        let id = &self.identity;
        self.say("Starting VM instance ...");
        self.say(format!("Project: {}", id.project));
        self.say(format!("Zone: {}", id.zone));
        self.say(format!("Instance Name: {}", id.instance));
        self.say(format!("Instance Id: {label}"));

        let outcome = self.run_start().await;
        match &outcome {
            StartOutcome::Started { status } => {
                tracing::info!(instance = %id.instance, %status, "Instance started");
            }
            StartOutcome::OperationFailed { error } => {
                tracing::error!(instance = %id.instance, %error, "Start operation failed");
            }
            StartOutcome::TimedOut { operation } => {
                tracing::error!(instance = %id.instance, %operation, "Start operation timed out");
            }
            StartOutcome::Failed { stage, message } => {
                tracing::error!(instance = %id.instance, %stage, %message, "Error starting instance");
            }
        }
        outcome
    }

    async fn run_start(&self) -> StartOutcome {
        let id = &self.identity;

        let current = match self.api.get_instance(id).await {
            Ok(instance) => instance,
            Err(err) => return self.start_failed(StartStage::ReadStatus, err),
        };
        self.say(format!("Current instance status: {}", current.status));

        let submitted = match self.api.start_instance(id).await {
            Ok(operation) => operation,
            Err(err) => return self.start_failed(StartStage::Submit, err),
        };
        self.say(format!("Start operation initiated: {}", submitted.name));
        self.say("Waiting for operation to complete...");

        let finished = match wait_for_operation(
            self.api.as_ref(),
            id,
            &submitted.name,
            self.policy,
            self.console.as_ref(),
        )
        .await
        {
            Ok(operation) => operation,
            Err(ComputeError::OperationTimedOut { operation, waited }) => {
                self.say(format!(
                    "Error starting instance: operation {operation} still not done after {}s",
                    waited.as_secs()
                ));
                return StartOutcome::TimedOut { operation };
            }
            Err(err) => return self.start_failed(StartStage::Poll, err),
        };

        if let Some(error) = finished.error {
            self.say(format!("Error starting instance: {error}"));
            return StartOutcome::OperationFailed { error };
        }

        match self.api.get_instance(id).await {
            Ok(instance) => {
                self.say(format!(
                    "Instance successfully started. Status: {}",
                    instance.status
                ));
                StartOutcome::Started {
                    status: instance.status,
                }
            }
            Err(err) => self.start_failed(StartStage::ReadFinalStatus, err),
        }
    }

    fn start_failed(&self, stage: StartStage, err: ComputeError) -> StartOutcome {
        let message = err.to_string();
        self.say(format!("Error starting instance: {message}"));
        StartOutcome::Failed { stage, message }
    }

    /// Submits a stop; does not wait for it.
    pub async fn stop(&self, label: &str) -> ComputeResult<Operation> {
        self.say("Stopping VM instance ...");
        self.say(format!("Instance Id: {label}"));
        let operation = self.api.stop_instance(&self.identity).await?;
        tracing::info!(instance = %self.identity.instance, operation = %operation.name, "Submitted stop");
        Ok(operation)
    }

    /// Submits a hard reset; does not wait for it.
    pub async fn reset(&self, label: &str) -> ComputeResult<Operation> {
        self.say("Resetting VM instance ...");
        self.say(format!("Instance Id: {label}"));
        let operation = self.api.reset_instance(&self.identity).await?;
        tracing::info!(instance = %self.identity.instance, operation = %operation.name, "Submitted reset");
        Ok(operation)
    }

    /// Submits a delete; does not wait for it.
    pub async fn delete(&self, label: &str) -> ComputeResult<Operation> {
        self.say("Deleting VM instance ...");
        self.say(format!("Instance Id: {label}"));
        let operation = self.api.delete_instance(&self.identity).await?;
        tracing::info!(instance = %self.identity.instance, operation = %operation.name, "Submitted delete");
        Ok(operation)
    }
}
