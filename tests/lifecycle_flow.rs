//! Integration tests for the instance lifecycle controller.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use cloudhand::{
    BufferConsole, ComputeConfig, GceClient, InstanceController, MockCall, MockComputeApi,
    OperationStatus, PollPolicy, StartOutcome, StaticTokenProvider,
};
use httpmock::prelude::*;
use serde_json::json;
use tempfile::NamedTempFile;

fn settings(credentials: &str, endpoint: &str) -> HashMap<&'static str, String> {
    HashMap::from([
        ("GCP_ZONE", "us-central1-a".to_string()),
        ("GCP_PROJECT_ID", "acme-prod".to_string()),
        ("GCP_IMAGE_NAME", "ubuntu-2204-lts".to_string()),
        ("GCP_IMAGE_PROJECT", "ubuntu-os-cloud".to_string()),
        ("GCP_INSTANCE_TYPE", "n2-standard-2".to_string()),
        ("GCP_INSTANCE_NAME", "batch-runner".to_string()),
        ("GCP_VPC_NETWORK", "projects/acme-prod/global/networks/core".to_string()),
        (
            "GCP_VPC_SUBNET",
            "projects/acme-prod/regions/us-central1/subnetworks/core-a".to_string(),
        ),
        ("GOOGLE_APPLICATION_CREDENTIALS", credentials.to_string()),
        ("GCP_COMPUTE_ENDPOINT", endpoint.to_string()),
    ])
}

fn load_config(credentials: &NamedTempFile, endpoint: &str) -> ComputeConfig {
    let settings = settings(credentials.path().to_str().unwrap(), endpoint);
    let config = ComputeConfig::from_lookup(|name| settings.get(name).cloned()).unwrap();
    config.validate().unwrap();
    config
}

#[tokio::test(start_paused = true)]
async fn test_create_start_stop_delete_against_mock() {
    let key = NamedTempFile::new().unwrap();
    let config = load_config(&key, "https://compute.googleapis.com");

    let api = Arc::new(MockComputeApi::new().with_operation_statuses([
        OperationStatus::Pending,
        OperationStatus::Running,
        OperationStatus::Done,
    ]));
    let console = Arc::new(BufferConsole::new());
    let controller = InstanceController::new(config, api.clone()).with_console(console.clone());

    let id = controller.create().await.unwrap();
    let template = api.last_template().unwrap();
    assert_eq!(template.name, "batch-runner");
    assert_eq!(template.machine_type, "zones/us-central1-a/machineTypes/n2-standard-2");

    let listed = controller.list_all().await.unwrap();
    assert_eq!(listed.len(), 1);

    let outcome = controller.start(&id).await;
    assert_eq!(
        outcome,
        StartOutcome::Started {
            status: "RUNNING".to_string()
        }
    );
    assert_eq!(api.count(MockCall::GetZoneOperation), 3);

    controller.stop(&id).await.unwrap();
    controller.delete(&id).await.unwrap();
    assert!(controller.list_all().await.unwrap().is_empty());
    assert!(console.contains("NO instances"));
}

#[tokio::test]
async fn test_start_over_http() {
    let server = MockServer::start_async().await;
    let key = NamedTempFile::new().unwrap();
    let config = load_config(&key, &server.base_url());
    let instance_path = "/compute/v1/projects/acme-prod/zones/us-central1-a/instances/batch-runner";

    server.mock(|when, then| {
        when.method(GET).path(instance_path);
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({
                "id": "8812",
                "name": "batch-runner",
                "status": "TERMINATED",
                "machineType": "zones/us-central1-a/machineTypes/n2-standard-2"
            }));
    });
    let start = server.mock(|when, then| {
        when.method(POST).path(format!("{instance_path}/start"));
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({"name": "operation-1700000000000-start", "status": "RUNNING"}));
    });
    let poll = server.mock(|when, then| {
        when.method(GET).path(
            "/compute/v1/projects/acme-prod/zones/us-central1-a/operations/operation-1700000000000-start",
        );
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({"name": "operation-1700000000000-start", "status": "DONE"}));
    });

    let api = GceClient::new(
        &config.endpoint,
        Arc::new(StaticTokenProvider::new("integration-token")),
    )
    .unwrap();
    let console = Arc::new(BufferConsole::new());
    let controller = InstanceController::new(config, Arc::new(api))
        .with_console(console.clone())
        .with_poll_policy(PollPolicy {
            interval: Duration::from_millis(10),
            max_wait: Some(Duration::from_secs(5)),
        });

    let outcome = controller.start("8812").await;

    // The mock keeps reporting TERMINATED; the controller reports what it reads.
    assert_eq!(
        outcome,
        StartOutcome::Started {
            status: "TERMINATED".to_string()
        }
    );
    start.assert();
    poll.assert();
    assert!(console.contains("Current instance status: TERMINATED"));
    assert!(console.contains("Start operation initiated: operation-1700000000000-start"));
}

#[tokio::test]
async fn test_start_over_http_reports_missing_instance() {
    let server = MockServer::start_async().await;
    let key = NamedTempFile::new().unwrap();
    let config = load_config(&key, &server.base_url());

    server.mock(|when, then| {
        when.method(GET)
            .path("/compute/v1/projects/acme-prod/zones/us-central1-a/instances/batch-runner");
        then.status(404)
            .header("content-type", "application/json")
            .json_body(json!({"error": {"code": 404, "message": "The resource 'batch-runner' was not found"}}));
    });

    let api = GceClient::new(&config.endpoint, Arc::new(StaticTokenProvider::new("t"))).unwrap();
    let console = Arc::new(BufferConsole::new());
    let controller = InstanceController::new(config, Arc::new(api)).with_console(console.clone());

    match controller.start("8812").await {
        StartOutcome::Failed { message, .. } => {
            assert!(message.contains("was not found"));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(console.contains("Error starting instance: "));
}
