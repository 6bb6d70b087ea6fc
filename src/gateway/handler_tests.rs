use axum::{Router, body::Body, http::Request, http::StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

use crate::console::BufferConsole;
use crate::gateway::handler::parse_event;
use crate::gateway::{CLOUDHAND_STATUS_HEADER, GatewayError, TriggerState, create_router_with_state};
use crate::replication::{
    LocalObjectStore, MockFailure, MockObjectStore, ObjectLocation, ReplicationTrigger,
    StorageObjectEvent,
};

fn router_with(store: Arc<MockObjectStore>) -> Router {
    let trigger = ReplicationTrigger::new(
        store,
        ObjectLocation::new("bucketdestinationtest", "agentes-IA.jpg"),
    )
    .with_console(Arc::new(BufferConsole::new()));
    create_router_with_state(TriggerState::new(trigger))
}

fn healthy_store() -> Arc<MockObjectStore> {
    Arc::new(
        MockObjectStore::new()
            .with_bucket("uploads")
            .with_bucket("bucketdestinationtest"),
    )
}

async fn post_event(router: &Router, body: Body) -> (StatusCode, Option<String>, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("content-type", "application/json")
        .header("ce-id", "1234567890")
        .header("ce-type", "google.cloud.storage.object.v1.finalized")
        .body(body)
        .unwrap();

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let header = response
        .headers()
        .get(CLOUDHAND_STATUS_HEADER)
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, header, json)
}

fn json_body(value: Value) -> Body {
    Body::from(serde_json::to_vec(&value).unwrap())
}

#[tokio::test]
async fn test_binary_mode_event_is_copied() {
    let store = healthy_store();
    let router = router_with(store.clone());

    let (status, header, body) = post_event(
        &router,
        json_body(json!({"bucket": "uploads", "name": "cat.jpg", "contentType": "image/jpeg"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(header.as_deref(), Some("copied"));
    assert_eq!(
        body,
        json!({
            "status": "copied",
            "source": "gs://uploads/cat.jpg",
            "destination": "gs://bucketdestinationtest/agentes-IA.jpg"
        })
    );
    assert_eq!(store.copies().len(), 1);
}

#[tokio::test]
async fn test_structured_mode_event_is_copied() {
    let store = healthy_store();
    let router = router_with(store.clone());

    let (status, _, body) = post_event(
        &router,
        json_body(json!({
            "specversion": "1.0",
            "id": "42",
            "data": {"bucket": "uploads", "name": "dog.jpg"}
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "gs://uploads/dog.jpg");
    assert_eq!(store.copies()[0].source, ObjectLocation::new("uploads", "dog.jpg"));
}

#[tokio::test]
async fn test_missing_bucket_is_handled() {
    let router = router_with(Arc::new(
        MockObjectStore::new().with_bucket("bucketdestinationtest"),
    ));

    let (status, header, body) = post_event(
        &router,
        json_body(json!({"bucket": "ghost", "name": "cat.jpg"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(header.as_deref(), Some("not_found"));
    assert_eq!(body["status"], "not_found");
}

#[tokio::test]
async fn test_forbidden_is_handled() {
    let store = Arc::new(
        MockObjectStore::new()
            .with_bucket("bucketdestinationtest")
            .failing_bucket("uploads", MockFailure::Forbidden),
    );
    let router = router_with(store);

    let (status, _, body) = post_event(
        &router,
        json_body(json!({"bucket": "uploads", "name": "cat.jpg"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "forbidden");
}

#[tokio::test]
async fn test_other_storage_failures_return_500() {
    let store = Arc::new(
        MockObjectStore::new()
            .with_bucket("uploads")
            .with_bucket("bucketdestinationtest")
            .failing_copy(MockFailure::Unavailable),
    );
    let router = router_with(store);

    let (status, header, body) = post_event(
        &router,
        json_body(json!({"bucket": "uploads", "name": "cat.jpg"})),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(header.as_deref(), Some("storage_error"));
    assert_eq!(body["code"], 500);
}

#[tokio::test]
async fn test_malformed_payloads_return_400() {
    let store = healthy_store();
    let router = router_with(store.clone());

    for body in [
        Body::from("not json"),
        json_body(json!({"name": "cat.jpg"})),
        json_body(json!([1, 2, 3])),
    ] {
        let (status, header, body) = post_event(&router, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(header.as_deref(), Some("invalid_request"));
        assert!(body["error"].as_str().unwrap().starts_with("invalid request"));
    }
    assert!(store.copies().is_empty());
}

#[tokio::test]
async fn test_unusable_bucket_names_return_400() {
    let root = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(root.path().join("bucketdestinationtest")).unwrap();
    let trigger = ReplicationTrigger::new(
        Arc::new(LocalObjectStore::new(root.path())),
        ObjectLocation::new("bucketdestinationtest", "agentes-IA.jpg"),
    )
    .with_console(Arc::new(BufferConsole::new()));
    let router = create_router_with_state(TriggerState::new(trigger));

    for bucket in ["../secret", "/etc"] {
        let (status, header, body) = post_event(
            &router,
            json_body(json!({"bucket": bucket, "name": "passwd"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "bucket {bucket:?}");
        assert_eq!(header.as_deref(), Some("invalid_request"));
        assert_eq!(body["code"], 400);
    }
    assert!(!root.path().join("bucketdestinationtest/agentes-IA.jpg").exists());
}

#[tokio::test]
async fn test_double_delivery_copies_twice() {
    let store = healthy_store();
    let router = router_with(store.clone());
    let event = json!({"bucket": "uploads", "name": "cat.jpg"});

    for _ in 0..2 {
        let (status, _, _) = post_event(&router, json_body(event.clone())).await;
        assert_eq!(status, StatusCode::OK);
    }

    let copies = store.copies();
    assert_eq!(copies.len(), 2);
    assert_eq!(copies[0], copies[1]);
}

#[tokio::test]
async fn test_health_endpoint() {
    let router = router_with(healthy_store());
    let request = Request::builder()
        .uri("/healthz")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "ok");
}

#[test]
fn test_parse_event_maps_errors() {
    assert_eq!(
        parse_event(br#"{"bucket":"b","name":"o"}"#).unwrap(),
        StorageObjectEvent::new("b", "o")
    );
    assert!(matches!(
        parse_event(b"{").unwrap_err(),
        GatewayError::InvalidRequest(_)
    ));
}
