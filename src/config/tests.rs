use super::*;
use serial_test::serial;
use std::collections::HashMap;
use std::env;
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::NamedTempFile;

fn full_settings(credentials: &str) -> HashMap<String, String> {
    [
        ("GCP_ZONE", "europe-west1-b"),
        ("GCP_PROJECT_ID", "demo-project"),
        ("GCP_IMAGE_NAME", "debian-12"),
        ("GCP_IMAGE_PROJECT", "debian-cloud"),
        ("GCP_INSTANCE_TYPE", "e2-medium"),
        ("GCP_INSTANCE_NAME", "worker-1"),
        ("GCP_VPC_NETWORK", "projects/demo-project/global/networks/private"),
        (
            "GCP_VPC_SUBNET",
            "projects/demo-project/regions/europe-west1/subnetworks/private-a",
        ),
        ("GOOGLE_APPLICATION_CREDENTIALS", credentials),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

fn lookup_in(map: &HashMap<String, String>) -> impl Fn(&str) -> Option<String> + '_ {
    move |name| map.get(name).cloned()
}

fn with_env_vars<F, R>(vars: &[(&str, &str)], f: F) -> R
where
    F: FnOnce() -> R,
{
    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    for (key, value) in vars {
        unsafe { env::set_var(key, value) };
    }

    let result = f();

    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    for (key, _) in vars {
        unsafe { env::remove_var(key) };
    }

    result
}

#[test]
fn test_compute_config_accepts_complete_settings() {
    let key = NamedTempFile::new().unwrap();
    let settings = full_settings(key.path().to_str().unwrap());

    let config = ComputeConfig::from_lookup(lookup_in(&settings)).unwrap();
    config.validate().unwrap();

    assert_eq!(config.zone, "europe-west1-b");
    assert_eq!(config.project, "demo-project");
    assert_eq!(config.image_family, "debian-12");
    assert_eq!(config.image_project, "debian-cloud");
    assert_eq!(config.machine_type, "e2-medium");
    assert_eq!(config.instance_name, "worker-1");
    assert_eq!(config.credentials_path, key.path());
    assert_eq!(config.poll_interval, Duration::from_secs(5));
    assert_eq!(config.operation_timeout, Some(Duration::from_secs(600)));
    assert_eq!(config.endpoint, "https://compute.googleapis.com");
}

#[test]
fn test_compute_config_reports_every_missing_setting() {
    let mut settings = full_settings("/tmp/key.json");
    settings.remove("GCP_ZONE");
    settings.remove("GCP_VPC_SUBNET");
    settings.insert("GCP_INSTANCE_NAME".to_string(), "   ".to_string());

    let err = ComputeConfig::from_lookup(lookup_in(&settings)).unwrap_err();

    match &err {
        ConfigError::MissingEnvVars { names } => {
            assert_eq!(
                names,
                &vec!["GCP_ZONE", "GCP_INSTANCE_NAME", "GCP_VPC_SUBNET"]
            );
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let message = err.to_string();
    assert!(message.starts_with("Missing required environment variables:"));
    assert!(message.contains("\n  - GCP_ZONE"));
    assert!(message.contains("\n  - GCP_INSTANCE_NAME"));
    assert!(message.contains("\n  - GCP_VPC_SUBNET"));
}

#[test]
fn test_compute_config_with_nothing_set_lists_all_nine() {
    let err = ComputeConfig::from_lookup(|_| None).unwrap_err();
    match err {
        ConfigError::MissingEnvVars { names } => {
            assert_eq!(names, ComputeConfig::REQUIRED.to_vec());
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_compute_config_rejects_missing_credentials_file() {
    let settings = full_settings("/nonexistent/path/key.json");
    let config = ComputeConfig::from_lookup(lookup_in(&settings)).unwrap();

    let err = config.validate().unwrap_err();
    assert!(matches!(err, ConfigError::CredentialsNotFound { .. }));
    assert!(err.to_string().contains("/nonexistent/path/key.json"));
}

#[test]
fn test_compute_config_rejects_directory_as_credentials() {
    let dir = tempfile::tempdir().unwrap();
    let settings = full_settings(dir.path().to_str().unwrap());
    let config = ComputeConfig::from_lookup(lookup_in(&settings)).unwrap();

    assert!(matches!(
        config.validate().unwrap_err(),
        ConfigError::NotAFile { .. }
    ));
}

#[test]
fn test_compute_config_expands_home_in_credentials_path() {
    let mut settings = full_settings("~/keys/sa.json");
    settings.insert("HOME".to_string(), "/home/operator".to_string());

    let config = ComputeConfig::from_lookup(lookup_in(&settings)).unwrap();
    assert_eq!(
        config.credentials_path,
        PathBuf::from("/home/operator/keys/sa.json")
    );
}

#[test]
fn test_compute_config_poll_overrides() {
    let mut settings = full_settings("/tmp/key.json");
    settings.insert("GCP_OPERATION_POLL_SECS".to_string(), "2".to_string());
    settings.insert("GCP_OPERATION_TIMEOUT_SECS".to_string(), "0".to_string());

    let config = ComputeConfig::from_lookup(lookup_in(&settings)).unwrap();
    let policy = config.poll_policy();

    assert_eq!(policy.interval, Duration::from_secs(2));
    assert_eq!(policy.max_wait, None);
}

#[test]
fn test_compute_config_rejects_non_numeric_timeout() {
    let mut settings = full_settings("/tmp/key.json");
    settings.insert("GCP_OPERATION_TIMEOUT_SECS".to_string(), "soon".to_string());

    let err = ComputeConfig::from_lookup(lookup_in(&settings)).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::InvalidNumber {
            name: "GCP_OPERATION_TIMEOUT_SECS",
            ..
        }
    ));
}

#[test]
fn test_compute_config_identity() {
    let settings = full_settings("/tmp/key.json");
    let config = ComputeConfig::from_lookup(lookup_in(&settings)).unwrap();
    let identity = config.identity();

    assert_eq!(identity.project, "demo-project");
    assert_eq!(identity.zone, "europe-west1-b");
    assert_eq!(identity.instance, "worker-1");
}

#[test]
#[serial]
fn test_compute_config_from_env() {
    let key = NamedTempFile::new().unwrap();
    let settings = full_settings(key.path().to_str().unwrap());
    let vars: Vec<(&str, &str)> = settings
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();

    let config = with_env_vars(&vars, ComputeConfig::load).unwrap();
    assert_eq!(config.instance_name, "worker-1");
}

#[test]
fn test_replication_defaults() {
    let config = ReplicationConfig::from_lookup(|_| None).unwrap();

    assert_eq!(config, ReplicationConfig::default());
    assert_eq!(config.destination_bucket, "bucketdestinationtest");
    assert_eq!(config.destination_object, "agentes-IA.jpg");
    assert_eq!(config.storage_provider, StorageProviderType::Gcs);
    assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8080");
    assert!(config.credentials_path.is_none());
}

#[test]
fn test_replication_overrides() {
    let settings: HashMap<String, String> = [
        ("CLOUDHAND_DESTINATION_BUCKET", "archive"),
        ("CLOUDHAND_DESTINATION_OBJECT", "latest.jpg"),
        ("CLOUDHAND_STORAGE_PROVIDER", "LOCAL"),
        ("CLOUDHAND_LOCAL_STORAGE_ROOT", "/srv/buckets"),
        ("CLOUDHAND_BIND_ADDR", "127.0.0.1"),
        ("PORT", "9090"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    let config = ReplicationConfig::from_lookup(lookup_in(&settings)).unwrap();

    assert_eq!(config.storage_provider, StorageProviderType::Local);
    assert_eq!(config.local_storage_root, PathBuf::from("/srv/buckets"));
    assert_eq!(
        config.bind_addr,
        IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1))
    );
    assert_eq!(config.port, 9090);

    let destination = config.destination();
    assert_eq!(destination.bucket, "archive");
    assert_eq!(destination.object, "latest.jpg");
}

#[test]
fn test_replication_socket_addr_with_ipv6_bind() {
    let settings: HashMap<String, String> = [("CLOUDHAND_BIND_ADDR", "::"), ("PORT", "8080")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    let config = ReplicationConfig::from_lookup(lookup_in(&settings)).unwrap();
    let addr = config.socket_addr();

    assert!(addr.is_ipv6());
    assert_eq!(addr.port(), 8080);
    assert_eq!(addr.to_string(), "[::]:8080");
}

#[test]
fn test_replication_rejects_bad_port_and_provider() {
    let bad_port = |name: &str| (name == "PORT").then(|| "0".to_string());
    assert!(matches!(
        ReplicationConfig::from_lookup(bad_port).unwrap_err(),
        ConfigError::InvalidPort { .. }
    ));

    let unparsable = |name: &str| (name == "PORT").then(|| "eighty".to_string());
    assert!(matches!(
        ReplicationConfig::from_lookup(unparsable).unwrap_err(),
        ConfigError::PortParseError { .. }
    ));

    let provider = |name: &str| (name == "CLOUDHAND_STORAGE_PROVIDER").then(|| "s3".to_string());
    assert!(matches!(
        ReplicationConfig::from_lookup(provider).unwrap_err(),
        ConfigError::UnknownStorageProvider { .. }
    ));
}

#[test]
fn test_replication_validate_checks_credentials_and_local_root() {
    let mut config = ReplicationConfig {
        credentials_path: Some(PathBuf::from("/nonexistent/sa.json")),
        ..ReplicationConfig::default()
    };
    assert!(matches!(
        config.validate().unwrap_err(),
        ConfigError::CredentialsNotFound { .. }
    ));

    let file = NamedTempFile::new().unwrap();
    config.credentials_path = None;
    config.storage_provider = StorageProviderType::Local;
    config.local_storage_root = file.path().to_path_buf();
    assert!(matches!(
        config.validate().unwrap_err(),
        ConfigError::NotADirectory { .. }
    ));
}

#[test]
fn test_expand_home_leaves_other_paths_alone() {
    assert_eq!(
        expand_home("/etc/key.json", Some("/root")),
        PathBuf::from("/etc/key.json")
    );
    assert_eq!(expand_home("~", Some("/root")), PathBuf::from("/root"));
    assert_eq!(expand_home("~/k.json", None), PathBuf::from("~/k.json"));
    assert_eq!(expand_home("~other/k", Some("/root")), PathBuf::from("~other/k"));
}
