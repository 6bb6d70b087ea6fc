//! Environment-backed configuration.
//!
//! [`ComputeConfig`] is strict: every `GCP_*` setting plus the credentials path
//! must be present before the lifecycle controller touches the API.
//! [`ReplicationConfig`] has defaults for everything and can be overridden
//! with `CLOUDHAND_*` variables.
//!
//! Both are read once at startup and handed to their component by value.

pub mod error;

#[cfg(test)]
mod tests;

pub use error::ConfigError;

use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::compute::{InstanceIdentity, PollPolicy};
use crate::constants::{
    COMPUTE_ENDPOINT, DEFAULT_DESTINATION_BUCKET, DEFAULT_DESTINATION_OBJECT,
    DEFAULT_LOCAL_STORAGE_ROOT, DEFAULT_OPERATION_TIMEOUT, DEFAULT_POLL_INTERVAL, DEFAULT_PORT,
    STORAGE_ENDPOINT,
};
use crate::replication::ObjectLocation;

/// Settings for the instance lifecycle controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputeConfig {
    pub zone: String,
    pub project: String,
    /// Image family resolved to its latest image on `create`.
    pub image_family: String,
    pub image_project: String,
    pub machine_type: String,
    pub instance_name: String,
    pub vpc_network: String,
    pub vpc_subnet: String,
    /// Service account key file, `~` already expanded.
    pub credentials_path: PathBuf,
    /// Delay between zone-operation polls. Default: 5s.
    pub poll_interval: Duration,
    /// Give up waiting on an operation after this long. `None` waits forever.
    pub operation_timeout: Option<Duration>,
    /// Compute Engine API root. Default: [`COMPUTE_ENDPOINT`].
    pub endpoint: String,
}

impl ComputeConfig {
    pub const ENV_ZONE: &'static str = "GCP_ZONE";
    pub const ENV_PROJECT_ID: &'static str = "GCP_PROJECT_ID";
    pub const ENV_IMAGE_NAME: &'static str = "GCP_IMAGE_NAME";
    pub const ENV_IMAGE_PROJECT: &'static str = "GCP_IMAGE_PROJECT";
    pub const ENV_INSTANCE_TYPE: &'static str = "GCP_INSTANCE_TYPE";
    pub const ENV_INSTANCE_NAME: &'static str = "GCP_INSTANCE_NAME";
    pub const ENV_VPC_NETWORK: &'static str = "GCP_VPC_NETWORK";
    pub const ENV_VPC_SUBNET: &'static str = "GCP_VPC_SUBNET";
    pub const ENV_CREDENTIALS: &'static str = "GOOGLE_APPLICATION_CREDENTIALS";
    pub const ENV_POLL_SECS: &'static str = "GCP_OPERATION_POLL_SECS";
    pub const ENV_TIMEOUT_SECS: &'static str = "GCP_OPERATION_TIMEOUT_SECS";
    pub const ENV_ENDPOINT: &'static str = "GCP_COMPUTE_ENDPOINT";

    /// Required settings, in the order they are reported when missing.
    pub const REQUIRED: [&'static str; 9] = [
        Self::ENV_ZONE,
        Self::ENV_PROJECT_ID,
        Self::ENV_IMAGE_NAME,
        Self::ENV_IMAGE_PROJECT,
        Self::ENV_INSTANCE_TYPE,
        Self::ENV_INSTANCE_NAME,
        Self::ENV_VPC_NETWORK,
        Self::ENV_VPC_SUBNET,
        Self::ENV_CREDENTIALS,
    ];

    /// Reads and validates the configuration in one step.
    ///
    /// This is the startup gate: no API call may happen unless it succeeds.
    pub fn load() -> Result<Self, ConfigError> {
        let config = Self::from_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from environment variables (does not touch the filesystem).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |name: &str| non_empty(lookup(name));

        let missing: Vec<&'static str> = Self::REQUIRED
            .iter()
            .copied()
            .filter(|name| value(name).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::MissingEnvVars { names: missing });
        }

        let required = |name: &'static str| {
            value(name).ok_or(ConfigError::MissingEnvVars { names: vec![name] })
        };

        let credentials = required(Self::ENV_CREDENTIALS)?;
        let credentials_path = expand_home(&credentials, lookup("HOME").as_deref());

        let poll_interval = parse_secs(&lookup, Self::ENV_POLL_SECS)?
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_POLL_INTERVAL);

        let operation_timeout = match parse_secs(&lookup, Self::ENV_TIMEOUT_SECS)? {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => Some(DEFAULT_OPERATION_TIMEOUT),
        };

        Ok(Self {
            zone: required(Self::ENV_ZONE)?,
            project: required(Self::ENV_PROJECT_ID)?,
            image_family: required(Self::ENV_IMAGE_NAME)?,
            image_project: required(Self::ENV_IMAGE_PROJECT)?,
            machine_type: required(Self::ENV_INSTANCE_TYPE)?,
            instance_name: required(Self::ENV_INSTANCE_NAME)?,
            vpc_network: required(Self::ENV_VPC_NETWORK)?,
            vpc_subnet: required(Self::ENV_VPC_SUBNET)?,
            credentials_path,
            poll_interval,
            operation_timeout,
            endpoint: value(Self::ENV_ENDPOINT).unwrap_or_else(|| COMPUTE_ENDPOINT.to_string()),
        })
    }

    /// Checks that the credentials file resolves on disk.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_file(&self.credentials_path)
    }

    /// The single instance every lifecycle call targets.
    pub fn identity(&self) -> InstanceIdentity {
        InstanceIdentity {
            project: self.project.clone(),
            zone: self.zone.clone(),
            instance: self.instance_name.clone(),
        }
    }

    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: self.poll_interval,
            max_wait: self.operation_timeout,
        }
    }
}

/// Which [`ObjectStore`](crate::replication::ObjectStore) backs the trigger.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StorageProviderType {
    #[default]
    /// Google Cloud Storage JSON API.
    Gcs,
    /// Local directory per bucket.
    Local,
}

impl std::str::FromStr for StorageProviderType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gcs" | "gcp" | "google" => Ok(Self::Gcs),
            "local" => Ok(Self::Local),
            _ => Err(ConfigError::UnknownStorageProvider {
                value: s.to_string(),
            }),
        }
    }
}

/// Settings for the object replication trigger and its HTTP host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicationConfig {
    /// Every copy lands here, overwriting the previous object.
    pub destination_bucket: String,
    pub destination_object: String,
    pub storage_provider: StorageProviderType,
    /// Root directory for [`StorageProviderType::Local`]; one sub-directory per bucket.
    pub local_storage_root: PathBuf,
    /// Cloud Storage API root. Default: [`STORAGE_ENDPOINT`].
    pub storage_endpoint: String,
    /// Service account key file. When unset, tokens come from the metadata server.
    pub credentials_path: Option<PathBuf>,
    /// IP address to bind to. Default: `0.0.0.0`.
    pub bind_addr: IpAddr,
    /// HTTP port. Default: `8080` (or `PORT`, as set by the serverless runtime).
    pub port: u16,
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        Self {
            destination_bucket: DEFAULT_DESTINATION_BUCKET.to_string(),
            destination_object: DEFAULT_DESTINATION_OBJECT.to_string(),
            storage_provider: StorageProviderType::default(),
            local_storage_root: PathBuf::from(DEFAULT_LOCAL_STORAGE_ROOT),
            storage_endpoint: STORAGE_ENDPOINT.to_string(),
            credentials_path: None,
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
        }
    }
}

impl ReplicationConfig {
    pub const ENV_DESTINATION_BUCKET: &'static str = "CLOUDHAND_DESTINATION_BUCKET";
    pub const ENV_DESTINATION_OBJECT: &'static str = "CLOUDHAND_DESTINATION_OBJECT";
    pub const ENV_STORAGE_PROVIDER: &'static str = "CLOUDHAND_STORAGE_PROVIDER";
    pub const ENV_LOCAL_STORAGE_ROOT: &'static str = "CLOUDHAND_LOCAL_STORAGE_ROOT";
    pub const ENV_STORAGE_ENDPOINT: &'static str = "GCS_ENDPOINT";
    pub const ENV_CREDENTIALS: &'static str = "GOOGLE_APPLICATION_CREDENTIALS";
    pub const ENV_BIND_ADDR: &'static str = "CLOUDHAND_BIND_ADDR";
    pub const ENV_PORT: &'static str = "PORT";

    /// Loads config from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let value = |name: &str| non_empty(lookup(name));

        let storage_provider = match value(Self::ENV_STORAGE_PROVIDER) {
            Some(raw) => raw.parse()?,
            None => defaults.storage_provider,
        };

        let port = match value(Self::ENV_PORT) {
            Some(raw) => parse_port(raw)?,
            None => defaults.port,
        };

        let bind_addr = match value(Self::ENV_BIND_ADDR) {
            Some(raw) => raw
                .parse()
                .map_err(|source| ConfigError::InvalidBindAddr { value: raw, source })?,
            None => defaults.bind_addr,
        };

        let home = lookup("HOME");
        let credentials_path =
            value(Self::ENV_CREDENTIALS).map(|raw| expand_home(&raw, home.as_deref()));

        Ok(Self {
            destination_bucket: value(Self::ENV_DESTINATION_BUCKET)
                .unwrap_or(defaults.destination_bucket),
            destination_object: value(Self::ENV_DESTINATION_OBJECT)
                .unwrap_or(defaults.destination_object),
            storage_provider,
            local_storage_root: value(Self::ENV_LOCAL_STORAGE_ROOT)
                .map(PathBuf::from)
                .unwrap_or(defaults.local_storage_root),
            storage_endpoint: value(Self::ENV_STORAGE_ENDPOINT)
                .unwrap_or(defaults.storage_endpoint),
            credentials_path,
            bind_addr,
            port,
        })
    }

    /// Validates paths and basic invariants (does not create directories).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(ref path) = self.credentials_path {
            require_file(path)?;
        }

        if self.storage_provider == StorageProviderType::Local
            && self.local_storage_root.exists()
            && !self.local_storage_root.is_dir()
        {
            return Err(ConfigError::NotADirectory {
                path: self.local_storage_root.clone(),
            });
        }

        Ok(())
    }

    /// The fixed copy target.
    pub fn destination(&self) -> ObjectLocation {
        ObjectLocation::new(&self.destination_bucket, &self.destination_object)
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
}

fn parse_secs<F>(lookup: &F, name: &'static str) -> Result<Option<u64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match non_empty(lookup(name)) {
        Some(value) => value
            .parse::<u64>()
            .map(Some)
            .map_err(|source| ConfigError::InvalidNumber {
                name,
                value,
                source,
            }),
        None => Ok(None),
    }
}

fn parse_port(value: String) -> Result<u16, ConfigError> {
    let port: u16 = value.parse().map_err(|e| ConfigError::PortParseError {
        value: value.clone(),
        source: e,
    })?;

    if port == 0 {
        return Err(ConfigError::InvalidPort { value });
    }

    Ok(port)
}

fn require_file(path: &Path) -> Result<(), ConfigError> {
    if !path.exists() {
        return Err(ConfigError::CredentialsNotFound {
            path: path.to_path_buf(),
        });
    }
    if !path.is_file() {
        return Err(ConfigError::NotAFile {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

/// Expands a leading `~` the way a shell would.
pub(crate) fn expand_home(raw: &str, home: Option<&str>) -> PathBuf {
    match (raw.strip_prefix('~'), home) {
        (Some(""), Some(home)) => PathBuf::from(home),
        (Some(rest), Some(home)) if rest.starts_with('/') => {
            PathBuf::from(home).join(rest.trim_start_matches('/'))
        }
        _ => PathBuf::from(raw),
    }
}
