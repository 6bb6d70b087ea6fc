//! Insert body for `instances.insert`.

use serde::Serialize;

use crate::config::ComputeConfig;
use crate::constants::{DEFAULT_SERVICE_ACCOUNT, LOGGING_WRITE_SCOPE, STORAGE_READ_WRITE_SCOPE};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceTemplate {
    pub name: String,
    pub machine_type: String,
    pub disks: Vec<AttachedDisk>,
    pub network_interfaces: Vec<NetworkInterface>,
    pub service_accounts: Vec<ServiceAccount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachedDisk {
    pub boot: bool,
    pub auto_delete: bool,
    pub initialize_params: InitializeParams,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    pub source_image: String,
}

/// Private NIC: no `accessConfigs`, so no external address is assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkInterface {
    pub network: String,
    pub subnetwork: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceAccount {
    pub email: String,
    pub scopes: Vec<String>,
}

/// Builds the template for the configured instance from a resolved image `selfLink`.
pub fn build_instance_template(config: &ComputeConfig, source_image: &str) -> InstanceTemplate {
    InstanceTemplate {
        name: config.instance_name.clone(),
        machine_type: format!("zones/{}/machineTypes/{}", config.zone, config.machine_type),
        disks: vec![AttachedDisk {
            boot: true,
            auto_delete: true,
            initialize_params: InitializeParams {
                source_image: source_image.to_string(),
            },
        }],
        network_interfaces: vec![NetworkInterface {
            network: config.vpc_network.clone(),
            subnetwork: config.vpc_subnet.clone(),
        }],
        service_accounts: vec![ServiceAccount {
            email: DEFAULT_SERVICE_ACCOUNT.to_string(),
            scopes: vec![
                STORAGE_READ_WRITE_SCOPE.to_string(),
                LOGGING_WRITE_SCOPE.to_string(),
            ],
        }],
    }
}
