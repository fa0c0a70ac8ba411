//! Pool DTOs
//!
//! The management plane nests pool attributes under `properties`; these
//! types mirror that layout and convert into the flat domain `Pool`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::pool::{AllocationState, Pool};

/// Pool as returned by the management plane
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolResource {
    pub name: String,
    pub properties: PoolProperties,
}

/// Pool attributes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolProperties {
    #[serde(default)]
    pub vm_size: String,
    pub allocation_state: AllocationState,
    #[serde(default)]
    pub provisioning_state: Option<String>,
    #[serde(default)]
    pub current_dedicated_nodes: u32,
    #[serde(default)]
    pub current_low_priority_nodes: u32,
    #[serde(default)]
    pub scale_settings: Option<ScaleSettings>,
    #[serde(default)]
    pub allocation_state_transition_time: Option<DateTime<Utc>>,
}

impl From<PoolResource> for Pool {
    fn from(resource: PoolResource) -> Self {
        let props = resource.properties;
        let fixed = props
            .scale_settings
            .and_then(|settings| settings.fixed_scale)
            .unwrap_or_default();

        Pool {
            name: resource.name,
            vm_size: props.vm_size,
            allocation_state: props.allocation_state,
            provisioning_state: props.provisioning_state,
            current_dedicated_nodes: props.current_dedicated_nodes,
            current_low_priority_nodes: props.current_low_priority_nodes,
            target_dedicated_nodes: fixed.target_dedicated_nodes,
            target_low_priority_nodes: fixed.target_low_priority_nodes,
            allocation_state_transition_time: props.allocation_state_transition_time,
        }
    }
}

/// Scale settings of a pool
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleSettings {
    #[serde(default)]
    pub fixed_scale: Option<FixedScale>,
}

/// Fixed node counts
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixedScale {
    #[serde(default)]
    pub target_dedicated_nodes: u32,
    #[serde(default)]
    pub target_low_priority_nodes: u32,
}

/// Request to create a pool
///
/// The image and node agent are passed through untouched; the service
/// validates them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePool {
    pub properties: CreatePoolProperties,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePoolProperties {
    pub vm_size: String,
    pub deployment_configuration: DeploymentConfiguration,
    pub scale_settings: ScaleSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentConfiguration {
    pub virtual_machine_configuration: VirtualMachineConfiguration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineConfiguration {
    pub image_reference: ImageReference,
    pub node_agent_sku_id: String,
}

/// Marketplace image reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageReference {
    pub publisher: String,
    pub offer: String,
    pub sku: String,
    pub version: String,
}

impl CreatePool {
    /// Builds a fixed-scale pool creation request
    pub fn new(
        vm_size: impl Into<String>,
        image_reference: ImageReference,
        node_agent_sku_id: impl Into<String>,
        target_dedicated_nodes: u32,
        target_low_priority_nodes: u32,
    ) -> Self {
        Self {
            properties: CreatePoolProperties {
                vm_size: vm_size.into(),
                deployment_configuration: DeploymentConfiguration {
                    virtual_machine_configuration: VirtualMachineConfiguration {
                        image_reference,
                        node_agent_sku_id: node_agent_sku_id.into(),
                    },
                },
                scale_settings: ScaleSettings {
                    fixed_scale: Some(FixedScale {
                        target_dedicated_nodes,
                        target_low_priority_nodes,
                    }),
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_resource_flattens() {
        let json = r#"{
            "name": "arm-pool-1a2b3c4d",
            "properties": {
                "vmSize": "STANDARD_A1_V2",
                "allocationState": "Resizing",
                "provisioningState": "Succeeded",
                "currentDedicatedNodes": 0,
                "currentLowPriorityNodes": 1,
                "scaleSettings": { "fixedScale": { "targetDedicatedNodes": 1, "targetLowPriorityNodes": 2 } }
            }
        }"#;

        let pool: Pool = serde_json::from_str::<PoolResource>(json).unwrap().into();
        assert_eq!(pool.name, "arm-pool-1a2b3c4d");
        assert_eq!(pool.allocation_state, AllocationState::Resizing);
        assert_eq!(pool.current_low_priority_nodes, 1);
        assert_eq!(pool.target_dedicated_nodes, 1);
        assert_eq!(pool.target_low_priority_nodes, 2);
    }

    #[test]
    fn test_create_pool_body() {
        let req = CreatePool::new(
            "STANDARD_A1_V2",
            ImageReference {
                publisher: "Canonical".to_string(),
                offer: "UbuntuServer".to_string(),
                sku: "18.04-LTS".to_string(),
                version: "latest".to_string(),
            },
            "batch.node.ubuntu 18.04",
            1,
            2,
        );

        let value = serde_json::to_value(&req).unwrap();
        let props = &value["properties"];
        assert_eq!(props["vmSize"], "STANDARD_A1_V2");
        assert_eq!(
            props["deploymentConfiguration"]["virtualMachineConfiguration"]["nodeAgentSkuId"],
            "batch.node.ubuntu 18.04"
        );
        assert_eq!(props["scaleSettings"]["fixedScale"]["targetLowPriorityNodes"], 2);
    }
}
