//! Pool domain model
//!
//! Represents a pool of compute nodes. Pools are provisioned
//! asynchronously: after creation the allocation state moves through
//! `Resizing` before it settles in `Steady`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A pool of compute nodes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pool {
    /// Pool name, unique within the account
    pub name: String,

    /// Virtual machine size of the nodes
    pub vm_size: String,

    /// Current allocation state
    pub allocation_state: AllocationState,

    /// Provisioning state reported by the management plane
    pub provisioning_state: Option<String>,

    pub current_dedicated_nodes: u32,
    pub current_low_priority_nodes: u32,
    pub target_dedicated_nodes: u32,
    pub target_low_priority_nodes: u32,

    /// When the allocation state last changed
    pub allocation_state_transition_time: Option<DateTime<Utc>>,
}

/// Allocation state of a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AllocationState {
    /// The pool has reached its target size
    Steady,

    /// Nodes are being added or removed
    Resizing,

    /// A resize is being stopped
    Stopping,

    /// A state this client does not know about
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for AllocationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AllocationState::Steady => write!(f, "Steady"),
            AllocationState::Resizing => write!(f, "Resizing"),
            AllocationState::Stopping => write!(f, "Stopping"),
            AllocationState::Unknown => write!(f, "Unknown"),
        }
    }
}

impl FromStr for AllocationState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "steady" => Ok(AllocationState::Steady),
            "resizing" => Ok(AllocationState::Resizing),
            "stopping" => Ok(AllocationState::Stopping),
            other => Err(format!("unknown allocation state '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unrecognised_allocation_state() {
        let state: AllocationState = serde_json::from_str("\"Rebalancing\"").unwrap();
        assert_eq!(state, AllocationState::Unknown);
    }

    #[test]
    fn test_allocation_state_parse() {
        assert_eq!("Steady".parse::<AllocationState>(), Ok(AllocationState::Steady));
        assert_eq!("resizing".parse::<AllocationState>(), Ok(AllocationState::Resizing));
        assert!("idle".parse::<AllocationState>().is_err());
        assert!("unknown".parse::<AllocationState>().is_err());
    }

    #[test]
    fn test_allocation_state_display_round_trips() {
        let state = AllocationState::Stopping;
        assert_eq!(state.to_string().parse::<AllocationState>(), Ok(state));
    }
}
