//! Job DTOs

use serde::{Deserialize, Serialize};

use crate::domain::job::PoolInfo;

/// Request to create a job bound to a pool
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJob {
    pub id: String,
    pub pool_info: PoolInfo,
}

impl CreateJob {
    pub fn new(id: impl Into<String>, pool_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            pool_info: PoolInfo {
                pool_id: pool_id.into(),
            },
        }
    }
}
