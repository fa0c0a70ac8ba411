//! Job domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A job on the compute-pool service
///
/// Jobs group tasks and are bound to the pool that runs them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub state: JobState,
    #[serde(default)]
    pub pool_info: Option<PoolInfo>,
    #[serde(default)]
    pub creation_time: Option<DateTime<Utc>>,
}

impl Job {
    /// Id of the pool this job is bound to, if any
    pub fn pool_id(&self) -> Option<&str> {
        self.pool_info.as_ref().map(|info| info.pool_id.as_str())
    }
}

/// Pool binding of a job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolInfo {
    pub pool_id: String,
}

/// Job lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JobState {
    #[default]
    Active,
    Disabling,
    Disabled,
    Enabling,
    Terminating,
    Completed,
    Deleting,
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobState::Active => "active",
            JobState::Disabling => "disabling",
            JobState::Disabled => "disabled",
            JobState::Enabling => "enabling",
            JobState::Terminating => "terminating",
            JobState::Completed => "completed",
            JobState::Deleting => "deleting",
            JobState::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_deserializes_service_shape() {
        let json = r#"{
            "id": "testbejob1",
            "state": "active",
            "poolInfo": { "poolId": "pool1" },
            "creationTime": "2020-05-01T10:00:00Z"
        }"#;

        let job: Job = serde_json::from_str(json).unwrap();
        assert_eq!(job.id, "testbejob1");
        assert_eq!(job.state, JobState::Active);
        assert_eq!(job.pool_id(), Some("pool1"));
        assert!(job.creation_time.is_some());
    }

    #[test]
    fn test_unknown_job_state() {
        let job: Job = serde_json::from_str(r#"{"id": "j", "state": "archived"}"#).unwrap();
        assert_eq!(job.state, JobState::Unknown);
    }
}
