//! Task domain types
//!
//! `TaskSpec` is the work item submitted in bulk; `TaskAddResult` is the
//! acknowledgement the service returns for each submitted spec.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::work_item::WorkItem;

/// Specification of a task to add to a job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSpec {
    pub id: String,
    pub command_line: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub environment_settings: Vec<EnvironmentSetting>,
}

impl TaskSpec {
    /// Creates a task spec with just an id and a command line
    pub fn new(id: impl Into<String>, command_line: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            command_line: command_line.into(),
            display_name: None,
            environment_settings: Vec::new(),
        }
    }

    /// Adds an environment variable to the task
    pub fn with_env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment_settings.push(EnvironmentSetting {
            name: name.into(),
            value: value.into(),
        });
        self
    }
}

impl WorkItem for TaskSpec {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Environment variable passed to a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentSetting {
    pub name: String,
    pub value: String,
}

/// A task as listed by the service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub command_line: String,
    #[serde(default)]
    pub state: TaskState,
    #[serde(default)]
    pub creation_time: Option<DateTime<Utc>>,
}

/// Task lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskState {
    #[default]
    Active,
    Preparing,
    Running,
    Completed,
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TaskState::Active => "active",
            TaskState::Preparing => "preparing",
            TaskState::Running => "running",
            TaskState::Completed => "completed",
            TaskState::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

/// Server acknowledgement for one submitted task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskAddResult {
    pub task_id: String,
    pub status: TaskAddStatus,
    #[serde(default, rename = "eTag")]
    pub etag: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub error: Option<ServiceError>,
}

impl TaskAddResult {
    /// Whether the service accepted the task
    pub fn is_success(&self) -> bool {
        self.status == TaskAddStatus::Success
    }
}

/// Outcome of adding a single task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskAddStatus {
    Success,
    ClientError,
    ServerError,
}

/// Error detail attached to a failed acknowledgement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceError {
    pub code: String,
    #[serde(default)]
    pub message: Option<ServiceErrorMessage>,
}

/// Localized error message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceErrorMessage {
    #[serde(default)]
    pub lang: Option<String>,
    pub value: String,
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{}: {}", self.code, message.value),
            None => write!(f, "{}", self.code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_spec_serializes_camel_case() {
        let spec = TaskSpec::new("job-1", "sleep 100").with_env("MODE", "fast");
        let value = serde_json::to_value(&spec).unwrap();

        assert_eq!(value["commandLine"], "sleep 100");
        assert_eq!(value["environmentSettings"][0]["name"], "MODE");
        assert!(value.get("displayName").is_none());
    }

    #[test]
    fn test_task_add_result_failure() {
        let json = r#"{
            "taskId": "job-7",
            "status": "clientError",
            "error": { "code": "TaskExists", "message": { "lang": "en-US", "value": "The task already exists." } }
        }"#;

        let ack: TaskAddResult = serde_json::from_str(json).unwrap();
        assert!(!ack.is_success());
        assert_eq!(
            ack.error.unwrap().to_string(),
            "TaskExists: The task already exists."
        );
    }

    #[test]
    fn test_work_item_id() {
        let spec = TaskSpec::new("job-3", "echo");
        assert_eq!(WorkItem::id(&spec), "job-3");
    }
}
