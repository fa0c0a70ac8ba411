//! Task DTOs
//!
//! Bulk task creation goes through a single "add collection" call that
//! accepts a bounded number of specs and returns one result per spec.

use serde::{Deserialize, Serialize};

use crate::domain::task::{TaskAddResult, TaskSpec};

/// Most tasks the service accepts in one add-collection call
pub const MAX_TASKS_PER_COLLECTION: usize = 100;

/// Request body of an add-collection call
#[derive(Debug, Clone, Serialize)]
pub struct AddTaskCollection<'a> {
    pub value: &'a [TaskSpec],
}

/// Response body of an add-collection call
#[derive(Debug, Clone, Deserialize)]
pub struct AddTaskCollectionResult {
    #[serde(default)]
    pub value: Vec<TaskAddResult>,
}
