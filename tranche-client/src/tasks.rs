//! Task-related API endpoints

use reqwest::Method;
use tranche_core::domain::page::{Cursor, Page};
use tranche_core::domain::task::{Task, TaskAddResult, TaskSpec};
use tranche_core::dto::list::ListResponse;
use tranche_core::dto::task::{AddTaskCollection, AddTaskCollectionResult, MAX_TASKS_PER_COLLECTION};

use crate::error::{ClientError, Result};
use crate::PoolServiceClient;

impl PoolServiceClient {
    // =============================================================================
    // Task Listing
    // =============================================================================

    /// List the first page of tasks of a job
    ///
    /// # Arguments
    /// * `job_id` - The job whose tasks to list
    /// * `max_results` - Page size requested from the service
    pub async fn list_tasks(&self, job_id: &str, max_results: u32) -> Result<Page<Task>> {
        let response = self
            .request(Method::GET, &["jobs", job_id, "tasks"])?
            .query(&[("maxresults", max_results)])
            .send()
            .await?;

        let list: ListResponse<Task> = self.handle_response(response).await?;
        Ok(list.into())
    }

    /// Fetch the task page a cursor points at
    pub async fn list_tasks_next(&self, cursor: &Cursor) -> Result<Page<Task>> {
        self.fetch_page(cursor).await
    }

    // =============================================================================
    // Bulk Task Creation
    // =============================================================================

    /// Add up to `MAX_TASKS_PER_COLLECTION` tasks to a job in one call
    ///
    /// The service answers with one result per task, not necessarily in
    /// request order. Larger sets go through `ChunkedSubmitter` with a
    /// `TaskCollectionSink`.
    pub async fn add_task_collection(
        &self,
        job_id: &str,
        tasks: &[TaskSpec],
    ) -> Result<Vec<TaskAddResult>> {
        if tasks.len() > MAX_TASKS_PER_COLLECTION {
            return Err(ClientError::InvalidRequest(format!(
                "{} tasks exceed the limit of {} per call",
                tasks.len(),
                MAX_TASKS_PER_COLLECTION
            )));
        }

        let response = self
            .request(Method::POST, &["jobs", job_id, "addtaskcollection"])?
            .json(&AddTaskCollection { value: tasks })
            .send()
            .await?;

        let result: AddTaskCollectionResult = self.handle_response(response).await?;
        Ok(result.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_oversized_collection_is_rejected_locally() {
        let client = PoolServiceClient::new("http://127.0.0.1:9");
        let tasks: Vec<TaskSpec> = (0..=MAX_TASKS_PER_COLLECTION)
            .map(|i| TaskSpec::new(format!("t-{}", i), "sleep 100"))
            .collect();

        let err = client.add_task_collection("job", &tasks).await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidRequest(_)));
    }
}
