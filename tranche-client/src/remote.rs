//! Protocol capability adapters
//!
//! Thin wrappers that expose client endpoints through the capability traits
//! of `tranche_protocol::remote`, so the client can drive a `PageWalker`,
//! `ChunkedSubmitter` or `StatePoller`.

use std::collections::HashMap;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde_json::json;
use tranche_core::domain::job::Job;
use tranche_core::domain::page::{Cursor, Page};
use tranche_core::domain::pool::{AllocationState, Pool};
use tranche_core::domain::state::ResourceState;
use tranche_core::domain::task::{Task, TaskAddResult, TaskSpec};
use tranche_protocol::remote::{BatchSink, PageSource, StateSource};

use crate::PoolServiceClient;

/// Follows job listing cursors
#[derive(Debug, Clone, Copy)]
pub struct JobPages<'a> {
    client: &'a PoolServiceClient,
}

/// Follows task listing cursors
#[derive(Debug, Clone, Copy)]
pub struct TaskPages<'a> {
    client: &'a PoolServiceClient,
}

/// Follows pool listing cursors
#[derive(Debug, Clone, Copy)]
pub struct PoolPages<'a> {
    client: &'a PoolServiceClient,
}

/// Adds task batches to one job
#[derive(Debug, Clone)]
pub struct TaskCollectionSink<'a> {
    client: &'a PoolServiceClient,
    job_id: String,
}

/// Reports the allocation state of pools
#[derive(Debug, Clone, Copy)]
pub struct PoolAllocation<'a> {
    client: &'a PoolServiceClient,
}

impl PoolServiceClient {
    pub fn job_pages(&self) -> JobPages<'_> {
        JobPages { client: self }
    }

    pub fn task_pages(&self) -> TaskPages<'_> {
        TaskPages { client: self }
    }

    pub fn pool_pages(&self) -> PoolPages<'_> {
        PoolPages { client: self }
    }

    pub fn task_sink(&self, job_id: impl Into<String>) -> TaskCollectionSink<'_> {
        TaskCollectionSink {
            client: self,
            job_id: job_id.into(),
        }
    }

    pub fn pool_allocation(&self) -> PoolAllocation<'_> {
        PoolAllocation { client: self }
    }
}

#[async_trait]
impl PageSource<Job> for JobPages<'_> {
    async fn fetch_next(&self, cursor: &Cursor) -> Result<Page<Job>> {
        Ok(self.client.list_jobs_next(cursor).await?)
    }
}

#[async_trait]
impl PageSource<Task> for TaskPages<'_> {
    async fn fetch_next(&self, cursor: &Cursor) -> Result<Page<Task>> {
        Ok(self.client.list_tasks_next(cursor).await?)
    }
}

#[async_trait]
impl PageSource<Pool> for PoolPages<'_> {
    async fn fetch_next(&self, cursor: &Cursor) -> Result<Page<Pool>> {
        Ok(self.client.list_pools_next(cursor).await?)
    }
}

#[async_trait]
impl BatchSink<TaskSpec> for TaskCollectionSink<'_> {
    type Ack = TaskAddResult;

    async fn submit(&self, batch: &[TaskSpec]) -> Result<Vec<TaskAddResult>> {
        let results = self.client.add_task_collection(&self.job_id, batch).await?;
        order_by_batch(batch, results)
    }
}

/// Puts add-collection results back into batch order
///
/// The service may answer in any order; every submitted task must have
/// exactly one result.
fn order_by_batch(batch: &[TaskSpec], results: Vec<TaskAddResult>) -> Result<Vec<TaskAddResult>> {
    if results.len() != batch.len() {
        return Err(anyhow!(
            "Expected {} task result(s), got {}",
            batch.len(),
            results.len()
        ));
    }

    let mut by_id: HashMap<String, TaskAddResult> = results
        .into_iter()
        .map(|result| (result.task_id.clone(), result))
        .collect();

    batch
        .iter()
        .map(|spec| {
            by_id
                .remove(&spec.id)
                .ok_or_else(|| anyhow!("No result returned for task {}", spec.id))
        })
        .collect()
}

#[async_trait]
impl StateSource<AllocationState> for PoolAllocation<'_> {
    async fn fetch_state(&self, identifier: &str) -> Result<ResourceState<AllocationState>> {
        let pool = self.client.get_pool(identifier).await?;
        Ok(pool_state(pool))
    }
}

fn pool_state(pool: Pool) -> ResourceState<AllocationState> {
    let mut state = ResourceState::new(pool.name, pool.allocation_state)
        .with_metadata("vmSize", json!(pool.vm_size))
        .with_metadata("currentDedicatedNodes", json!(pool.current_dedicated_nodes))
        .with_metadata(
            "currentLowPriorityNodes",
            json!(pool.current_low_priority_nodes),
        );

    if let Some(provisioning) = pool.provisioning_state {
        state = state.with_metadata("provisioningState", json!(provisioning));
    }
    state
}
