//! Job-related API endpoints

use reqwest::Method;
use tranche_core::domain::job::Job;
use tranche_core::domain::page::{Cursor, Page};
use tranche_core::dto::job::CreateJob;
use tranche_core::dto::list::ListResponse;

use crate::error::Result;
use crate::PoolServiceClient;

impl PoolServiceClient {
    // =============================================================================
    // Job Listing
    // =============================================================================

    /// List the first page of jobs
    ///
    /// # Arguments
    /// * `max_results` - Page size requested from the service
    ///
    /// # Returns
    /// The first page; follow its cursor with `list_jobs_next` or a `PageWalker`
    pub async fn list_jobs(&self, max_results: u32) -> Result<Page<Job>> {
        let response = self
            .request(Method::GET, &["jobs"])?
            .query(&[("maxresults", max_results)])
            .send()
            .await?;

        let list: ListResponse<Job> = self.handle_response(response).await?;
        Ok(list.into())
    }

    /// Fetch the job page a cursor points at
    pub async fn list_jobs_next(&self, cursor: &Cursor) -> Result<Page<Job>> {
        self.fetch_page(cursor).await
    }

    // =============================================================================
    // Job Lifecycle
    // =============================================================================

    /// Get a job by ID
    ///
    /// # Returns
    /// The job, or `None` if the service does not know it
    pub async fn get_job(&self, job_id: &str) -> Result<Option<Job>> {
        let response = self.request(Method::GET, &["jobs", job_id])?.send().await?;

        match self.handle_response(response).await {
            Ok(job) => Ok(Some(job)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Create a job bound to a pool
    ///
    /// # Example
    /// ```no_run
    /// # use tranche_client::PoolServiceClient;
    /// # use tranche_core::dto::job::CreateJob;
    /// # async fn example() -> anyhow::Result<()> {
    /// let client = PoolServiceClient::new("https://account.region.batch.example");
    /// client.add_job(CreateJob::new("testbejob1", "pool1")).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn add_job(&self, req: CreateJob) -> Result<()> {
        let response = self
            .request(Method::POST, &["jobs"])?
            .json(&req)
            .send()
            .await?;

        self.handle_empty_response(response).await
    }
}
