//! Pool-related API endpoints

use reqwest::Method;
use tracing::info;
use tranche_core::domain::page::{Cursor, Page};
use tranche_core::domain::pool::Pool;
use tranche_core::dto::list::ListResponse;
use tranche_core::dto::pool::{CreatePool, PoolResource};

use crate::error::Result;
use crate::PoolServiceClient;

impl PoolServiceClient {
    // =============================================================================
    // Pool Query
    // =============================================================================

    /// List the first page of pools
    pub async fn list_pools(&self) -> Result<Page<Pool>> {
        let response = self.request(Method::GET, &["pools"])?.send().await?;

        let list: ListResponse<PoolResource> = self.handle_response(response).await?;
        Ok(list.into_page_with(Pool::from))
    }

    /// Fetch the pool page a cursor points at
    pub async fn list_pools_next(&self, cursor: &Cursor) -> Result<Page<Pool>> {
        let page: Page<PoolResource> = self.fetch_page(cursor).await?;
        Ok(Page {
            items: page.items.into_iter().map(Pool::from).collect(),
            next_cursor: page.next_cursor,
        })
    }

    /// Get details for a specific pool
    pub async fn get_pool(&self, name: &str) -> Result<Pool> {
        let response = self.request(Method::GET, &["pools", name])?.send().await?;

        let resource: PoolResource = self.handle_response(response).await?;
        Ok(resource.into())
    }

    // =============================================================================
    // Pool Provisioning
    // =============================================================================

    /// Create a pool
    ///
    /// The call returns as soon as the service accepted the request; nodes
    /// are allocated afterwards; wait for `AllocationState::Steady` with a
    /// `StatePoller` over `PoolAllocation`.
    ///
    /// # Example
    /// ```no_run
    /// # use tranche_client::PoolServiceClient;
    /// # use tranche_core::dto::pool::{CreatePool, ImageReference};
    /// # async fn example() -> anyhow::Result<()> {
    /// let client = PoolServiceClient::new("https://account.region.batch.example");
    /// let image = ImageReference {
    ///     publisher: "Canonical".to_string(),
    ///     offer: "UbuntuServer".to_string(),
    ///     sku: "18.04-LTS".to_string(),
    ///     version: "latest".to_string(),
    /// };
    /// let pool = client
    ///     .create_pool("arm-pool-1", CreatePool::new("STANDARD_A1_V2", image, "batch.node.ubuntu 18.04", 1, 2))
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn create_pool(&self, name: &str, req: CreatePool) -> Result<Pool> {
        let response = self
            .request(Method::PUT, &["pools", name])?
            .json(&req)
            .send()
            .await?;

        let resource: PoolResource = self.handle_response(response).await?;
        info!("Created pool {}", resource.name);
        Ok(resource.into())
    }

    /// Delete a pool
    pub async fn delete_pool(&self, name: &str) -> Result<()> {
        let response = self.request(Method::DELETE, &["pools", name])?.send().await?;

        self.handle_empty_response(response).await
    }
}
