//! Tranche HTTP Client
//!
//! A type-safe HTTP client for the compute-pool service: jobs, tasks and
//! pools. Listings come back one [`Page`] at a time; the adapters in
//! [`remote`] plug the client into the protocol components so callers get
//! whole listings, bulk submission and provisioning waits.
//!
//! # Example
//!
//! ```no_run
//! use tranche_client::PoolServiceClient;
//! use tranche_protocol::PageWalker;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = PoolServiceClient::new("https://account.region.batch.example");
//!
//!     let first = client.list_jobs(10).await?;
//!     let jobs = PageWalker::new(client.job_pages(), first).collect_all().await?;
//!
//!     println!("Found {} job(s)", jobs.len());
//!     Ok(())
//! }
//! ```

pub mod error;
mod jobs;
mod pools;
pub mod remote;
mod tasks;

// Re-export commonly used types
pub use error::{ClientError, Result};
pub use remote::{JobPages, PoolAllocation, PoolPages, TaskCollectionSink, TaskPages};

use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use tracing::debug;
use tranche_core::domain::page::{Cursor, Page};
use tranche_core::dto::list::ListResponse;

/// HTTP client for the compute-pool service
///
/// This client provides methods for the service endpoints, organized
/// into logical groups:
/// - Job listing and creation
/// - Task listing and bulk creation
/// - Pool provisioning (create, get, delete)
#[derive(Debug, Clone)]
pub struct PoolServiceClient {
    /// Base URL of the service account (e.g., "https://account.region.batch.example")
    base_url: String,
    /// HTTP client instance
    client: Client,
    /// Bearer token forwarded on every request
    token: Option<String>,
    /// `api-version` query parameter, if the service requires one
    api_version: Option<String>,
}

impl PoolServiceClient {
    /// Create a new client
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the service account
    ///
    /// # Example
    /// ```
    /// use tranche_client::PoolServiceClient;
    ///
    /// let client = PoolServiceClient::new("https://account.region.batch.example");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the service account
    /// * `client` - A configured reqwest Client
    ///
    /// # Example
    /// ```
    /// use tranche_client::PoolServiceClient;
    /// use reqwest::Client;
    /// use std::time::Duration;
    ///
    /// let http_client = Client::builder()
    ///     .timeout(Duration::from_secs(30))
    ///     .build()
    ///     .unwrap();
    ///
    /// let client = PoolServiceClient::with_client("https://account.region.batch.example", http_client);
    /// ```
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            token: None,
            api_version: None,
        }
    }

    /// Attach a bearer token to every request
    ///
    /// Acquiring the token is up to the caller.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Send `api-version` on every request that is not a next-page link
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = Some(api_version.into());
        self
    }

    /// Get the base URL of the service
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // =============================================================================
    // Request Builders
    // =============================================================================

    /// Build a request against path segments under the base URL
    ///
    /// Segments are percent-encoded, so caller-chosen ids cannot change the
    /// shape of the path.
    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder> {
        let url = self.endpoint(segments)?;
        debug!("{} {}", method, url);

        let mut builder = self.authorize(self.client.request(method, url));
        if let Some(version) = &self.api_version {
            builder = builder.query(&[("api-version", version)]);
        }
        Ok(builder)
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            ClientError::InvalidRequest(format!("Invalid base URL {}: {}", self.base_url, e))
        })?;

        url.path_segments_mut()
            .map_err(|_| {
                ClientError::InvalidRequest(format!("Base URL {} cannot take a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Build a GET request for a next-page cursor
    ///
    /// Next-page links already carry every query parameter they need.
    fn cursor_request(&self, cursor: &Cursor) -> RequestBuilder {
        let url = self.resolve_cursor(cursor);
        debug!("GET {}", url);
        self.authorize(self.client.get(&url))
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Turn a cursor into an absolute URL
    ///
    /// The service returns absolute next-page links; relative ones are joined
    /// to the base URL.
    fn resolve_cursor(&self, cursor: &Cursor) -> String {
        let link = cursor.as_str();
        if link.starts_with("http://") || link.starts_with("https://") {
            link.to_string()
        } else {
            format!("{}/{}", self.base_url, link.trim_start_matches('/'))
        }
    }

    /// Fetch the page a cursor points at
    async fn fetch_page<T: DeserializeOwned>(&self, cursor: &Cursor) -> Result<Page<T>> {
        let response = self.cursor_request(cursor).send().await?;
        let list: ListResponse<T> = self.handle_response(response).await?;
        Ok(list.into())
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    ///
    /// This method checks the status code and returns an appropriate error if
    /// the request failed, or deserializes the response body if successful.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::from_response(status.as_u16(), &body));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    /// Handle an API response that returns no content (e.g., DELETE operations)
    ///
    /// This method checks the status code and returns an error if the request failed.
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::from_response(status.as_u16(), &body));
        }

        Ok(())
    }
}
