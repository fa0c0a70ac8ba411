//! CLI configuration
//!
//! Defines the connection settings and the protocol tuning knobs: batch size
//! for bulk submission, page size for listings, and the polling cadence used
//! while waiting for pools to settle.

use anyhow::{Context, Result};
use std::str::FromStr;
use std::time::Duration;
use tranche_client::PoolServiceClient;
use tranche_core::dto::task::MAX_TASKS_PER_COLLECTION;
use tranche_protocol::PollerConfig;

/// CLI configuration
///
/// All intervals are configurable to allow tuning for different services
/// (a local fake vs a real account with slow provisioning).
#[derive(Debug, Clone)]
pub struct Config {
    /// Service base URL (e.g., "https://account.region.batch.example")
    pub endpoint: String,

    /// Bearer token forwarded on every request
    pub access_token: Option<String>,

    /// `api-version` query parameter, if the service requires one
    pub api_version: Option<String>,

    /// Most tasks sent in one add-collection call
    pub max_batch_size: usize,

    /// Page size requested from listings
    pub page_size: u32,

    /// How often to poll a pool while waiting for it to settle
    pub poll_interval: Duration,

    /// How long to wait after the target state is first seen
    pub settle_delay: Duration,

    /// Give up waiting after this many polls
    pub max_polls: Option<u32>,

    /// Timeout of a single HTTP request
    pub request_timeout: Duration,
}

impl Config {
    /// Creates a new configuration with defaults
    pub fn new(endpoint: String) -> Self {
        Self {
            endpoint,
            access_token: None,
            api_version: None,
            max_batch_size: MAX_TASKS_PER_COLLECTION,
            page_size: 10,
            poll_interval: Duration::from_secs(8),
            settle_delay: Duration::from_secs(10),
            max_polls: None,
            request_timeout: Duration::from_secs(30),
        }
    }

    /// Creates configuration from variables resolved by `lookup`
    ///
    /// `lookup` is normally backed by the process environment. Expected
    /// variables:
    /// - TRANCHE_ENDPOINT (required)
    /// - TRANCHE_ACCESS_TOKEN (optional)
    /// - TRANCHE_API_VERSION (optional)
    /// - TRANCHE_MAX_BATCH_SIZE (optional, default: 100)
    /// - TRANCHE_PAGE_SIZE (optional, default: 10)
    /// - TRANCHE_POLL_INTERVAL (optional, seconds, default: 8)
    /// - TRANCHE_SETTLE_DELAY (optional, seconds, default: 10)
    /// - TRANCHE_MAX_POLLS (optional, default: unbounded)
    /// - TRANCHE_REQUEST_TIMEOUT (optional, seconds, default: 30)
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let endpoint = lookup("TRANCHE_ENDPOINT")
            .filter(|endpoint| !endpoint.trim().is_empty())
            .ok_or_else(|| {
                anyhow::anyhow!("No endpoint configured: pass --endpoint or set TRANCHE_ENDPOINT")
            })?;

        let mut config = Self::new(endpoint);
        config.access_token = lookup("TRANCHE_ACCESS_TOKEN").filter(|t| !t.is_empty());
        config.api_version = lookup("TRANCHE_API_VERSION").filter(|v| !v.is_empty());

        if let Some(size) = parse_var(&lookup, "TRANCHE_MAX_BATCH_SIZE")? {
            config.max_batch_size = size;
        }
        if let Some(size) = parse_var(&lookup, "TRANCHE_PAGE_SIZE")? {
            config.page_size = size;
        }
        if let Some(secs) = parse_var(&lookup, "TRANCHE_POLL_INTERVAL")? {
            config.poll_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var(&lookup, "TRANCHE_SETTLE_DELAY")? {
            config.settle_delay = Duration::from_secs(secs);
        }
        config.max_polls = parse_var(&lookup, "TRANCHE_MAX_POLLS")?;
        if let Some(secs) = parse_var(&lookup, "TRANCHE_REQUEST_TIMEOUT")? {
            config.request_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.endpoint.is_empty() {
            anyhow::bail!("endpoint cannot be empty");
        }

        if !self.endpoint.starts_with("http://") && !self.endpoint.starts_with("https://") {
            anyhow::bail!("endpoint must start with http:// or https://");
        }

        if self.max_batch_size == 0 {
            anyhow::bail!("max_batch_size must be greater than 0");
        }

        if self.max_batch_size > MAX_TASKS_PER_COLLECTION {
            anyhow::bail!(
                "max_batch_size cannot exceed the service limit of {}",
                MAX_TASKS_PER_COLLECTION
            );
        }

        if self.page_size == 0 {
            anyhow::bail!("page_size must be greater than 0");
        }

        if self.poll_interval.is_zero() {
            anyhow::bail!("poll_interval must be greater than 0");
        }

        if self.max_polls == Some(0) {
            anyhow::bail!("max_polls must be greater than 0 when set");
        }

        Ok(())
    }

    /// Poller settings derived from this configuration
    pub fn poller_config(&self) -> PollerConfig {
        let mut poller = PollerConfig::new(self.poll_interval, self.settle_delay);
        poller.max_polls = self.max_polls;
        poller
    }

    /// Builds the service client
    pub fn client(&self) -> Result<PoolServiceClient> {
        let http = reqwest::Client::builder()
            .timeout(self.request_timeout)
            .build()
            .context("Failed to build HTTP client")?;

        let mut client = PoolServiceClient::with_client(&self.endpoint, http);
        if let Some(token) = &self.access_token {
            client = client.with_token(token);
        }
        if let Some(version) = &self.api_version {
            client = client.with_api_version(version);
        }
        Ok(client)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new("http://localhost:8080".to_string())
    }
}

/// Parses an optional variable, failing on values that are set but malformed
fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("Invalid {}='{}': {}", name, raw, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.max_batch_size, 100);
        assert_eq!(config.poll_interval, Duration::from_secs(8));
        assert_eq!(config.settle_delay, Duration::from_secs(10));
        assert!(config.max_polls.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_lookup() {
        let config = Config::from_lookup(lookup(&[
            ("TRANCHE_ENDPOINT", "https://account.batch.example"),
            ("TRANCHE_ACCESS_TOKEN", "token"),
            ("TRANCHE_MAX_BATCH_SIZE", "50"),
            ("TRANCHE_POLL_INTERVAL", "2"),
            ("TRANCHE_MAX_POLLS", "30"),
        ]))
        .unwrap();

        assert_eq!(config.endpoint, "https://account.batch.example");
        assert_eq!(config.access_token.as_deref(), Some("token"));
        assert_eq!(config.max_batch_size, 50);
        assert_eq!(config.poll_interval, Duration::from_secs(2));
        assert_eq!(config.settle_delay, Duration::from_secs(10));
        assert_eq!(config.poller_config().max_polls, Some(30));
    }

    #[test]
    fn test_missing_endpoint() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert!(err.to_string().contains("TRANCHE_ENDPOINT"));

        let err = Config::from_lookup(lookup(&[("TRANCHE_ENDPOINT", "  ")])).unwrap_err();
        assert!(err.to_string().contains("--endpoint"));
    }

    #[test]
    fn test_malformed_number() {
        let err = Config::from_lookup(lookup(&[
            ("TRANCHE_ENDPOINT", "https://account.batch.example"),
            ("TRANCHE_PAGE_SIZE", "ten"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("TRANCHE_PAGE_SIZE"));
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();

        // Valid config should pass
        assert!(config.validate().is_ok());

        // Invalid URL should fail
        config.endpoint = "not-a-url".to_string();
        assert!(config.validate().is_err());
        config.endpoint = "https://account.batch.example".to_string();

        // Batch size above the service limit should fail
        config.max_batch_size = 101;
        assert!(config.validate().is_err());
        config.max_batch_size = 0;
        assert!(config.validate().is_err());
        config.max_batch_size = 100;

        config.poll_interval = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_client_uses_endpoint() {
        let config = Config::new("https://account.batch.example/".to_string());
        let client = config.client().unwrap();
        assert_eq!(client.base_url(), "https://account.batch.example");
    }
}
