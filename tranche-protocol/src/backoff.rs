//! Retry with exponential backoff
//!
//! The protocol components never retry on their own. This helper is for
//! callers that decide a single failed batch or fetch is worth another try,
//! typically when the service is briefly unavailable.

use anyhow::Result;
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

/// Exponential backoff schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    /// Delay after the first failure
    pub initial_delay: Duration,

    /// Upper bound for any single delay
    pub max_delay: Duration,

    /// Total attempts, including the first one
    pub max_attempts: u32,
}

impl Backoff {
    pub fn new(initial_delay: Duration, max_delay: Duration, max_attempts: u32) -> Self {
        Self {
            initial_delay,
            max_delay,
            max_attempts,
        }
    }

    /// Delay to wait after the given failed attempt (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(Duration::from_millis(500), Duration::from_secs(30), 10)
    }
}

/// Runs `op` until it succeeds or the attempts run out
///
/// `op` receives the 1-based attempt number. The last error is returned with
/// `label` as context.
pub async fn retry<T, F, Fut>(backoff: &Backoff, label: &str, op: F) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    retry_if(backoff, label, |_| true, op).await
}

/// Like [`retry`], but gives up at once on errors `should_retry` rejects
pub async fn retry_if<T, P, F, Fut>(
    backoff: &Backoff,
    label: &str,
    should_retry: P,
    mut op: F,
) -> Result<T>
where
    P: Fn(&anyhow::Error) -> bool,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = backoff.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;

        match op(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    info!("{} succeeded after {} attempt(s)", label, attempt);
                }
                return Ok(value);
            }
            Err(e) => {
                if attempt >= max_attempts || !should_retry(&e) {
                    return Err(e.context(format!("{} failed after {} attempt(s)", label, attempt)));
                }

                let delay = backoff.delay_after(attempt);
                warn!(
                    "{} failed (attempt {}/{}): {:#}; retrying in {:?}",
                    label, attempt, max_attempts, e, delay
                );

                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_delay_doubles_and_caps() {
        let backoff = Backoff::new(Duration::from_millis(500), Duration::from_secs(3), 10);

        assert_eq!(backoff.delay_after(1), Duration::from_millis(500));
        assert_eq!(backoff.delay_after(2), Duration::from_millis(1000));
        assert_eq!(backoff.delay_after(3), Duration::from_millis(2000));
        assert_eq!(backoff.delay_after(4), Duration::from_secs(3));
        assert_eq!(backoff.delay_after(40), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_until_success() {
        let calls = AtomicU32::new(0);

        let value = retry(&Backoff::default(), "flaky call", |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 3 {
                    anyhow::bail!("unavailable");
                }
                Ok(attempt)
            }
        })
        .await
        .unwrap();

        assert_eq!(value, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_gives_up() {
        let backoff = Backoff::new(Duration::from_millis(10), Duration::from_millis(40), 4);
        let calls = AtomicU32::new(0);

        let err = retry(&backoff, "doomed call", |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(anyhow::anyhow!("still down")) }
        })
        .await
        .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(err.to_string(), "doomed call failed after 4 attempt(s)");
        assert_eq!(err.root_cause().to_string(), "still down");
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_error_is_not_retried() {
        let calls = AtomicU32::new(0);

        let err = retry_if(
            &Backoff::default(),
            "lookup",
            |e| !e.to_string().contains("not found"),
            |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(anyhow::anyhow!("pool not found")) }
            },
        )
        .await
        .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(err.to_string(), "lookup failed after 1 attempt(s)");
    }
}
