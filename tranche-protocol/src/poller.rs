//! State polling
//!
//! Waits for a remote resource to reach a target state, lets it settle for a
//! fixed delay, then hands the latest snapshot back to the caller.
//!
//! ```text
//! Polling --(state == target)--> Reached --(settle delay)--> Settled
//! ```
//!
//! The first fetch happens one interval after the wait starts.
//!
//! Ticks never overlap: each fetch is awaited before the next tick is taken,
//! and ticks missed while a fetch was outstanding are skipped rather than
//! queued. The wait can be cancelled at any point through a
//! [`CancellationToken`]; a cancelled wait issues no further fetches and never
//! runs the follow-up action.

use std::fmt::Debug;
use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tranche_core::domain::state::ResourceState;

use crate::error::{ProtocolError, Result};
use crate::remote::StateSource;

/// Poller configuration
///
/// Both limits default to `None`, which waits for as long as it takes and
/// keeps polling through any number of failed fetches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollerConfig {
    /// Time between two state fetches
    pub poll_interval: Duration,

    /// Time to wait after the target state is first seen
    pub settle_delay: Duration,

    /// Give up after this many fetches without reaching the target
    pub max_polls: Option<u32>,

    /// Give up after this many failed fetches in a row
    pub max_consecutive_failures: Option<u32>,
}

impl PollerConfig {
    pub fn new(poll_interval: Duration, settle_delay: Duration) -> Self {
        Self {
            poll_interval,
            settle_delay,
            max_polls: None,
            max_consecutive_failures: None,
        }
    }

    pub fn with_max_polls(mut self, max_polls: u32) -> Self {
        self.max_polls = Some(max_polls);
        self
    }

    pub fn with_max_consecutive_failures(mut self, max_failures: u32) -> Self {
        self.max_consecutive_failures = Some(max_failures);
        self
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self::new(Duration::from_secs(8), Duration::from_secs(10))
    }
}

/// Where a wait currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollPhase {
    /// Not waiting
    #[default]
    Idle,

    /// Fetching state on every tick
    Polling,

    /// Target state seen, settle delay running
    Reached,

    /// Settle delay elapsed
    Settled,

    /// The wait was cancelled
    Cancelled,
}

/// How a wait ended
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome<R> {
    /// The resource settled in the target state
    Settled(R),

    /// The caller cancelled the wait
    Cancelled,
}

impl<R> PollOutcome<R> {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, PollOutcome::Cancelled)
    }

    /// The settled value, if the wait was not cancelled
    pub fn settled(self) -> Option<R> {
        match self {
            PollOutcome::Settled(value) => Some(value),
            PollOutcome::Cancelled => None,
        }
    }
}

/// Polls a [`StateSource`] until a resource reaches a target state
pub struct StatePoller<S> {
    source: S,
    config: PollerConfig,
    phase: watch::Sender<PollPhase>,
}

impl<S> StatePoller<S> {
    pub fn new(source: S, config: PollerConfig) -> Self {
        let (phase, _) = watch::channel(PollPhase::Idle);
        Self {
            source,
            config,
            phase,
        }
    }

    pub fn config(&self) -> &PollerConfig {
        &self.config
    }

    /// Current phase of the wait in progress
    pub fn phase(&self) -> PollPhase {
        *self.phase.borrow()
    }

    /// Subscribes to phase transitions
    pub fn subscribe(&self) -> watch::Receiver<PollPhase> {
        self.phase.subscribe()
    }

    fn enter(&self, phase: PollPhase) {
        self.phase.send_replace(phase);
    }

    /// Waits until `identifier` is in `target` and the settle delay elapsed
    ///
    /// Returns the freshest snapshot available after settling. If the
    /// post-settle fetch fails, the snapshot that first matched is returned.
    ///
    /// # Errors
    /// Only when a configured limit runs out: `PollLimitExceeded` or
    /// `FetchStateFailed`.
    pub async fn wait<St>(
        &self,
        identifier: &str,
        target: &St,
        cancel: &CancellationToken,
    ) -> Result<PollOutcome<ResourceState<St>>>
    where
        S: StateSource<St>,
        St: PartialEq + Debug + Send + Sync,
    {
        self.wait_observed(identifier, target, cancel, |_| {}).await
    }

    /// Waits like [`StatePoller::wait`], handing every snapshot fetched on a
    /// poll tick to `on_poll`
    ///
    /// Failed fetches and the post-settle refresh are not observed.
    pub async fn wait_observed<St, O>(
        &self,
        identifier: &str,
        target: &St,
        cancel: &CancellationToken,
        mut on_poll: O,
    ) -> Result<PollOutcome<ResourceState<St>>>
    where
        S: StateSource<St>,
        St: PartialEq + Debug + Send + Sync,
        O: FnMut(&ResourceState<St>),
    {
        self.enter(PollPhase::Polling);
        info!(
            "Waiting for {} to reach {:?} (interval {:?}, settle {:?})",
            identifier, target, self.config.poll_interval, self.config.settle_delay
        );

        let Some(reached) = self
            .poll_until(identifier, target, cancel, &mut on_poll)
            .await?
        else {
            return Ok(self.cancelled(identifier));
        };

        self.enter(PollPhase::Reached);
        info!(
            "{} reached {:?}, settling for {:?}",
            identifier, target, self.config.settle_delay
        );

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(self.cancelled(identifier)),
            _ = time::sleep(self.config.settle_delay) => {}
        }

        let refreshed = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(self.cancelled(identifier)),
            result = self.source.fetch_state(identifier) => result,
        };

        let latest = match refreshed {
            Ok(state) => {
                if state.current_state != *target {
                    warn!(
                        "{} moved to {:?} during the settle delay",
                        identifier, state.current_state
                    );
                }
                state
            }
            Err(e) => {
                warn!(
                    "Failed to refresh {} after settling, using last snapshot: {:#}",
                    identifier, e
                );
                reached
            }
        };

        self.enter(PollPhase::Settled);
        info!("{} settled", identifier);
        Ok(PollOutcome::Settled(latest))
    }

    /// Waits like [`StatePoller::wait`], then runs `follow_up` once with the
    /// latest snapshot
    ///
    /// A cancelled wait never runs `follow_up`.
    pub async fn wait_then<St, F, Fut, R>(
        &self,
        identifier: &str,
        target: &St,
        cancel: &CancellationToken,
        follow_up: F,
    ) -> Result<PollOutcome<R>>
    where
        S: StateSource<St>,
        St: PartialEq + Debug + Send + Sync,
        F: FnOnce(ResourceState<St>) -> Fut,
        Fut: Future<Output = anyhow::Result<R>>,
    {
        self.wait_then_observed(identifier, target, cancel, |_| {}, follow_up)
            .await
    }

    /// [`StatePoller::wait_then`] with a per-tick observer, see
    /// [`StatePoller::wait_observed`]
    pub async fn wait_then_observed<St, O, F, Fut, R>(
        &self,
        identifier: &str,
        target: &St,
        cancel: &CancellationToken,
        on_poll: O,
        follow_up: F,
    ) -> Result<PollOutcome<R>>
    where
        S: StateSource<St>,
        St: PartialEq + Debug + Send + Sync,
        O: FnMut(&ResourceState<St>),
        F: FnOnce(ResourceState<St>) -> Fut,
        Fut: Future<Output = anyhow::Result<R>>,
    {
        let state = match self
            .wait_observed(identifier, target, cancel, on_poll)
            .await?
        {
            PollOutcome::Settled(state) => state,
            PollOutcome::Cancelled => return Ok(PollOutcome::Cancelled),
        };

        if cancel.is_cancelled() {
            return Ok(self.cancelled(identifier));
        }

        debug!("Running follow-up for {}", identifier);
        follow_up(state)
            .await
            .map(PollOutcome::Settled)
            .map_err(|cause| ProtocolError::FollowUpFailed {
                identifier: identifier.to_string(),
                cause,
            })
    }

    /// Ticks until the target is seen; `None` means cancelled
    async fn poll_until<St, O>(
        &self,
        identifier: &str,
        target: &St,
        cancel: &CancellationToken,
        on_poll: &mut O,
    ) -> Result<Option<ResourceState<St>>>
    where
        S: StateSource<St>,
        St: PartialEq + Debug + Send + Sync,
        O: FnMut(&ResourceState<St>),
    {
        let period = self.config.poll_interval;
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut polls: u32 = 0;
        let mut failures: u32 = 0;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(None),
                _ = ticker.tick() => {}
            }

            let fetched = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(None),
                result = self.source.fetch_state(identifier) => result,
            };
            polls = polls.saturating_add(1);

            match fetched {
                Ok(state) => {
                    failures = 0;
                    debug!(
                        "Poll {} of {}: {:?}",
                        polls, identifier, state.current_state
                    );
                    on_poll(&state);

                    if state.current_state == *target {
                        return Ok(Some(state));
                    }
                }
                Err(cause) => {
                    failures = failures.saturating_add(1);
                    warn!(
                        "Failed to fetch state of {} (poll {}): {:#}",
                        identifier, polls, cause
                    );

                    if self
                        .config
                        .max_consecutive_failures
                        .is_some_and(|max| failures >= max)
                    {
                        return Err(ProtocolError::FetchStateFailed {
                            identifier: identifier.to_string(),
                            cause,
                        });
                    }
                }
            }

            if self.config.max_polls.is_some_and(|max| polls >= max) {
                return Err(ProtocolError::PollLimitExceeded {
                    identifier: identifier.to_string(),
                    polls,
                });
            }
        }
    }

    fn cancelled<R>(&self, identifier: &str) -> PollOutcome<R> {
        self.enter(PollPhase::Cancelled);
        info!("Stopped waiting for {}: cancelled", identifier);
        PollOutcome::Cancelled
    }
}

impl<S> Debug for StatePoller<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatePoller")
            .field("config", &self.config)
            .field("phase", &self.phase())
            .finish_non_exhaustive()
    }
}
