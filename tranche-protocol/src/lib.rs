//! Tranche Protocol
//!
//! Mechanics for talking to a remote compute-pool API that limits the number
//! of items per call, paginates listings with opaque cursors, and provisions
//! resources asynchronously.
//!
//! Three independent components, each driven only through the capability
//! traits in [`remote`]:
//! - [`ChunkedSubmitter`]: one logical "submit all" over a size-limited bulk call
//! - [`PageWalker`]: one logical listing over cursor pagination, with a loop guard
//! - [`StatePoller`]: wait for a resource to reach a state, settle, then act
//!
//! None of them retries on its own. [`backoff::retry`] is there for callers
//! that want to retry a single failed batch or fetch.
//!
//! # Example
//!
//! ```no_run
//! use tranche_core::domain::page::Page;
//! use tranche_protocol::{PageWalker, remote::PageSource};
//!
//! # async fn example<S: PageSource<String>>(source: S, first: Page<String>) -> anyhow::Result<()> {
//! let items = PageWalker::new(source, first).collect_all().await?;
//! println!("{} item(s)", items.len());
//! # Ok(())
//! # }
//! ```

pub mod backoff;
pub mod chunked;
pub mod error;
pub mod pages;
pub mod poller;
pub mod remote;

pub use chunked::ChunkedSubmitter;
pub use error::{ProtocolError, Result, SubmitError};
pub use pages::PageWalker;
pub use poller::{PollOutcome, PollPhase, PollerConfig, StatePoller};
