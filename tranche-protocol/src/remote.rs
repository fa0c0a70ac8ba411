//! Remote capability interfaces
//!
//! The protocol components never talk to a concrete client. Callers hand them
//! an implementation of one of these traits, which keeps the components
//! testable with in-memory fakes.

use anyhow::Result;
use async_trait::async_trait;
use tranche_core::domain::page::{Cursor, Page};
use tranche_core::domain::state::ResourceState;

/// Bulk submission endpoint with a per-call item limit
#[async_trait]
pub trait BatchSink<T: Sync>: Send + Sync {
    /// Server acknowledgement for a single item
    type Ack: Send;

    /// Submits one batch
    ///
    /// Must return exactly one acknowledgement per item, in batch order.
    async fn submit(&self, batch: &[T]) -> Result<Vec<Self::Ack>>;
}

/// Listing endpoint that follows continuation cursors
#[async_trait]
pub trait PageSource<T: Send>: Send + Sync {
    /// Fetches the page a cursor points at
    async fn fetch_next(&self, cursor: &Cursor) -> Result<Page<T>>;
}

/// Endpoint reporting the current state of a resource
#[async_trait]
pub trait StateSource<S: Send>: Send + Sync {
    /// Fetches a snapshot of the resource's state
    async fn fetch_state(&self, identifier: &str) -> Result<ResourceState<S>>;
}

#[async_trait]
impl<'a, T: Sync, B: BatchSink<T> + ?Sized> BatchSink<T> for &'a B {
    type Ack = B::Ack;

    async fn submit(&self, batch: &[T]) -> Result<Vec<Self::Ack>> {
        (**self).submit(batch).await
    }
}

#[async_trait]
impl<'a, T: Send, P: PageSource<T> + ?Sized> PageSource<T> for &'a P {
    async fn fetch_next(&self, cursor: &Cursor) -> Result<Page<T>> {
        (**self).fetch_next(cursor).await
    }
}

#[async_trait]
impl<'a, S: Send, P: StateSource<S> + ?Sized> StateSource<S> for &'a P {
    async fn fetch_state(&self, identifier: &str) -> Result<ResourceState<S>> {
        (**self).fetch_state(identifier).await
    }
}
