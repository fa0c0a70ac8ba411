//! Chunked bulk submission
//!
//! Splits an arbitrarily long, ordered sequence of work items into contiguous
//! batches no larger than the service's per-call limit and submits them one
//! after another. Acknowledgements come back as a single ordered list, one
//! per input item.

use tracing::{debug, info, warn};
use tranche_core::domain::work_item::WorkItem;

use crate::error::{ProtocolError, SubmitError};
use crate::remote::BatchSink;

/// Submits work items in fixed-size batches through a [`BatchSink`]
///
/// Batches are sent strictly in order with one call outstanding at a time.
/// A failed batch stops the submission: nothing after it is sent, and
/// nothing before it is rolled back.
#[derive(Debug, Clone)]
pub struct ChunkedSubmitter<S> {
    sink: S,
    max_batch_size: usize,
}

impl<S> ChunkedSubmitter<S> {
    /// Creates a submitter
    ///
    /// # Errors
    /// Returns `InvalidBatchSize` when `max_batch_size` is zero.
    pub fn new(sink: S, max_batch_size: usize) -> Result<Self, ProtocolError> {
        if max_batch_size == 0 {
            return Err(ProtocolError::InvalidBatchSize(max_batch_size));
        }

        Ok(Self {
            sink,
            max_batch_size,
        })
    }

    pub fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    /// Number of remote calls needed for `item_count` items
    pub fn batch_count(&self, item_count: usize) -> usize {
        item_count.div_ceil(self.max_batch_size)
    }

    /// Submits every item
    ///
    /// On success the result holds one acknowledgement per item, in input
    /// order. An empty input makes no remote call.
    pub async fn submit_all<T>(&self, items: &[T]) -> Result<Vec<S::Ack>, SubmitError<S::Ack>>
    where
        T: WorkItem + Sync,
        S: BatchSink<T>,
    {
        self.submit_from(items, 0).await
    }

    /// Submits `items[offset..]`
    ///
    /// Used to retry after a [`SubmitError`], passing its `resume_offset()`.
    /// Batch indices in errors count from `offset`; the resume offset in a
    /// returned error is relative to the whole of `items`.
    pub async fn submit_from<T>(
        &self,
        items: &[T],
        offset: usize,
    ) -> Result<Vec<S::Ack>, SubmitError<S::Ack>>
    where
        T: WorkItem + Sync,
        S: BatchSink<T>,
    {
        let remaining = items.get(offset..).unwrap_or_default();
        let mut acknowledged = Vec::with_capacity(remaining.len());

        if remaining.is_empty() {
            debug!("Nothing to submit");
            return Ok(acknowledged);
        }

        let batches = self.batch_count(remaining.len());
        info!(
            "Submitting {} item(s) in {} batch(es) of at most {}",
            remaining.len(),
            batches,
            self.max_batch_size
        );

        for (batch_index, batch) in remaining.chunks(self.max_batch_size).enumerate() {
            let batch_offset = offset + batch_index * self.max_batch_size;

            debug!(
                "Submitting batch {}/{}: items {}..{} ({} .. {})",
                batch_index + 1,
                batches,
                batch_offset,
                batch_offset + batch.len(),
                batch[0].id(),
                batch[batch.len() - 1].id()
            );

            let acks = match self.sink.submit(batch).await {
                Ok(acks) => acks,
                Err(cause) => {
                    warn!("Batch {} failed: {:#}", batch_index, cause);
                    return Err(SubmitError::new(
                        acknowledged,
                        batch_offset,
                        ProtocolError::SubmissionFailed { batch_index, cause },
                    ));
                }
            };

            if acks.len() != batch.len() {
                warn!(
                    "Batch {} returned {} acknowledgement(s) for {} item(s)",
                    batch_index,
                    acks.len(),
                    batch.len()
                );
                return Err(SubmitError::new(
                    acknowledged,
                    batch_offset,
                    ProtocolError::AckCountMismatch {
                        batch_index,
                        expected: batch.len(),
                        actual: acks.len(),
                    },
                ));
            }

            acknowledged.extend(acks);
        }

        info!("Submitted {} item(s)", acknowledged.len());
        Ok(acknowledged)
    }
}
