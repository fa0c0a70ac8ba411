//! Error types for the protocol components

use thiserror::Error;
use tranche_core::domain::page::Cursor;

/// Result type alias for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors surfaced by the protocol components
///
/// Remote failures keep the capability's error as `cause`. None of these are
/// retried by the component that raised them.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// A submitter was built with a batch size of zero
    #[error("Invalid batch size {0}: must be at least 1")]
    InvalidBatchSize(usize),

    /// A batch call failed; earlier batches stand
    #[error("Submission of batch {batch_index} failed")]
    SubmissionFailed {
        /// Zero-based index of the failed batch
        batch_index: usize,
        #[source]
        cause: anyhow::Error,
    },

    /// A batch call returned the wrong number of acknowledgements
    #[error("Batch {batch_index} returned {actual} acknowledgement(s) for {expected} item(s)")]
    AckCountMismatch {
        batch_index: usize,
        expected: usize,
        actual: usize,
    },

    /// The server handed back the cursor that was just used
    #[error("Pagination cursor did not advance: {cursor}")]
    StalledCursor { cursor: Cursor },

    /// Fetching the next page failed
    #[error("Failed to fetch page at cursor {cursor}")]
    FetchPageFailed {
        cursor: Cursor,
        #[source]
        cause: anyhow::Error,
    },

    /// The configured page limit was reached before the last page
    #[error("Page limit of {pages} reached before the last page")]
    PageLimitExceeded { pages: usize },

    /// Fetching a resource's state kept failing
    #[error("Failed to fetch state of {identifier}")]
    FetchStateFailed {
        identifier: String,
        #[source]
        cause: anyhow::Error,
    },

    /// The configured number of polls ran out before the target state
    #[error("{identifier} did not reach the target state after {polls} poll(s)")]
    PollLimitExceeded { identifier: String, polls: u32 },

    /// The follow-up action after settling failed
    #[error("Follow-up action for {identifier} failed")]
    FollowUpFailed {
        identifier: String,
        #[source]
        cause: anyhow::Error,
    },
}

impl ProtocolError {
    /// Check if this error is a stalled pagination cursor
    pub fn is_stalled_cursor(&self) -> bool {
        matches!(self, Self::StalledCursor { .. })
    }

    /// Index of the failed batch, for submission errors
    pub fn batch_index(&self) -> Option<usize> {
        match self {
            Self::SubmissionFailed { batch_index, .. } | Self::AckCountMismatch { batch_index, .. } => {
                Some(*batch_index)
            }
            _ => None,
        }
    }
}

/// A bulk submission that stopped part way
///
/// Batches before the failure were accepted by the remote side and are not
/// rolled back. Their acknowledgements are kept in `acknowledged`, and
/// [`SubmitError::resume_offset`] tells the caller where to pick up.
#[derive(Debug, Error)]
#[error("{source} ({} item(s) acknowledged before the failure)", .acknowledged.len())]
pub struct SubmitError<A> {
    /// Acknowledgements of every batch before the failed one, in input order
    pub acknowledged: Vec<A>,

    /// What went wrong with the failed batch
    pub source: ProtocolError,

    resume_offset: usize,
}

impl<A> SubmitError<A> {
    pub(crate) fn new(acknowledged: Vec<A>, resume_offset: usize, source: ProtocolError) -> Self {
        Self {
            acknowledged,
            source,
            resume_offset,
        }
    }

    /// Index into the original input of the first item that was not acknowledged
    pub fn resume_offset(&self) -> usize {
        self.resume_offset
    }

    /// Index of the failed batch, counted from the start of the failing call
    pub fn batch_index(&self) -> Option<usize> {
        self.source.batch_index()
    }
}
