//! Shared output helpers

use anyhow::{Context, Result};
use colored::*;
use serde::Serialize;
use std::time::Duration;
use tranche_client::ClientError;
use tranche_core::domain::job::JobState;
use tranche_core::domain::pool::AllocationState;
use tranche_core::domain::task::TaskState;
use tranche_protocol::backoff::Backoff;

/// Backoff for single fetches the CLI chooses to retry
pub fn fetch_backoff() -> Backoff {
    Backoff::new(Duration::from_millis(500), Duration::from_secs(5), 3)
}

/// Whether a failed call is worth repeating
///
/// Service errors count only when the client classifies them as transient;
/// failures that never reached the service are always retried.
pub fn is_retryable(error: &anyhow::Error) -> bool {
    error
        .downcast_ref::<ClientError>()
        .is_none_or(ClientError::is_transient)
}

/// Backoff for resubmitting the remainder of a failed bulk submission
pub fn submit_backoff() -> Backoff {
    Backoff::new(Duration::from_secs(1), Duration::from_secs(30), 5)
}

/// Print any serializable value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

/// Print a horizontal rule
pub fn rule() {
    println!("{}", "─".repeat(80).dimmed());
}

/// Colorize job state for display
pub fn colorize_job_state(state: &JobState) -> ColoredString {
    let text = state.to_string();
    match state {
        JobState::Active => text.green(),
        JobState::Completed => text.blue(),
        JobState::Disabled | JobState::Disabling => text.yellow(),
        JobState::Terminating | JobState::Deleting => text.red(),
        JobState::Enabling | JobState::Unknown => text.normal(),
    }
}

/// Colorize task state for display
pub fn colorize_task_state(state: &TaskState) -> ColoredString {
    let text = state.to_string();
    match state {
        TaskState::Active => text.normal(),
        TaskState::Preparing => text.yellow(),
        TaskState::Running => text.cyan(),
        TaskState::Completed => text.green(),
        TaskState::Unknown => text.dimmed(),
    }
}

/// Colorize allocation state for display
pub fn colorize_allocation(state: &AllocationState) -> ColoredString {
    let text = state.to_string();
    match state {
        AllocationState::Steady => text.green(),
        AllocationState::Resizing => text.yellow(),
        AllocationState::Stopping => text.red(),
        AllocationState::Unknown => text.dimmed(),
    }
}
