//! Task command handlers
//!
//! Handles listing the tasks of a job and filling a job up to a target
//! number of tasks through bulk submission.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use tokio::time::sleep;
use tracing::warn;
use tranche_client::PoolServiceClient;
use tranche_core::domain::task::{Task, TaskAddResult, TaskSpec};
use tranche_core::domain::work_item::WorkItem;
use tranche_protocol::backoff::{Backoff, retry_if};
use tranche_protocol::remote::BatchSink;
use tranche_protocol::{ChunkedSubmitter, PageWalker, ProtocolError};

use super::job::ensure_job;
use super::output::{colorize_task_state, fetch_backoff, is_retryable, print_json, rule, submit_backoff};
use crate::config::Config;
use crate::types::task_id;

/// Task subcommands
#[derive(Subcommand)]
pub enum TaskCommands {
    /// List all tasks of a job, following every page
    List {
        /// Job ID
        job: String,

        /// Tasks requested per page
        #[arg(long)]
        page_size: Option<u32>,

        /// Print JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Add tasks until the job holds `count` of them
    Fill {
        /// Job ID (created when missing)
        job: String,

        /// Number of tasks the job should end up with
        #[arg(short, long, default_value_t = 50)]
        count: usize,

        /// Command line of every added task
        #[arg(long, default_value = "sleep 100")]
        command: String,

        /// Pool used when the job has to be created
        #[arg(long, default_value = "pool1")]
        pool: String,
    },
}

/// Handle task commands
///
/// Routes task subcommands to their respective handlers.
///
/// # Arguments
/// * `command` - The task command to execute
/// * `config` - The CLI configuration
pub async fn handle_task_command(command: TaskCommands, config: &Config) -> Result<()> {
    let client = config.client()?;

    match command {
        TaskCommands::List {
            job,
            page_size,
            json,
        } => {
            let tasks = list_all_tasks(&client, &job, page_size.unwrap_or(config.page_size)).await?;
            if json {
                print_json(&tasks)
            } else {
                print_tasks(&job, &tasks);
                Ok(())
            }
        }
        TaskCommands::Fill {
            job,
            count,
            command,
            pool,
        } => fill_job(&client, config, &job, count, &command, &pool).await,
    }
}

/// Fetch every task of a job
async fn list_all_tasks(client: &PoolServiceClient, job_id: &str, page_size: u32) -> Result<Vec<Task>> {
    let first = retry_if(&fetch_backoff(), "Listing tasks", is_retryable, |_| async {
        anyhow::Ok(client.list_tasks(job_id, page_size).await?)
    })
    .await?;

    PageWalker::new(client.task_pages(), first)
        .collect_all()
        .await
        .with_context(|| format!("Failed to page through tasks of job {}", job_id))
}

/// Fill a job with tasks
///
/// Existing tasks count toward the target; new tasks are numbered after
/// them and submitted in batches no larger than the configured batch size.
async fn fill_job(
    client: &PoolServiceClient,
    config: &Config,
    job_id: &str,
    count: usize,
    command_line: &str,
    pool_id: &str,
) -> Result<()> {
    ensure_job(client, job_id, pool_id).await?;

    let existing = list_all_tasks(client, job_id, config.page_size).await?.len();
    if existing >= count {
        println!(
            "{}",
            format!("Job {} already has {} task(s), nothing to add.", job_id, existing).green()
        );
        return Ok(());
    }

    let specs: Vec<TaskSpec> = (existing + 1..=count)
        .map(|n| TaskSpec::new(task_id(job_id, n), command_line))
        .collect();

    let submitter = ChunkedSubmitter::new(client.task_sink(job_id), config.max_batch_size)?;
    println!(
        "{}",
        format!(
            "Adding {} task(s) to job {} in {} batch(es)...",
            specs.len(),
            job_id,
            submitter.batch_count(specs.len())
        )
        .bold()
    );

    let results = submit_with_resume(&submitter, &specs, &submit_backoff()).await?;
    report_results(&results);

    let total = list_all_tasks(client, job_id, config.page_size).await?.len();
    println!();
    println!("Job {} now has {} task(s)", job_id.bold(), total.to_string().cyan());

    Ok(())
}

/// Submit every item, resuming from the first unacknowledged one on failure
///
/// Batches accepted before a failure are never sent again. A batch the
/// service rejected for a reason that will not go away ends the submission.
async fn submit_with_resume<T, S>(
    submitter: &ChunkedSubmitter<S>,
    items: &[T],
    backoff: &Backoff,
) -> Result<Vec<S::Ack>>
where
    T: WorkItem + Sync,
    S: BatchSink<T>,
{
    let mut results = Vec::with_capacity(items.len());
    let mut offset = 0;
    let mut attempt = 0;

    loop {
        match submitter.submit_from(items, offset).await {
            Ok(acks) => {
                results.extend(acks);
                return Ok(results);
            }
            Err(err) => {
                attempt += 1;
                let message = err.to_string();
                let resume_offset = err.resume_offset();
                let retryable = match &err.source {
                    ProtocolError::SubmissionFailed { cause, .. } => is_retryable(cause),
                    _ => false,
                };
                results.extend(err.acknowledged);

                if attempt >= backoff.max_attempts || !retryable {
                    return Err(anyhow::Error::new(err.source).context(format!(
                        "Gave up adding tasks after {} attempt(s); {} of {} acknowledged",
                        attempt,
                        results.len(),
                        items.len()
                    )));
                }

                let delay = backoff.delay_after(attempt);
                warn!(
                    "{}. Resuming at item {} of {} in {:?}",
                    message,
                    resume_offset + 1,
                    items.len(),
                    delay
                );
                sleep(delay).await;
                offset = resume_offset;
            }
        }
    }
}

/// Print per-task failures and a summary line
fn report_results(results: &[TaskAddResult]) {
    let failed: Vec<&TaskAddResult> = results.iter().filter(|r| !r.is_success()).collect();

    if !failed.is_empty() {
        println!("{}", "Rejected tasks:".red().bold());
        for result in &failed {
            let reason = result
                .error
                .as_ref()
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no error details".to_string());
            println!("  {} {} {}", "✗".red(), result.task_id.bold(), reason.dimmed());
        }
    }

    println!(
        "{} {} added, {} rejected",
        "✓".green(),
        (results.len() - failed.len()).to_string().green(),
        failed.len().to_string().red()
    );
}

/// Print the tasks of a job
fn print_tasks(job_id: &str, tasks: &[Task]) {
    if tasks.is_empty() {
        println!("{}", format!("Job {} has no tasks.", job_id).yellow());
        return;
    }

    println!("{}", format!("Job {}: {} task(s)", job_id, tasks.len()).bold());
    rule();
    for task in tasks {
        println!(
            "  {:<32} {:<12} {}",
            task.id,
            colorize_task_state(&task.state),
            task.command_line.dimmed()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;
    use tranche_client::ClientError;

    /// Acknowledges every task by id, failing the calls listed in `fail_on`
    struct FlakySink {
        fail_on: Vec<usize>,
        status: u16,
        sent: Mutex<Vec<Vec<String>>>,
    }

    impl FlakySink {
        fn failing_on(fail_on: Vec<usize>, status: u16) -> Self {
            Self {
                fail_on,
                status,
                sent: Mutex::new(Vec::new()),
            }
        }

        fn sent(&self) -> Vec<Vec<String>> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl BatchSink<TaskSpec> for FlakySink {
        type Ack = String;

        async fn submit(&self, batch: &[TaskSpec]) -> anyhow::Result<Vec<String>> {
            let call = {
                let mut sent = self.sent.lock().unwrap();
                sent.push(batch.iter().map(|spec| spec.id.clone()).collect());
                sent.len()
            };

            if self.fail_on.contains(&call) {
                return Err(ClientError::from_response(self.status, "").into());
            }
            Ok(batch.iter().map(|spec| spec.id.clone()).collect())
        }
    }

    fn specs(count: usize) -> Vec<TaskSpec> {
        (1..=count)
            .map(|n| TaskSpec::new(task_id("job", n), "sleep 100"))
            .collect()
    }

    fn backoff() -> Backoff {
        Backoff::new(Duration::from_secs(1), Duration::from_secs(4), 3)
    }

    fn ids(range: std::ops::RangeInclusive<usize>) -> Vec<String> {
        range.map(|n| task_id("job", n)).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_resume_skips_acknowledged_batches() {
        let sink = FlakySink::failing_on(vec![2], 503);
        let submitter = ChunkedSubmitter::new(&sink, 3).unwrap();
        let items = specs(7);

        let acks = submit_with_resume(&submitter, &items, &backoff())
            .await
            .unwrap();

        assert_eq!(acks, ids(1..=7));
        assert_eq!(
            sink.sent(),
            vec![ids(1..=3), ids(4..=6), ids(4..=6), ids(7..=7)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_batch_is_not_resent() {
        let sink = FlakySink::failing_on(vec![2], 400);
        let submitter = ChunkedSubmitter::new(&sink, 3).unwrap();
        let items = specs(7);

        let err = submit_with_resume(&submitter, &items, &backoff())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("3 of 7 acknowledged"));
        assert_eq!(sink.sent(), vec![ids(1..=3), ids(4..=6)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_attempts() {
        let sink = FlakySink::failing_on(vec![1, 2, 3], 503);
        let submitter = ChunkedSubmitter::new(&sink, 3).unwrap();

        let err = submit_with_resume(&submitter, &specs(4), &backoff())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("after 3 attempt(s)"));
        assert_eq!(sink.sent().len(), 3);
    }
}
