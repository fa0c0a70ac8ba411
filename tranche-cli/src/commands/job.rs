//! Job command handlers
//!
//! Handles listing jobs across every page, viewing a single job, and
//! making sure a job exists before tasks are added to it.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use tracing::info;
use tranche_client::PoolServiceClient;
use tranche_core::domain::job::Job;
use tranche_core::dto::job::CreateJob;
use tranche_protocol::PageWalker;
use tranche_protocol::backoff::retry_if;

use super::output::{colorize_job_state, fetch_backoff, is_retryable, print_json};
use crate::config::Config;

/// Job subcommands
#[derive(Subcommand)]
pub enum JobCommands {
    /// List all jobs, following every page
    List {
        /// Jobs requested per page
        #[arg(long)]
        page_size: Option<u32>,

        /// Print JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Get job details
    Get {
        /// Job ID
        id: String,
    },
    /// Create a job unless it already exists
    Ensure {
        /// Job ID
        id: String,

        /// Pool the job runs on
        #[arg(long, default_value = "pool1")]
        pool: String,
    },
}

/// Handle job commands
///
/// Routes job subcommands to their respective handlers.
///
/// # Arguments
/// * `command` - The job command to execute
/// * `config` - The CLI configuration
pub async fn handle_job_command(command: JobCommands, config: &Config) -> Result<()> {
    let client = config.client()?;

    match command {
        JobCommands::List { page_size, json } => {
            list_all_jobs(&client, page_size.unwrap_or(config.page_size), json).await
        }
        JobCommands::Get { id } => get_job(&client, &id).await,
        JobCommands::Ensure { id, pool } => {
            ensure_job(&client, &id, &pool).await?;
            Ok(())
        }
    }
}

/// List all jobs
async fn list_all_jobs(client: &PoolServiceClient, page_size: u32, json: bool) -> Result<()> {
    let first = retry_if(&fetch_backoff(), "Listing jobs", is_retryable, |_| async {
        anyhow::Ok(client.list_jobs(page_size).await?)
    })
    .await?;

    let jobs = PageWalker::new(client.job_pages(), first)
        .collect_all()
        .await
        .context("Failed to page through jobs")?;

    if json {
        return print_json(&jobs);
    }

    if jobs.is_empty() {
        println!("{}", "No jobs found.".yellow());
    } else {
        println!("{}", format!("Found {} job(s):", jobs.len()).bold());
        println!();
        for job in &jobs {
            print_job_summary(job);
        }
    }

    Ok(())
}

/// Get and display a single job
async fn get_job(client: &PoolServiceClient, id: &str) -> Result<()> {
    match client.get_job(id).await? {
        Some(job) => print_job_details(&job),
        None => println!("{}", format!("Job {} does not exist.", id).yellow()),
    }

    Ok(())
}

/// Make sure a job exists, creating it on `pool_id` when missing
///
/// # Returns
/// `true` if the job was created
pub async fn ensure_job(client: &PoolServiceClient, job_id: &str, pool_id: &str) -> Result<bool> {
    if let Some(job) = client
        .get_job(job_id)
        .await
        .with_context(|| format!("Failed to look up job {}", job_id))?
    {
        info!("Job {} exists ({})", job.id, job.state);
        return Ok(false);
    }

    println!(
        "{}",
        format!("Job {} does not exist. Creating on pool {}...", job_id, pool_id).yellow()
    );
    client
        .add_job(CreateJob::new(job_id, pool_id))
        .await
        .with_context(|| format!("Failed to create job {}", job_id))?;
    println!("{} Created job {}", "✓".green(), job_id.bold());

    Ok(true)
}

/// Print a job summary
fn print_job_summary(job: &Job) {
    println!("  {} Job {}", "▸".cyan(), job.id.bold());
    println!("    State:    {}", colorize_job_state(&job.state));
    if let Some(pool) = job.pool_id() {
        println!("    Pool:     {}", pool.dimmed());
    }
    if let Some(created) = job.creation_time {
        println!(
            "    Created:  {}",
            created.format("%Y-%m-%d %H:%M:%S").to_string().dimmed()
        );
    }
    println!();
}

/// Print detailed job information
fn print_job_details(job: &Job) {
    println!("{}", "Job Details:".bold());
    println!("  ID:           {}", job.id.cyan());
    if let Some(name) = &job.display_name {
        println!("  Display Name: {}", name);
    }
    println!("  State:        {}", colorize_job_state(&job.state));
    println!("  Pool:         {}", job.pool_id().unwrap_or("-"));
    if let Some(created) = job.creation_time {
        println!("  Created:      {}", created.format("%Y-%m-%d %H:%M:%S"));
    }
}
