//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod job;
mod output;
mod pool;
mod task;

pub use job::JobCommands;
pub use pool::PoolCommands;
pub use task::TaskCommands;

use anyhow::Result;
use clap::Subcommand;
use tokio_util::sync::CancellationToken;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Job management
    Job {
        #[command(subcommand)]
        command: JobCommands,
    },
    /// Task listing and bulk creation
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },
    /// Pool provisioning
    Pool {
        #[command(subcommand)]
        command: PoolCommands,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
///
/// # Arguments
/// * `command` - The command to execute
/// * `config` - The CLI configuration
/// * `cancel` - Cancelled on Ctrl-C; long waits stop when it fires
pub async fn handle_command(
    command: Commands,
    config: &Config,
    cancel: &CancellationToken,
) -> Result<()> {
    match command {
        Commands::Job { command } => job::handle_job_command(command, config).await,
        Commands::Task { command } => task::handle_task_command(command, config).await,
        Commands::Pool { command } => pool::handle_pool_command(command, config, cancel).await,
    }
}
