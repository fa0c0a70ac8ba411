//! Tranche CLI
//!
//! Command-line interface for a compute-pool service: list jobs, tasks and
//! pools across pages, fill jobs with tasks in bulk, and provision pools.

mod commands;
mod config;
mod types;

use anyhow::{Context, Result};
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "tranche")]
#[command(about = "Compute pool service CLI", long_about = None)]
struct Cli {
    /// Service URL (overrides the configured endpoint)
    #[arg(long, env = "TRANCHE_ENDPOINT")]
    endpoint: Option<String>,

    /// Bearer token sent with every request
    #[arg(long, env = "TRANCHE_ACCESS_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so command output stays pipeable
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "warn,tranche_cli=info,tranche_protocol=info,tranche_client=info".into()
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = load_config(cli.endpoint)?;
    if let Some(token) = cli.token {
        config.access_token = Some(token);
    }
    config.validate().context("Invalid configuration")?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, stopping");
            on_signal.cancel();
        }
    });

    handle_command(cli.command, &config, &cancel).await
}

/// Load configuration from the environment
///
/// `endpoint` comes from `--endpoint` or `TRANCHE_ENDPOINT`; one of them is
/// required.
fn load_config(endpoint: Option<String>) -> Result<Config> {
    Config::from_lookup(|name| match name {
        "TRANCHE_ENDPOINT" => endpoint.clone(),
        _ => std::env::var(name).ok(),
    })
}
