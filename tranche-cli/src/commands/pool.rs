//! Pool command handlers
//!
//! Handles pool provisioning: create a pool, wait for its allocation to
//! settle, and optionally tear it down again once it has.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use tokio_util::sync::CancellationToken;
use tranche_client::PoolServiceClient;
use tranche_core::domain::pool::{AllocationState, Pool};
use tranche_core::domain::state::ResourceState;
use tranche_core::dto::pool::{CreatePool, ImageReference};
use tranche_protocol::backoff::retry_if;
use tranche_protocol::{PageWalker, PollOutcome, PollPhase, StatePoller};

use super::output::{colorize_allocation, fetch_backoff, is_retryable, print_json, rule};
use crate::config::Config;
use crate::types::{DEFAULT_IMAGE, generate_pool_name, parse_image};

/// Pool subcommands
#[derive(Subcommand)]
pub enum PoolCommands {
    /// List all pools, following every page
    List {
        /// Print JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Get pool details
    Get {
        /// Pool name
        name: String,
    },
    /// Create a pool
    Create {
        /// Pool name (generated when omitted)
        name: Option<String>,

        /// Virtual machine size of every node
        #[arg(long, default_value = "STANDARD_A1_V2")]
        vm_size: String,

        /// Marketplace image as publisher:offer:sku[:version]
        #[arg(long, value_parser = parse_image, default_value = DEFAULT_IMAGE)]
        image: ImageReference,

        /// Node agent SKU matching the image
        #[arg(long, default_value = "batch.node.ubuntu 18.04")]
        node_agent: String,

        /// Target number of dedicated nodes
        #[arg(long, default_value_t = 1)]
        dedicated: u32,

        /// Target number of low-priority nodes
        #[arg(long, default_value_t = 2)]
        low_priority: u32,

        /// Wait for the pool to reach steady state, then delete it
        #[arg(long)]
        teardown: bool,
    },
    /// Wait for a pool to reach an allocation state
    Wait {
        /// Pool name
        name: String,

        /// Allocation state to wait for
        #[arg(long, default_value = "Steady")]
        state: AllocationState,

        /// Delete the pool once it has settled
        #[arg(long)]
        delete: bool,
    },
    /// Delete a pool
    Delete {
        /// Pool name
        name: String,
    },
}

/// Handle pool commands
///
/// Routes pool subcommands to their respective handlers.
///
/// # Arguments
/// * `command` - The pool command to execute
/// * `config` - The CLI configuration
/// * `cancel` - Stops a running wait
pub async fn handle_pool_command(
    command: PoolCommands,
    config: &Config,
    cancel: &CancellationToken,
) -> Result<()> {
    let client = config.client()?;

    match command {
        PoolCommands::List { json } => list_pools(&client, json).await,
        PoolCommands::Get { name } => get_pool(&client, &name).await,
        PoolCommands::Create {
            name,
            vm_size,
            image,
            node_agent,
            dedicated,
            low_priority,
            teardown,
        } => {
            let name = name.unwrap_or_else(|| generate_pool_name("arm-pool"));
            let request = CreatePool::new(vm_size, image, node_agent, dedicated, low_priority);
            create_pool(&client, &name, request).await?;

            if teardown {
                wait_for_pool(&client, config, &name, AllocationState::Steady, true, cancel).await?;
            }
            Ok(())
        }
        PoolCommands::Wait {
            name,
            state,
            delete,
        } => wait_for_pool(&client, config, &name, state, delete, cancel).await,
        PoolCommands::Delete { name } => delete_pool(&client, &name).await,
    }
}

/// List all pools
async fn list_pools(client: &PoolServiceClient, json: bool) -> Result<()> {
    let first = retry_if(&fetch_backoff(), "Listing pools", is_retryable, |_| async {
        anyhow::Ok(client.list_pools().await?)
    })
    .await?;

    let pools = PageWalker::new(client.pool_pages(), first)
        .collect_all()
        .await
        .context("Failed to page through pools")?;

    if json {
        return print_json(&pools);
    }

    if pools.is_empty() {
        println!("{}", "No pools found.".yellow());
        return Ok(());
    }

    println!("{}", format!("Found {} pool(s):", pools.len()).bold());
    rule();
    for pool in &pools {
        println!(
            "  {:<28} {:<16} {:<10} {}/{} nodes",
            pool.name.bold(),
            pool.vm_size,
            colorize_allocation(&pool.allocation_state),
            pool.current_dedicated_nodes + pool.current_low_priority_nodes,
            pool.target_dedicated_nodes + pool.target_low_priority_nodes
        );
    }

    Ok(())
}

/// Get and display a single pool
async fn get_pool(client: &PoolServiceClient, name: &str) -> Result<()> {
    let pool = client
        .get_pool(name)
        .await
        .with_context(|| format!("Failed to get pool {}", name))?;
    print_pool_details(&pool);
    Ok(())
}

/// Create a pool and print what the service accepted
async fn create_pool(client: &PoolServiceClient, name: &str, request: CreatePool) -> Result<()> {
    println!("Creating pool {}...", name.bold());

    let pool = client
        .create_pool(name, request)
        .await
        .with_context(|| format!("Failed to create pool {}", name))?;

    println!("{} Pool {} accepted", "✓".green(), pool.name.bold());
    print_pool_details(&pool);
    Ok(())
}

/// Delete a pool
async fn delete_pool(client: &PoolServiceClient, name: &str) -> Result<()> {
    client
        .delete_pool(name)
        .await
        .with_context(|| format!("Failed to delete pool {}", name))?;
    println!("{} Deletion of pool {} started", "✓".green(), name.bold());
    Ok(())
}

/// Wait for a pool to settle in `target`, optionally deleting it afterwards
///
/// Phase changes are printed as they happen. Cancelling leaves the pool
/// untouched.
async fn wait_for_pool(
    client: &PoolServiceClient,
    config: &Config,
    name: &str,
    target: AllocationState,
    delete: bool,
    cancel: &CancellationToken,
) -> Result<()> {
    let poller = StatePoller::new(client.pool_allocation(), config.poller_config());
    let mut phases = poller.subscribe();

    println!(
        "Waiting for pool {} to reach {} (every {:?}, settling for {:?})...",
        name.bold(),
        colorize_allocation(&target),
        config.poll_interval,
        config.settle_delay
    );

    let wait = poller.wait_then_observed(name, &target, cancel, print_tick, |state| async move {
        print_settled(&state);
        if delete {
            client.delete_pool(&state.identifier).await?;
            println!("{} Deletion of pool {} started", "✓".green(), state.identifier.bold());
        }
        Ok::<_, anyhow::Error>(state)
    });
    tokio::pin!(wait);

    let outcome = loop {
        tokio::select! {
            outcome = &mut wait => break outcome?,
            Ok(()) = phases.changed() => {
                let phase = *phases.borrow_and_update();
                print_phase(phase, config);
            }
        }
    };

    if let PollOutcome::Cancelled = outcome {
        println!(
            "{}",
            format!("Stopped waiting; pool {} was left in place.", name).yellow()
        );
    }

    Ok(())
}

fn print_phase(phase: PollPhase, config: &Config) {
    match phase {
        PollPhase::Reached => println!(
            "  {} target state reached, settling for {:?}",
            "▸".cyan(),
            config.settle_delay
        ),
        PollPhase::Idle | PollPhase::Polling | PollPhase::Settled | PollPhase::Cancelled => {}
    }
}

/// Print one polled snapshot as `name vmSize state [dedicated : lowPriority]`
fn print_tick(state: &ResourceState<AllocationState>) {
    println!("  {}", tick_line(state));
}

fn tick_line(state: &ResourceState<AllocationState>) -> String {
    let field = |key: &str| {
        state
            .metadata
            .get(key)
            .map(|value| match value.as_str() {
                Some(text) => text.to_string(),
                None => value.to_string(),
            })
            .unwrap_or_else(|| "-".to_string())
    };

    format!(
        "{} {} {} [{} : {}]",
        state.identifier,
        field("vmSize"),
        state.current_state,
        field("currentDedicatedNodes"),
        field("currentLowPriorityNodes")
    )
}

fn print_settled(state: &ResourceState<AllocationState>) {
    println!(
        "{} Pool {} is {}",
        "✓".green(),
        state.identifier.bold(),
        colorize_allocation(&state.current_state)
    );
    for (key, value) in &state.metadata {
        println!("    {:<24} {}", key, value);
    }
}

/// Print detailed pool information
fn print_pool_details(pool: &Pool) {
    println!("{}", "Pool Details:".bold());
    println!("  Name:             {}", pool.name.cyan());
    println!("  VM Size:          {}", pool.vm_size);
    println!(
        "  Allocation:       {}",
        colorize_allocation(&pool.allocation_state)
    );
    if let Some(provisioning) = &pool.provisioning_state {
        println!("  Provisioning:     {}", provisioning);
    }
    println!(
        "  Dedicated:        {}/{}",
        pool.current_dedicated_nodes, pool.target_dedicated_nodes
    );
    println!(
        "  Low Priority:     {}/{}",
        pool.current_low_priority_nodes, pool.target_low_priority_nodes
    );
    if let Some(changed) = pool.allocation_state_transition_time {
        println!("  State Since:      {}", changed.format("%Y-%m-%d %H:%M:%S"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tick_line() {
        let state = ResourceState::new("arm-pool-1a2b3c4d", AllocationState::Resizing)
            .with_metadata("vmSize", json!("STANDARD_A1_V2"))
            .with_metadata("currentDedicatedNodes", json!(1))
            .with_metadata("currentLowPriorityNodes", json!(0));

        assert_eq!(
            tick_line(&state),
            "arm-pool-1a2b3c4d STANDARD_A1_V2 Resizing [1 : 0]"
        );
    }

    #[test]
    fn test_tick_line_without_metadata() {
        let state = ResourceState::new("arm-pool-1", AllocationState::Steady);
        assert_eq!(tick_line(&state), "arm-pool-1 - Steady [- : -]");
    }
}
