//! Mining command.

use super::common::{short_hash, LedgerArgs};
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use crossbeam_channel::Sender;
use fractalchain_chain::{transaction_feed, ChainConfig, TransactionFeed, DEFAULT_NODE_ID};
use fractalchain_core::Transaction;
use fractalchain_miner::{Coordinator, MinerConfig, CHUNK_SIZE};
use std::thread;
use tokio::runtime::{Builder, Runtime};
use tracing::{info, warn};

#[derive(Args)]
pub struct MineArgs {
    #[command(flatten)]
    ledger: LedgerArgs,

    /// Number of search units (defaults to the CPU count)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Nonces assigned to each unit per round
    #[arg(long, default_value_t = CHUNK_SIZE)]
    chunk_size: u64,

    /// Identity credited with block rewards
    #[arg(long, env = "HOSTNAME", default_value = DEFAULT_NODE_ID)]
    node_id: String,

    /// Genesis difficulty if the ledger does not exist yet (overrides DIFFICULTY)
    #[arg(long)]
    difficulty: Option<u32>,

    /// Enqueue this many demo transactions before mining starts
    #[arg(long, default_value_t = 0)]
    simulate: usize,
}

pub fn run(args: MineArgs) -> Result<()> {
    let mut chain = ChainConfig::from_env()
        .context("Invalid environment configuration")?
        .with_node_id(args.node_id.as_str());
    if let Some(difficulty) = args.difficulty {
        chain.genesis_difficulty = difficulty;
    }

    let mut config = MinerConfig::default().with_chunk_size(args.chunk_size);
    if let Some(workers) = args.workers {
        config = config.with_workers(workers);
    }

    let ledger = args.ledger.open_ledger(chain.genesis_difficulty)?;
    let (feed, receiver) = transaction_feed();
    let mut coordinator = Coordinator::new(ledger, &chain, config.clone())
        .context("Failed to start miner")?
        .with_feed(receiver);

    if args.simulate > 0 {
        simulate_transactions(&feed, args.simulate)?;
    }

    println!("{}", "Mining...".bold().cyan());
    println!(
        "  Node:     {}\n  Workers:  {}\n  Height:   {}\n  Ledger:   {}",
        chain.node_id.bright_yellow(),
        config.workers.to_string().bright_cyan(),
        coordinator.ledger().height().to_string().bright_cyan(),
        coordinator.ledger().location().bright_black()
    );
    println!("  Press {} to stop.", "Ctrl+C".bold());
    println!();

    let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded::<()>(0);
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build signal runtime")?;
    spawn_signal_listener(runtime, shutdown_tx)?;

    coordinator.run(&shutdown_rx).context("Mining failed")?;

    let status = coordinator.status();
    println!();
    println!("{}", "Miner stopped".green().bold());
    println!(
        "  Height:       {}",
        status.height.to_string().bright_cyan()
    );
    println!("  Tip:          {}", short_hash(&status.tip_hash).bright_yellow());
    println!(
        "  Blocks mined: {}",
        status.stats.blocks_mined.to_string().bright_cyan()
    );
    println!(
        "  Hash rate:    {}",
        format!("{:.0} H/s", status.stats.hash_rate()).bright_black()
    );
    if status.stats.invalid_reports > 0 || status.stats.respawns > 0 {
        println!(
            "  Discarded:    {} invalid reports, {} unit respawns",
            status.stats.invalid_reports, status.stats.respawns
        );
    }

    Ok(())
}

/// Wait for Ctrl-C or SIGTERM on its own thread, then drop `shutdown`.
fn spawn_signal_listener(runtime: Runtime, shutdown: Sender<()>) -> Result<()> {
    thread::Builder::new()
        .name("signal-listener".to_string())
        .spawn(move || {
            runtime.block_on(wait_for_signal());
            info!("Shutdown requested");
            drop(shutdown);
        })
        .context("Failed to spawn signal listener")?;
    Ok(())
}

async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    result = tokio::signal::ctrl_c() => {
                        if let Err(err) = result {
                            warn!(%err, "Ctrl-C handler failed");
                            std::future::pending::<()>().await;
                        }
                    }
                    _ = terminate.recv() => {}
                }
                return;
            }
            Err(err) => warn!(%err, "SIGTERM handler unavailable, listening for Ctrl-C only"),
        }
    }

    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(%err, "Ctrl-C handler failed");
        std::future::pending::<()>().await;
    }
}

/// Demo traffic among a handful of users.
fn simulate_transactions(feed: &TransactionFeed, count: usize) -> Result<()> {
    const USERS: [&str; 5] = ["alice", "bob", "carol", "dave", "erin"];

    for i in 0..count {
        let from = USERS[i % USERS.len()];
        let to = USERS[(i + 1) % USERS.len()];
        let tx = Transaction::new(from, to, (i as u64 + 1) * 10, format!("demo payment {i}"));
        feed.submit(tx).context("Transaction feed closed")?;
    }
    info!(count, "Enqueued demo transactions");
    Ok(())
}
