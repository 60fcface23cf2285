//! Initialize chain command.

use super::common::{format_timestamp, LedgerArgs};
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use fractalchain_chain::ChainConfig;

#[derive(Args)]
pub struct InitArgs {
    #[command(flatten)]
    ledger: LedgerArgs,

    /// Genesis difficulty in leading hex zeros (overrides DIFFICULTY)
    #[arg(long)]
    difficulty: Option<u32>,
}

pub fn run(args: InitArgs) -> Result<()> {
    println!("{}", "Initializing fractalchain...".bold().cyan());
    println!();

    let config = ChainConfig::from_env().context("Invalid environment configuration")?;
    let difficulty = args.difficulty.unwrap_or(config.genesis_difficulty);

    let ledger = args.ledger.open_ledger(difficulty)?;
    let genesis = ledger.block_at(0).context("Ledger has no genesis block")?;

    if ledger.height() > 0 {
        println!(
            "{}  Ledger already exists with {} blocks",
            "!".yellow().bold(),
            ledger.len().to_string().bright_cyan()
        );
    } else {
        println!("{}  Created genesis block", "✓".green().bold());
    }
    println!("    Location:   {}", ledger.location().bright_black());
    println!("    Hash:       {}", genesis.hash.to_hex().bright_yellow());
    println!(
        "    Difficulty: {}",
        genesis.difficulty.to_string().bright_cyan()
    );
    println!(
        "    Timestamp:  {}",
        format_timestamp(genesis.timestamp).bright_black()
    );

    println!();
    println!("Next steps:");
    println!("  • Use {} to start mining", "fractalchain mine".bright_cyan());
    println!(
        "  • Use {} to explore blocks",
        "fractalchain block list".bright_cyan()
    );

    Ok(())
}
