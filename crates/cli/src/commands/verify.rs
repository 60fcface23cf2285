//! Chain verification command.

use super::common::LedgerArgs;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use fractalchain_consensus::ChainValidator;

#[derive(Args)]
pub struct VerifyArgs {
    #[command(flatten)]
    ledger: LedgerArgs,
}

pub fn run(args: VerifyArgs) -> Result<()> {
    let blocks = args.ledger.load_blocks()?;

    println!("{}", "Verifying chain...".bold().cyan());
    ChainValidator::validate_chain(&blocks).context("Chain verification failed")?;

    let transactions: usize = blocks.iter().map(|block| block.tx_count()).sum();
    println!(
        "{}  {} blocks, {} transactions: linkage, merkle roots and proof-of-work valid",
        "✓".green().bold(),
        blocks.len().to_string().bright_cyan(),
        transactions.to_string().bright_cyan()
    );
    Ok(())
}
