//! Block operations command.

use super::common::{format_timestamp, short_hash, LedgerArgs};
use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;
use fractalchain_core::{Block, Hash};

#[derive(Args)]
pub struct BlockArgs {
    #[command(subcommand)]
    command: BlockCommand,
}

#[derive(Subcommand)]
enum BlockCommand {
    /// List recent blocks
    List {
        #[command(flatten)]
        ledger: LedgerArgs,

        /// Number of blocks to show
        #[arg(short, long, default_value = "10")]
        count: usize,
    },
    /// Show detailed block information
    Info {
        #[command(flatten)]
        ledger: LedgerArgs,

        /// Block index or hash (hex format)
        block_id: String,
    },
}

pub fn run(args: BlockArgs) -> Result<()> {
    match args.command {
        BlockCommand::List { ledger, count } => list_blocks(&ledger, count),
        BlockCommand::Info { ledger, block_id } => show_block_info(&ledger, &block_id),
    }
}

fn list_blocks(ledger: &LedgerArgs, count: usize) -> Result<()> {
    let blocks = ledger.load_blocks()?;

    println!();
    println!("{}", "Recent Blocks:".bold().cyan());
    println!();

    for block in blocks.iter().rev().take(count) {
        println!(
            "  {} {} {} {}",
            format!("#{}", block.index).bright_black(),
            short_hash(&block.hash).bright_yellow(),
            format!("d={}", block.difficulty).bright_cyan(),
            format!("({} txs)", block.tx_count()).bright_black()
        );
    }

    println!();
    Ok(())
}

fn show_block_info(ledger: &LedgerArgs, block_id: &str) -> Result<()> {
    let blocks = ledger.load_blocks()?;
    let block = find_block(&blocks, block_id)?;

    println!();
    println!("{}", "Block Information:".bold().cyan());
    println!();
    println!("  Index:        {}", block.index.to_string().bright_cyan());
    println!("  Hash:         {}", block.hash.to_hex().bright_yellow());
    println!(
        "  Parent Hash:  {}",
        block.previous_hash.to_hex().bright_black()
    );
    println!(
        "  Merkle Root:  {}",
        block.merkle_root.to_hex().bright_black()
    );
    println!(
        "  Timestamp:    {}",
        format_timestamp(block.timestamp).bright_black()
    );
    println!(
        "  Difficulty:   {}",
        block.difficulty.to_string().bright_cyan()
    );
    println!("  Nonce:        {}", block.nonce.to_string().bright_black());
    println!(
        "  Transactions: {}",
        block.tx_count().to_string().bright_cyan()
    );
    println!();

    if !block.transactions.is_empty() {
        println!("{}", "Transactions:".bold());
        println!();
        for (i, tx) in block.transactions.iter().enumerate() {
            println!(
                "  {} {} {} -> {} {}",
                format!("{}.", i + 1).bright_black(),
                short_hash(&tx.hash()).bright_yellow(),
                tx.from,
                tx.to,
                tx.amount.to_string().bright_cyan()
            );
        }
        println!();
    }

    Ok(())
}

/// Look a block up by index, or by full hex hash.
fn find_block<'a>(blocks: &'a [Block], block_id: &str) -> Result<&'a Block> {
    if let Ok(index) = block_id.parse::<u64>() {
        return blocks
            .get(index as usize)
            .with_context(|| format!("Block {index} not found"));
    }
    let hash =
        Hash::from_hex(block_id).with_context(|| format!("Invalid block hash: {block_id}"))?;
    blocks
        .iter()
        .find(|block| block.hash == hash)
        .with_context(|| format!("Block {block_id} not found"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_block_by_index_and_hash() {
        let blocks = vec![Block::genesis(1)];
        let genesis_hex = blocks[0].hash.to_hex();

        assert_eq!(find_block(&blocks, "0").unwrap().index, 0);
        assert_eq!(find_block(&blocks, &genesis_hex).unwrap().index, 0);
        assert!(find_block(&blocks, "7").is_err());
        assert!(find_block(&blocks, "not-a-hash").is_err());
        assert!(find_block(&blocks, &Hash::ZERO.to_hex()).is_err());
    }
}
