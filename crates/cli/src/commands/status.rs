//! Ledger status command.

use super::common::{format_timestamp, LedgerArgs};
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use fractalchain_consensus::DifficultyController;
use fractalchain_core::Block;

#[derive(Args)]
pub struct StatusArgs {
    #[command(flatten)]
    ledger: LedgerArgs,
}

pub fn run(args: StatusArgs) -> Result<()> {
    let blocks = args.ledger.load_blocks()?;
    let tip = blocks.last().context("Ledger is empty")?;
    let controller = DifficultyController::default();
    let next_difficulty = controller
        .next_difficulty(&blocks)
        .unwrap_or(tip.difficulty);

    println!();
    println!("{}", "Ledger Status:".bold().cyan());
    println!();
    println!("  Height:          {}", tip.index.to_string().bright_cyan());
    println!("  Tip:             {}", tip.hash.to_hex().bright_yellow());
    println!(
        "  Tip time:        {}",
        format_timestamp(tip.timestamp).bright_black()
    );
    println!(
        "  Difficulty:      {} (next {})",
        tip.difficulty.to_string().bright_cyan(),
        next_difficulty.to_string().bright_cyan()
    );
    match average_block_time_ms(&blocks, controller.interval) {
        Some(avg) => {
            let summary = format!(
                "{:.1}s over last {} blocks",
                avg as f64 / 1000.0,
                window(&blocks, controller.interval)
            );
            println!("  Avg block time:  {}", summary.bright_black());
        }
        None => println!("  Avg block time:  {}", "n/a".bright_black()),
    }
    println!();
    Ok(())
}

/// Number of block intervals averaged over: up to one retarget window.
fn window(blocks: &[Block], interval: u64) -> usize {
    blocks.len().saturating_sub(1).min(interval as usize)
}

/// Mean spacing of the most recent mined blocks.
fn average_block_time_ms(blocks: &[Block], interval: u64) -> Option<u64> {
    let span = window(blocks, interval);
    if span == 0 {
        return None;
    }
    let last = blocks.last()?;
    let first = &blocks[blocks.len() - 1 - span];
    Some(last.timestamp.saturating_sub(first.timestamp) / span as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fractalchain_core::Hash;

    fn spaced(count: u64, spacing_ms: u64) -> Vec<Block> {
        (0..count)
            .map(|i| {
                let mut block = Block::new(i, Hash::ZERO, Vec::new(), 1);
                block.timestamp = 1_000_000 + i * spacing_ms;
                block
            })
            .collect()
    }

    #[test]
    fn test_average_block_time() {
        assert_eq!(average_block_time_ms(&spaced(1, 5_000), 10), None);
        assert_eq!(average_block_time_ms(&spaced(4, 5_000), 10), Some(5_000));
        assert_eq!(average_block_time_ms(&spaced(25, 2_000), 10), Some(2_000));
    }
}
