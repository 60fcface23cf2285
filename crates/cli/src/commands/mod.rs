//! CLI commands module.

use anyhow::Result;
use clap::Subcommand;

mod block;
mod common;
mod init;
mod mine;
mod status;
mod verify;

#[derive(Subcommand)]
pub enum Commands {
    /// Create the ledger with its genesis block
    Init(init::InitArgs),
    /// Mine blocks until interrupted
    Mine(mine::MineArgs),
    /// Block operations
    Block(block::BlockArgs),
    /// Validate the persisted chain
    Verify(verify::VerifyArgs),
    /// Show ledger status
    Status(status::StatusArgs),
}

pub fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Init(args) => init::run(args),
        Commands::Mine(args) => mine::run(args),
        Commands::Block(args) => block::run(args),
        Commands::Verify(args) => verify::run(args),
        Commands::Status(args) => status::run(args),
    }
}
