//! Ledger configuration.

use std::env;
use thiserror::Error;

/// Environment variable overriding the initial difficulty.
pub const DIFFICULTY_ENV: &str = "DIFFICULTY";

/// Initial difficulty when `DIFFICULTY` is unset.
pub const DEFAULT_DIFFICULTY: u32 = 5;

/// Amount credited to the local node by each block's reward transaction.
pub const MINING_REWARD: u64 = 50;

/// Identity credited when none is configured.
pub const DEFAULT_NODE_ID: &str = "local-node";

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be a non-negative integer, got {value:?}")]
    InvalidInteger { name: &'static str, value: String },
}

/// Ledger configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainConfig {
    /// Difficulty of the synthesized genesis block.
    pub genesis_difficulty: u32,
    /// Reward per mined block.
    pub mining_reward: u64,
    /// Identity credited with rewards.
    pub node_id: String,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            genesis_difficulty: DEFAULT_DIFFICULTY,
            mining_reward: MINING_REWARD,
            node_id: DEFAULT_NODE_ID.to_string(),
        }
    }
}

impl ChainConfig {
    /// Defaults with the `DIFFICULTY` environment override applied.
    pub fn from_env() -> Result<Self, ConfigError> {
        let genesis_difficulty = parse_difficulty(env::var(DIFFICULTY_ENV).ok().as_deref())?;
        Ok(Self {
            genesis_difficulty,
            ..Self::default()
        })
    }

    /// Set the node identity.
    pub fn with_node_id(mut self, node_id: impl Into<String>) -> Self {
        self.node_id = node_id.into();
        self
    }
}

/// Parse a difficulty override. `None` or a blank value yields the default.
pub fn parse_difficulty(value: Option<&str>) -> Result<u32, ConfigError> {
    match value.map(str::trim) {
        None | Some("") => Ok(DEFAULT_DIFFICULTY),
        Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidInteger {
            name: DIFFICULTY_ENV,
            value: raw.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ChainConfig::default();
        assert_eq!(config.genesis_difficulty, 5);
        assert_eq!(config.mining_reward, 50);
    }

    #[test]
    fn test_parse_difficulty() {
        assert_eq!(parse_difficulty(None), Ok(5));
        assert_eq!(parse_difficulty(Some("")), Ok(5));
        assert_eq!(parse_difficulty(Some(" 3 ")), Ok(3));
        assert_eq!(parse_difficulty(Some("0")), Ok(0));
        assert!(matches!(
            parse_difficulty(Some("five")),
            Err(ConfigError::InvalidInteger { .. })
        ));
        assert!(parse_difficulty(Some("-1")).is_err());
    }

    #[test]
    fn test_with_node_id() {
        let config = ChainConfig::default().with_node_id("miner-7");
        assert_eq!(config.node_id, "miner-7");
    }
}
