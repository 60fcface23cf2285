//! Difficulty retargeting.
//!
//! Every `ADJUSTMENT_INTERVAL` blocks the time taken to produce the last
//! interval is compared against the expected time. Much faster raises the
//! difficulty by one, much slower lowers it by one (never below 1). At every
//! other height the difficulty is carried over unchanged.

use fractalchain_core::Block;

/// Number of blocks between retargets.
pub const ADJUSTMENT_INTERVAL: u64 = 10;

/// Target time between blocks, in milliseconds.
pub const TARGET_BLOCK_TIME_MS: u64 = 60_000;

/// Lowest difficulty a retarget can step down to.
pub const MIN_DIFFICULTY: u32 = 1;

/// Computes the difficulty of the next block from recent block timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DifficultyController {
    /// Blocks between retargets.
    pub interval: u64,
    /// Target block time in milliseconds.
    pub target_block_time_ms: u64,
}

impl Default for DifficultyController {
    fn default() -> Self {
        Self {
            interval: ADJUSTMENT_INTERVAL,
            target_block_time_ms: TARGET_BLOCK_TIME_MS,
        }
    }
}

impl DifficultyController {
    /// Create a controller with custom timing parameters.
    pub fn new(interval: u64, target_block_time_ms: u64) -> Self {
        Self {
            interval: interval.max(1),
            target_block_time_ms,
        }
    }

    /// Expected duration of one adjustment window.
    pub fn expected_window_ms(&self) -> u64 {
        self.interval.saturating_mul(self.target_block_time_ms)
    }

    /// Whether a block at this index triggers a retarget for its successor.
    pub fn is_adjustment_height(&self, index: u64) -> bool {
        index != 0 && index % self.interval == 0
    }

    /// Difficulty for the block following the last block of `chain`.
    ///
    /// `chain` must be indexed by position (`chain[i].index == i`). Returns
    /// `None` only for an empty chain.
    pub fn next_difficulty(&self, chain: &[Block]) -> Option<u32> {
        let last = chain.last()?;
        if !self.is_adjustment_height(last.index) {
            return Some(last.difficulty);
        }

        let anchor_index = last.index - self.interval;
        match chain.get(anchor_index as usize) {
            Some(anchor) => Some(self.adjust(last, anchor)),
            None => {
                tracing::warn!(
                    index = last.index,
                    anchor_index,
                    "retarget anchor block missing; keeping difficulty"
                );
                Some(last.difficulty)
            }
        }
    }

    /// Apply the retarget rule given the last block and the block one window earlier.
    pub fn adjust(&self, last: &Block, anchor: &Block) -> u32 {
        let expected = self.expected_window_ms();
        let actual = last.timestamp.saturating_sub(anchor.timestamp);

        // actual < expected / 2, without truncating an odd expected
        let next = if actual.saturating_mul(2) < expected {
            last.difficulty.saturating_add(1)
        } else if actual > expected.saturating_mul(2) {
            last.difficulty.saturating_sub(1).max(MIN_DIFFICULTY)
        } else {
            last.difficulty
        };

        if next != last.difficulty {
            tracing::info!(
                index = last.index,
                actual_ms = actual,
                expected_ms = expected,
                from = last.difficulty,
                to = next,
                "difficulty retarget"
            );
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fractalchain_core::Hash;

    /// Build `count` blocks spaced `spacing_ms` apart, all at `difficulty`.
    fn spaced_chain(count: u64, spacing_ms: u64, difficulty: u32) -> Vec<Block> {
        (0..count)
            .map(|i| {
                let mut block = Block::new(i, Hash::ZERO, vec![], difficulty);
                block.timestamp = 1_700_000_000_000 + i * spacing_ms;
                block
            })
            .collect()
    }

    #[test]
    fn test_fast_window_raises_difficulty() {
        // Blocks 0..=10 five seconds apart: actual 50s < 300s
        let chain = spaced_chain(11, 5_000, 5);
        let controller = DifficultyController::default();
        assert_eq!(controller.next_difficulty(&chain), Some(6));
    }

    #[test]
    fn test_slow_window_lowers_difficulty() {
        // Blocks 0..=10 two hundred seconds apart: actual 2000s > 1200s
        let chain = spaced_chain(11, 200_000, 5);
        let controller = DifficultyController::default();
        assert_eq!(controller.next_difficulty(&chain), Some(4));
    }

    #[test]
    fn test_slow_window_floors_at_one() {
        let chain = spaced_chain(11, 200_000, 1);
        let controller = DifficultyController::default();
        assert_eq!(controller.next_difficulty(&chain), Some(1));
    }

    #[test]
    fn test_on_target_window_unchanged() {
        let chain = spaced_chain(11, 60_000, 5);
        let controller = DifficultyController::default();
        assert_eq!(controller.next_difficulty(&chain), Some(5));
    }

    #[test]
    fn test_window_boundaries_are_exclusive() {
        let controller = DifficultyController::default();

        // actual == expected/2 exactly: not "less than", unchanged
        let chain = spaced_chain(11, 30_000, 5);
        assert_eq!(controller.next_difficulty(&chain), Some(5));

        // actual == expected*2 exactly: not "greater than", unchanged
        let chain = spaced_chain(11, 120_000, 5);
        assert_eq!(controller.next_difficulty(&chain), Some(5));
    }

    #[test]
    fn test_non_adjustment_heights_carry_over() {
        let controller = DifficultyController::default();
        for len in [2, 5, 10, 12, 20] {
            let chain = spaced_chain(len, 5_000, 7);
            let last = chain.last().unwrap().index;
            assert!(!controller.is_adjustment_height(last));
            assert_eq!(controller.next_difficulty(&chain), Some(7));
        }
    }

    #[test]
    fn test_genesis_only_carries_over() {
        let chain = spaced_chain(1, 0, 5);
        assert_eq!(DifficultyController::default().next_difficulty(&chain), Some(5));
    }

    #[test]
    fn test_empty_chain() {
        assert_eq!(DifficultyController::default().next_difficulty(&[]), None);
    }

    #[test]
    fn test_uses_block_one_interval_back() {
        // Window measured from index 10 to index 20, not from index 11
        let mut chain = spaced_chain(21, 60_000, 3);
        chain[10].timestamp = chain[20].timestamp - 10_000;
        assert_eq!(DifficultyController::default().next_difficulty(&chain), Some(4));
    }

    #[test]
    fn test_custom_interval() {
        let controller = DifficultyController::new(2, 1_000);
        let chain = spaced_chain(3, 100, 2);
        assert_eq!(controller.next_difficulty(&chain), Some(3));
    }
}
