//! Nonce space partitioning.

use std::ops::Range;

/// Half-open nonce interval `[start, end)` searched by one unit in one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NonceRange {
    pub start: u64,
    pub end: u64,
}

impl NonceRange {
    pub fn new(start: u64, end: u64) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    /// Number of nonces in the range.
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, nonce: u64) -> bool {
        self.start <= nonce && nonce < self.end
    }

    /// Whether two ranges share any nonce.
    pub fn overlaps(&self, other: &NonceRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Nonces in ascending order.
    pub fn iter(&self) -> Range<u64> {
        self.start..self.end
    }
}

/// Split `[0, units * chunk_size)` into `units` contiguous chunks, one per unit.
///
/// Unit `i` gets `[i * chunk_size, (i + 1) * chunk_size)`. Bounds saturate at
/// `u64::MAX`; [`crate::MinerConfig::validate`] rejects configurations where
/// that would happen.
pub fn partition(units: usize, chunk_size: u64) -> Vec<NonceRange> {
    (0..units as u64)
        .map(|i| {
            NonceRange::new(
                i.saturating_mul(chunk_size),
                (i + 1).saturating_mul(chunk_size),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_covers_space_without_overlap() {
        let chunk = 1_000_000;
        for units in [1usize, 2, 3, 8, 16] {
            let ranges = partition(units, chunk);
            assert_eq!(ranges.len(), units);

            // Contiguous from 0 to units * chunk
            assert_eq!(ranges[0].start, 0);
            for pair in ranges.windows(2) {
                assert_eq!(pair[0].end, pair[1].start);
            }
            assert_eq!(ranges[units - 1].end, units as u64 * chunk);

            // Pairwise disjoint
            for (i, a) in ranges.iter().enumerate() {
                assert_eq!(a.len(), chunk);
                for b in &ranges[i + 1..] {
                    assert!(!a.overlaps(b));
                }
            }

            let total: u64 = ranges.iter().map(NonceRange::len).sum();
            assert_eq!(total, units as u64 * chunk);
        }
    }

    #[test]
    fn test_partition_zero_units() {
        assert!(partition(0, 10).is_empty());
    }

    #[test]
    fn test_range_membership() {
        let range = NonceRange::new(10, 20);
        assert!(range.contains(10));
        assert!(range.contains(19));
        assert!(!range.contains(20));
        assert_eq!(range.iter().next(), Some(10));
        assert_eq!(range.iter().last(), Some(19));
    }

    #[test]
    fn test_inverted_range_is_empty() {
        let range = NonceRange::new(5, 1);
        assert!(range.is_empty());
        assert_eq!(range.len(), 0);
    }

    #[test]
    fn test_adjacent_ranges_do_not_overlap() {
        let a = NonceRange::new(0, 10);
        let b = NonceRange::new(10, 20);
        let c = NonceRange::new(5, 15);
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(c.overlaps(&b));
    }
}
