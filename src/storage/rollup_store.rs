//! Retained rollup history, one bounded ring buffer per rank.

extern crate alloc;
use alloc::collections::VecDeque;
use alloc::vec::Vec;

use crate::config::RetentionConfig;

use super::{Rank, Summary};

/// Per-rank retained history.
///
/// Each rank holds its summaries in timestamp order; insertion order equals
/// timestamp order because every rank is fed strictly in time order by the
/// aggregator. Once a rank reaches its retention bound the oldest entry is
/// dropped (ring-buffer behavior).
///
/// Exclusively owned by the `Aggregator`; readers get copies or shared
/// borrows, never mutation.
pub struct RollupStore {
    tiers: [VecDeque<Summary>; Rank::COUNT],
    retention: RetentionConfig,
}

impl RollupStore {
    /// Create an empty store with the given retention bounds
    pub fn new(retention: RetentionConfig) -> Self {
        Self {
            tiers: core::array::from_fn(|i| {
                VecDeque::with_capacity(retention.limit(Rank::ALL[i]))
            }),
            retention,
        }
    }

    /// Append a summary at its own rank, evicting the oldest entry once the
    /// retention bound for that rank is exceeded.
    pub fn append(&mut self, summary: Summary) {
        let tier = &mut self.tiers[summary.rank.index()];
        if tier.len() >= self.retention.limit(summary.rank) {
            tier.pop_front();
        }
        tier.push_back(summary);
    }

    /// Ordered subsequence of summaries at `rank` with timestamps in the
    /// inclusive range `[from, to]`. Empty when nothing matches.
    pub fn query(&self, rank: Rank, from: u32, to: u32) -> Vec<Summary> {
        self.tiers[rank.index()]
            .iter()
            .filter(|s| s.timestamp >= from && s.timestamp <= to)
            .copied()
            .collect()
    }

    /// The most recent summary at `rank`, if any
    pub fn latest(&self, rank: Rank) -> Option<&Summary> {
        self.tiers[rank.index()].back()
    }

    /// Number of retained summaries at `rank`
    pub fn len(&self, rank: Rank) -> usize {
        self.tiers[rank.index()].len()
    }

    /// Whether `rank` holds no summaries
    pub fn is_empty(&self, rank: Rank) -> bool {
        self.tiers[rank.index()].is_empty()
    }
}
