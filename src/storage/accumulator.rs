//! In-memory accumulator that generates coarser-rank summaries from raw
//! samples.
//!
//! Promotion is count-based and synchronous with ingestion: when a rank has
//! folded in as many summaries as its configured fan-in, the window is
//! finalized, stored at the next rank, and cascades into that rank's own
//! accumulator. No call blocks and no background timer is involved, so the
//! producer stream always completes in bounded time.

use log::debug;

use crate::config::{FanInConfig, RetentionConfig};

use super::{AggregationError, Rank, Reading, RollupStore, Summary};

/// Maximum summaries a single `ingest` call can promote (one per rank above
/// raw)
pub const MAX_PROMOTIONS: usize = Rank::COUNT - 1;

/// Summaries promoted by a single `ingest` call, finest first
pub type Promotions = heapless::Vec<Summary, MAX_PROMOTIONS>;

/// Events fanned out to storage/UI/export subscribers after ingestion
#[derive(Debug, Clone, Copy)]
pub enum RollupEvent {
    /// A new raw sample was recorded
    Raw(Summary),
    /// A window was promoted to a coarser rank
    Promoted(Summary),
}

/// Running window for one rank: the combined sum so far plus how many finer
/// summaries have been folded in since the last promotion.
#[derive(Default)]
struct Window {
    sum: Option<Summary>,
    count: u32,
}

impl Window {
    fn reset(&mut self) {
        self.sum = None;
        self.count = 0;
    }
}

/// Cascading rollup engine. Owns the retained history.
///
/// Every raw sample lands in the [`Rank::Second`] tier of the store and is
/// folded into the second-rank window; each promotion repeats the pattern
/// one rank up until [`Rank::Month`], which is terminal.
pub struct Aggregator {
    store: RollupStore,
    fan_in: FanInConfig,
    // Windows for Second..Day; Month never promotes further.
    windows: [Window; MAX_PROMOTIONS],
}

impl Aggregator {
    /// Create a new aggregator with empty windows and an empty store
    pub fn new(fan_in: FanInConfig, retention: RetentionConfig) -> Self {
        Self {
            store: RollupStore::new(retention),
            fan_in,
            windows: Default::default(),
        }
    }

    /// Read-only view of the retained history
    pub fn store(&self) -> &RollupStore {
        &self.store
    }

    /// Accept one raw sample. Every call counts; there is no deduplication.
    ///
    /// Returns the summaries promoted by this call, finest rank first. On
    /// failure the offending window is discarded and reset, so the next
    /// sample is aggregated from a clean slate.
    pub fn ingest(&mut self, reading: Reading) -> Result<Promotions, AggregationError> {
        let mut promoted = Promotions::new();

        let mut summary = Summary::from(reading);
        self.store.append(summary);

        let mut rank = Rank::Second;
        while let Some(target) = rank.next() {
            let fan_in = self.fan_in.fan_in_into(target);
            let window = &mut self.windows[rank.index()];

            if fan_in == 0 {
                // Misconfigured tier: promoting would divide by zero. Drop
                // the partial window so the next sample starts clean.
                window.reset();
                return Err(AggregationError::InvalidAggregation {
                    rank: target,
                    count: 0,
                });
            }

            window.sum = Summary::combine(window.sum.take(), Some(summary));
            window.count += 1;

            if window.count < fan_in {
                break;
            }

            let (sum, count) = (window.sum.take(), window.count);
            window.reset();

            let full = sum.ok_or(AggregationError::InvalidAggregation {
                rank: target,
                count: 0,
            })?;
            let rolled = full.finalize(count)?;
            debug!("promoted {} window: {}", target.label(), rolled);

            self.store.append(rolled);
            // Capacity equals the number of promotable ranks, so this
            // cannot overflow.
            let _ = promoted.push(rolled);

            summary = rolled;
            rank = target;
        }

        Ok(promoted)
    }
}
