//! Hierarchical time-series rollup storage.
//!
//! Raw per-second samples are compressed into progressively coarser
//! summaries (minute, hour, day, month). The [`accumulator::Aggregator`]
//! drives the cascade and owns the retained history in a
//! [`rollup_store::RollupStore`].

pub mod accumulator;
pub mod rollup_store;
pub mod summary;

pub use accumulator::{Aggregator, MAX_PROMOTIONS, Promotions, RollupEvent};
pub use rollup_store::RollupStore;
pub use summary::{AggregationError, Rank, Reading, Summary};
