//! Core value types for the rollup hierarchy.
//!
//! A [`Reading`] is one raw composite sample from the sensor head. A
//! [`Summary`] is a rank-tagged aggregate built from readings (or from finer
//! summaries) via two pure operations: [`Summary::combine`] accumulates a
//! window, [`Summary::finalize`] divides it down to a mean and promotes it
//! one rank up.
//!
//! All sensor values are stored in fixed-point milli-units:
//! - Temperature: 21.5°C → 21500 (milli-degrees)
//! - Light: 42.7% → 42700 (milli-percent)

use core::fmt::Display;

use serde::{Deserialize, Serialize};
use thiserror_no_std::Error;

/// Aggregation granularity level, ordered fine to coarse.
///
/// Each rank above [`Rank::Second`] is produced by folding a configured
/// number of summaries of the previous rank (see `FanInConfig`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Rank {
    Second = 0,
    Minute = 1,
    Hour = 2,
    Day = 3,
    Month = 4,
}

impl Rank {
    /// Number of ranks in the hierarchy
    pub const COUNT: usize = 5;

    /// All ranks, fine to coarse
    pub const ALL: [Rank; Rank::COUNT] = [
        Rank::Second,
        Rank::Minute,
        Rank::Hour,
        Rank::Day,
        Rank::Month,
    ];

    /// The next-coarser rank, or `None` at the top of the hierarchy
    pub const fn next(self) -> Option<Rank> {
        match self {
            Rank::Second => Some(Rank::Minute),
            Rank::Minute => Some(Rank::Hour),
            Rank::Hour => Some(Rank::Day),
            Rank::Day => Some(Rank::Month),
            Rank::Month => None,
        }
    }

    /// Get a short label for display
    pub const fn label(self) -> &'static str {
        match self {
            Rank::Second => "1s",
            Rank::Minute => "1m",
            Rank::Hour => "1h",
            Rank::Day => "1d",
            Rank::Month => "1mo",
        }
    }

    /// Index into per-rank tables
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Errors raised while folding or promoting summaries
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregationError {
    /// A window was divided by a non-positive sample count. The owning
    /// accumulator is discarded and reset when this is returned.
    #[error("invalid aggregation: divided a {} window by {count}", rank.label())]
    InvalidAggregation { rank: Rank, count: u32 },
    /// Attempted to promote past the top of the hierarchy
    #[error("no rank above {} to promote into", .0.label())]
    RankExhausted(Rank),
}

/// One raw composite sample from the sensor head.
///
/// Timestamps are epoch seconds supplied by the sample source; the core never
/// consults a wall clock of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reading {
    /// Seconds since epoch
    pub timestamp: u32,
    /// Temperature in milli-degrees Celsius
    pub temperature_milli_c: i32,
    /// Light level in milli-percent of full scale
    pub light_milli_pct: i32,
    /// Whether the motion detector is currently asserted
    pub motion: bool,
}

impl Reading {
    /// Create a new reading from fixed-point values
    pub const fn new(
        timestamp: u32,
        temperature_milli_c: i32,
        light_milli_pct: i32,
        motion: bool,
    ) -> Self {
        Self {
            timestamp,
            temperature_milli_c,
            light_milli_pct,
            motion,
        }
    }

    /// Create a reading from engineering units (°C, % of full scale)
    pub fn from_units(timestamp: u32, temperature_c: f32, light_percent: f32, motion: bool) -> Self {
        Self::new(
            timestamp,
            (temperature_c * 1000.0) as i32,
            (light_percent * 1000.0) as i32,
            motion,
        )
    }

    /// Temperature in °C
    pub fn temperature_c(&self) -> f32 {
        self.temperature_milli_c as f32 / 1000.0
    }

    /// Light level in percent of full scale
    pub fn light_percent(&self) -> f32 {
        self.light_milli_pct as f32 / 1000.0
    }
}

impl Display for Reading {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "[Reading] timestamp: {}, temperature: {:.2}°C, light: {:.2}%, motion: {}",
            self.timestamp,
            self.temperature_c(),
            self.light_percent(),
            self.motion
        )
    }
}

/// One aggregated (or raw) record at a given rank.
///
/// While a window is being accumulated the temperature and light fields hold
/// running sums; [`Summary::finalize`] turns them into means. A summary built
/// directly from a [`Reading`] is at [`Rank::Second`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// End of the covered interval, seconds since epoch
    pub timestamp: u32,
    /// Temperature in milli-degrees Celsius (sum while accumulating)
    pub temperature_milli_c: i32,
    /// Light level in milli-percent (sum while accumulating)
    pub light_milli_pct: i32,
    /// Motion observed anywhere in the interval
    pub motion: bool,
    /// Aggregation level of this record
    pub rank: Rank,
}

impl Summary {
    /// Commutative merge with `None` identity.
    ///
    /// An absent operand returns the other unchanged, so the very first
    /// sample of a window initializes the accumulator rather than merging.
    /// Otherwise: timestamp takes the max, values add, motion ORs, rank takes
    /// the max.
    pub fn combine(a: Option<Summary>, b: Option<Summary>) -> Option<Summary> {
        match (a, b) {
            (None, b) => b,
            (a, None) => a,
            (Some(a), Some(b)) => Some(Summary {
                timestamp: a.timestamp.max(b.timestamp),
                temperature_milli_c: a.temperature_milli_c.saturating_add(b.temperature_milli_c),
                light_milli_pct: a.light_milli_pct.saturating_add(b.light_milli_pct),
                motion: a.motion | b.motion,
                rank: a.rank.max(b.rank),
            }),
        }
    }

    /// Divide an accumulated window down to its mean and promote it one rank.
    ///
    /// Motion and timestamp are carried over unchanged. Fails with
    /// [`AggregationError::InvalidAggregation`] for a zero divisor and
    /// [`AggregationError::RankExhausted`] at the top of the hierarchy.
    pub fn finalize(self, count: u32) -> Result<Summary, AggregationError> {
        if count == 0 {
            return Err(AggregationError::InvalidAggregation {
                rank: self.rank,
                count,
            });
        }
        let promoted = self
            .rank
            .next()
            .ok_or(AggregationError::RankExhausted(self.rank))?;

        Ok(Summary {
            timestamp: self.timestamp,
            temperature_milli_c: self.temperature_milli_c / count as i32,
            light_milli_pct: self.light_milli_pct / count as i32,
            motion: self.motion,
            rank: promoted,
        })
    }

    /// Temperature in °C
    pub fn temperature_c(&self) -> f32 {
        self.temperature_milli_c as f32 / 1000.0
    }

    /// Light level in percent of full scale
    pub fn light_percent(&self) -> f32 {
        self.light_milli_pct as f32 / 1000.0
    }
}

impl From<Reading> for Summary {
    fn from(reading: Reading) -> Self {
        Self {
            timestamp: reading.timestamp,
            temperature_milli_c: reading.temperature_milli_c,
            light_milli_pct: reading.light_milli_pct,
            motion: reading.motion,
            rank: Rank::Second,
        }
    }
}

impl Display for Summary {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "[Summary/{}] timestamp: {}, temperature: {:.2}°C, light: {:.2}%, motion: {}",
            self.rank.label(),
            self.timestamp,
            self.temperature_c(),
            self.light_percent(),
            self.motion
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(timestamp: u32, temp_milli: i32, light_milli: i32, motion: bool) -> Summary {
        Summary::from(Reading::new(timestamp, temp_milli, light_milli, motion))
    }

    #[test]
    fn test_combine_none_identity() {
        let x = summary(100, 21500, 40000, true);

        assert_eq!(Summary::combine(None, Some(x)), Some(x));
        assert_eq!(Summary::combine(Some(x), None), Some(x));
        assert_eq!(Summary::combine(None, None), None);
    }

    #[test]
    fn test_combine_merges_fields() {
        let a = summary(100, 20000, 30000, false);
        let b = summary(160, 22000, 50000, true);

        let merged = Summary::combine(Some(a), Some(b)).unwrap();
        assert_eq!(merged.timestamp, 160);
        assert_eq!(merged.temperature_milli_c, 42000);
        assert_eq!(merged.light_milli_pct, 80000);
        assert!(merged.motion);
        assert_eq!(merged.rank, Rank::Second);
    }

    #[test]
    fn test_combine_is_commutative() {
        let a = summary(100, 20000, 30000, false);
        let b = summary(160, 22000, 50000, true);

        assert_eq!(
            Summary::combine(Some(a), Some(b)),
            Summary::combine(Some(b), Some(a))
        );
    }

    #[test]
    fn test_combine_takes_max_rank() {
        let fine = summary(100, 20000, 30000, false);
        let mut coarse = summary(90, 21000, 31000, false);
        coarse.rank = Rank::Minute;

        let merged = Summary::combine(Some(fine), Some(coarse)).unwrap();
        assert_eq!(merged.rank, Rank::Minute);
    }

    #[test]
    fn test_finalize_means_and_promotes() {
        let window = Summary::combine(
            Some(summary(100, 20000, 30000, false)),
            Some(summary(101, 22000, 50000, true)),
        )
        .unwrap();

        let rolled = window.finalize(2).unwrap();
        assert_eq!(rolled.rank, Rank::Minute);
        assert_eq!(rolled.timestamp, 101);
        assert_eq!(rolled.temperature_milli_c, 21000);
        assert_eq!(rolled.light_milli_pct, 40000);
        assert!(rolled.motion);
    }

    #[test]
    fn test_finalize_zero_divisor_fails() {
        let window = summary(100, 20000, 30000, false);

        assert_eq!(
            window.finalize(0),
            Err(AggregationError::InvalidAggregation {
                rank: Rank::Second,
                count: 0
            })
        );
    }

    #[test]
    fn test_finalize_at_top_rank_fails() {
        let mut window = summary(100, 20000, 30000, false);
        window.rank = Rank::Month;

        assert_eq!(
            window.finalize(3),
            Err(AggregationError::RankExhausted(Rank::Month))
        );
    }

    #[test]
    fn test_reading_unit_conversion() {
        let reading = Reading::from_units(10, 21.5, 42.7, false);
        assert_eq!(reading.temperature_milli_c, 21500);
        assert_eq!(reading.light_milli_pct, 42700);
        assert!((reading.temperature_c() - 21.5).abs() < 1e-3);
        assert!((reading.light_percent() - 42.7).abs() < 1e-3);
    }

    #[test]
    fn test_rank_ordering() {
        assert!(Rank::Second < Rank::Minute);
        assert!(Rank::Day < Rank::Month);
        assert_eq!(Rank::Month.next(), None);
        assert_eq!(Rank::Hour.next(), Some(Rank::Day));
    }
}
