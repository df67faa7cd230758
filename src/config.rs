//! Deployment configuration for the telemetry core.
//!
//! Plain serde-derived structs so the firmware can load them from whatever
//! format it persists (postcard records on flash, TOML over the wire, ...).

use serde::{Deserialize, Serialize};

use crate::storage::Rank;

/// Top-level station configuration
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct StationConfig {
    pub fan_in: FanInConfig,
    pub retention: RetentionConfig,
    /// Sampling cadence of the sensor head in seconds; defines the
    /// [`Rank::Second`] tier
    pub sample_interval_secs: u32,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            fan_in: FanInConfig::default(),
            retention: RetentionConfig::default(),
            sample_interval_secs: 1,
        }
    }
}

/// Samples-per-promotion at each rank.
///
/// Each field is the number of next-finer summaries folded together to
/// produce one summary of that rank.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct FanInConfig {
    /// Seconds per minute summary
    pub minute: u32,
    /// Minutes per hour summary
    pub hour: u32,
    /// Hours per day summary
    pub day: u32,
    /// Days per month summary
    pub month: u32,
}

impl Default for FanInConfig {
    fn default() -> Self {
        Self {
            minute: 60,
            hour: 60,
            day: 24,
            month: 30,
        }
    }
}

impl FanInConfig {
    /// How many next-finer summaries make up one summary of `rank`.
    ///
    /// The raw tier is fed directly by the sensor head, so its fan-in is 1.
    pub const fn fan_in_into(&self, rank: Rank) -> u32 {
        match rank {
            Rank::Second => 1,
            Rank::Minute => self.minute,
            Rank::Hour => self.hour,
            Rank::Day => self.day,
            Rank::Month => self.month,
        }
    }
}

/// Ring-buffer depth per rank for retained history
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionConfig {
    pub second: usize,
    pub minute: usize,
    pub hour: usize,
    pub day: usize,
    pub month: usize,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            second: 1000,
            minute: 1000,
            hour: 1000,
            day: 1000,
            month: 1000,
        }
    }
}

impl RetentionConfig {
    /// Maximum number of retained summaries at `rank`
    pub const fn limit(&self, rank: Rank) -> usize {
        match rank {
            Rank::Second => self.second,
            Rank::Minute => self.minute,
            Rank::Hour => self.hour,
            Rank::Day => self.day,
            Rank::Month => self.month,
        }
    }
}
