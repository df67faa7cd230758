//! Threshold/timeout watch requests and their registry.
//!
//! A consumer that wants the "next interesting sample" registers a
//! [`PendingWatch`]: any combination of a temperature band, a light band and
//! a motion edge, plus a hard deadline. The watch fires once, on the first
//! sample that satisfies any condition or as soon as the deadline passes,
//! and is then gone.

pub mod dispatch;
pub mod registry;

extern crate alloc;
use alloc::boxed::Box;

use thiserror_no_std::Error;

use crate::storage::Reading;

pub use dispatch::{DeliveryError, LongPollSink, ReportCell, ReportSink};
pub use registry::{TriggerRegistry, WatchHandle};

/// Registry-facing errors, returned to the immediate caller only
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryError {
    /// The handle does not name an outstanding watch (already fired,
    /// cancelled, or never registered)
    #[error("no outstanding watch for handle {0:?}")]
    WatchNotFound(WatchHandle),
}

/// Absolute band around a base value captured at watch-creation time.
///
/// The condition holds once the observed value moves at least `delta_milli`
/// away from `base_milli` in either direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Threshold {
    /// Base value in milli-units, usually the reading current at creation
    pub base_milli: i32,
    /// Minimum distance from the base, in milli-units
    pub delta_milli: i32,
}

impl Threshold {
    pub const fn new(base_milli: i32, delta_milli: i32) -> Self {
        Self {
            base_milli,
            delta_milli,
        }
    }

    /// Build a threshold from engineering units (°C or %)
    pub fn from_units(base: f32, delta: f32) -> Self {
        Self::new((base * 1000.0) as i32, (delta * 1000.0) as i32)
    }

    fn exceeded_by(&self, value_milli: i32) -> bool {
        value_milli.saturating_sub(self.base_milli).saturating_abs() >= self.delta_milli
    }
}

/// Optional sub-conditions of a watch. Any satisfied condition fires the
/// watch (logical OR); with none supplied the watch degenerates to a pure
/// timeout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatchConditions {
    /// Fire when temperature leaves the band
    pub temperature: Option<Threshold>,
    /// Fire when light leaves the band
    pub light: Option<Threshold>,
    /// Fire when motion differs from this base state (a state transition
    /// relative to watch-creation time)
    pub motion: Option<bool>,
}

impl WatchConditions {
    /// A watch with no sub-conditions: fires on deadline only
    pub const fn none() -> Self {
        Self {
            temperature: None,
            light: None,
            motion: None,
        }
    }
}

/// One outstanding conditional request, owned by the registry until it
/// fires, expires, or is cancelled.
pub struct PendingWatch {
    conditions: WatchConditions,
    /// Absolute deadline, seconds since epoch
    deadline: u32,
    sink: Box<dyn ReportSink + Send>,
}

impl PendingWatch {
    pub fn new(conditions: WatchConditions, deadline: u32, sink: Box<dyn ReportSink + Send>) -> Self {
        Self {
            conditions,
            deadline,
            sink,
        }
    }

    /// Whether this watch should fire for `reading` at time `now`.
    ///
    /// Sub-conditions are evaluated independently and ORed; the deadline is
    /// always checked regardless of conditions.
    pub fn is_triggered(&self, reading: &Reading, now: u32) -> bool {
        if let Some(base) = self.conditions.motion
            && (base ^ reading.motion)
        {
            return true;
        }

        if let Some(band) = self.conditions.temperature
            && band.exceeded_by(reading.temperature_milli_c)
        {
            return true;
        }

        if let Some(band) = self.conditions.light
            && band.exceeded_by(reading.light_milli_pct)
        {
            return true;
        }

        now >= self.deadline
    }

    /// Whether the deadline has passed, independent of any condition
    pub fn expired(&self, now: u32) -> bool {
        now >= self.deadline
    }

    pub(crate) fn sink_mut(&mut self) -> &mut (dyn ReportSink + Send) {
        self.sink.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullSink;
    impl ReportSink for NullSink {
        fn deliver(&mut self, _reading: &Reading) -> Result<(), DeliveryError> {
            Ok(())
        }
    }

    fn watch(conditions: WatchConditions, deadline: u32) -> PendingWatch {
        PendingWatch::new(conditions, deadline, Box::new(NullSink))
    }

    fn reading(temp_milli: i32, light_milli: i32, motion: bool) -> Reading {
        Reading::new(100, temp_milli, light_milli, motion)
    }

    #[test]
    fn test_temperature_band_is_inclusive_at_delta() {
        let w = watch(
            WatchConditions {
                temperature: Some(Threshold::from_units(20.0, 2.0)),
                ..WatchConditions::none()
            },
            u32::MAX,
        );

        assert!(!w.is_triggered(&reading(19_000, 0, false), 100));
        assert!(!w.is_triggered(&reading(21_999, 0, false), 100));
        assert!(w.is_triggered(&reading(22_000, 0, false), 100));
        assert!(w.is_triggered(&reading(18_000, 0, false), 100));
        assert!(w.is_triggered(&reading(17_500, 0, false), 100));
    }

    #[test]
    fn test_motion_edge_fires_on_transition_only() {
        let w = watch(
            WatchConditions {
                motion: Some(false),
                ..WatchConditions::none()
            },
            u32::MAX,
        );

        assert!(!w.is_triggered(&reading(20_000, 0, false), 100));
        assert!(w.is_triggered(&reading(20_000, 0, true), 100));

        // Base true: the edge is the release, not the assertion
        let w = watch(
            WatchConditions {
                motion: Some(true),
                ..WatchConditions::none()
            },
            u32::MAX,
        );
        assert!(!w.is_triggered(&reading(20_000, 0, true), 100));
        assert!(w.is_triggered(&reading(20_000, 0, false), 100));
    }

    #[test]
    fn test_conditions_are_ored() {
        let w = watch(
            WatchConditions {
                temperature: Some(Threshold::from_units(20.0, 5.0)),
                light: Some(Threshold::from_units(50.0, 10.0)),
                motion: Some(false),
            },
            u32::MAX,
        );

        // Inside both bands, no motion: quiet
        assert!(!w.is_triggered(&reading(21_000, 52_000, false), 100));
        // Only the light band exceeded
        assert!(w.is_triggered(&reading(21_000, 65_000, false), 100));
        // Only motion
        assert!(w.is_triggered(&reading(21_000, 52_000, true), 100));
    }

    #[test]
    fn test_deadline_checked_independently_of_conditions() {
        let w = watch(
            WatchConditions {
                temperature: Some(Threshold::from_units(20.0, 100.0)),
                ..WatchConditions::none()
            },
            100,
        );

        assert!(!w.is_triggered(&reading(20_000, 0, false), 99));
        assert!(w.is_triggered(&reading(20_000, 0, false), 100));
        assert!(w.expired(100));
        assert!(!w.expired(99));
    }

    #[test]
    fn test_no_conditions_degenerates_to_timeout() {
        let w = watch(WatchConditions::none(), 50);

        assert!(!w.is_triggered(&reading(90_000, 99_000, true), 49));
        assert!(w.is_triggered(&reading(0, 0, false), 50));
    }
}
