//! Registry of outstanding watches.
//!
//! The registry itself is a plain synchronous structure; deployments share
//! it behind an async mutex (see `station::SharedRegistry`) so consumer
//! tasks registering or cancelling watches serialize against the producer
//! stream running `evaluate`/`sweep`. Registration, evaluation and sweeping
//! never interleave partially on the same watch.

extern crate alloc;
use alloc::boxed::Box;
use alloc::vec::Vec;

use log::debug;

use crate::storage::Reading;

use super::dispatch::{ReportSink, dispatch};
use super::{PendingWatch, RegistryError, WatchConditions};

/// Opaque identifier for an outstanding watch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchHandle(u32);

impl WatchHandle {
    pub const fn id(self) -> u32 {
        self.0
    }
}

/// Holds every outstanding watch and fires them at most once each.
pub struct TriggerRegistry {
    watches: Vec<(WatchHandle, PendingWatch)>,
    next_id: u32,
    /// Most recent evaluated sample, delivered by deadline-only sweeps
    last_reading: Option<Reading>,
}

impl Default for TriggerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TriggerRegistry {
    pub const fn new() -> Self {
        Self {
            watches: Vec::new(),
            next_id: 0,
            last_reading: None,
        }
    }

    /// Register a watch and return its handle.
    ///
    /// `deadline` is absolute (seconds since epoch); the watch fires no
    /// later than the first evaluation or sweep at-or-after it.
    pub fn watch(
        &mut self,
        conditions: WatchConditions,
        deadline: u32,
        sink: Box<dyn ReportSink + Send>,
    ) -> WatchHandle {
        let handle = WatchHandle(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.watches
            .push((handle, PendingWatch::new(conditions, deadline, sink)));
        debug!(
            "registered watch {:?} (deadline {deadline}), {} outstanding",
            handle,
            self.watches.len()
        );
        handle
    }

    /// Evaluate one raw sample against every outstanding watch.
    ///
    /// Every satisfied watch is fired with this sample and removed; the
    /// sample's own timestamp serves as the clock for deadline checks.
    /// Returns the number of watches fired.
    pub fn evaluate(&mut self, reading: &Reading) -> usize {
        self.last_reading = Some(*reading);
        let now = reading.timestamp;

        let mut fired = 0;
        let mut i = 0;
        while i < self.watches.len() {
            if self.watches[i].1.is_triggered(reading, now) {
                let (handle, watch) = self.watches.remove(i);
                debug!("watch {:?} fired on sample at {now}", handle);
                dispatch(watch, reading);
                fired += 1;
            } else {
                i += 1;
            }
        }
        fired
    }

    /// Fire every watch whose deadline has passed, regardless of condition.
    ///
    /// The best-available reading is delivered: the last evaluated sample,
    /// or an empty reading stamped `now` when nothing has been sampled yet.
    /// Returns the number of watches fired.
    pub fn sweep(&mut self, now: u32) -> usize {
        let current = self
            .last_reading
            .unwrap_or(Reading::new(now, 0, 0, false));

        let mut fired = 0;
        let mut i = 0;
        while i < self.watches.len() {
            if self.watches[i].1.expired(now) {
                let (handle, watch) = self.watches.remove(i);
                debug!("watch {:?} expired at {now}", handle);
                dispatch(watch, &current);
                fired += 1;
            } else {
                i += 1;
            }
        }
        fired
    }

    /// Remove a watch without dispatching it.
    ///
    /// Unknown or already-fired handles are reported, not ignored silently;
    /// the error never affects other outstanding watches.
    pub fn cancel(&mut self, handle: WatchHandle) -> Result<(), RegistryError> {
        match self.watches.iter().position(|(h, _)| *h == handle) {
            Some(i) => {
                self.watches.remove(i);
                debug!("cancelled watch {:?}", handle);
                Ok(())
            }
            None => Err(RegistryError::WatchNotFound(handle)),
        }
    }

    /// Timestamp of the most recent evaluated sample, if any.
    ///
    /// Serves as the registry's notion of "now" for callers that want to
    /// anchor a relative timeout without consulting a wall clock.
    pub fn clock(&self) -> Option<u32> {
        self.last_reading.map(|r| r.timestamp)
    }

    /// Number of outstanding watches
    pub fn len(&self) -> usize {
        self.watches.len()
    }

    /// Whether no watches are outstanding
    pub fn is_empty(&self) -> bool {
        self.watches.is_empty()
    }
}
