//! Per-deployment composition of the telemetry core.
//!
//! A [`Station`] owns the aggregation pipeline and borrows the shared
//! trigger registry plus a publisher for rollup events. One station is
//! constructed per deployment and passed to whichever tasks need it; there
//! are no process-wide singletons.
//!
//! Concurrency model: the sensor producer task drives [`Station::ingest`]
//! exclusively (`&mut self`), so aggregator and store state belong to that
//! one logical stream. Only the trigger registry is shared, behind a single
//! async mutex, because consumer request tasks register and cancel watches
//! concurrently with the producer evaluating them.

extern crate alloc;
use alloc::boxed::Box;
use alloc::vec::Vec;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex as AsyncMutex;
use embassy_sync::pubsub::{PubSubChannel, Publisher};

use crate::config::StationConfig;
use crate::storage::{Aggregator, AggregationError, Rank, Reading, RollupEvent, Summary};
use crate::trigger::{RegistryError, ReportSink, TriggerRegistry, WatchConditions, WatchHandle};

/// Channel capacity for rollup events; sized to absorb a full cascade burst
/// without dropping the raw sample that caused it
pub const EVENT_CHANNEL_CAPACITY: usize = 8;

/// Number of subscribers that can listen to rollup events
/// (persistence/export task, UI task)
pub const EVENT_SUBSCRIBERS: usize = 2;

/// Number of publishers (just the station)
pub const EVENT_PUBLISHERS: usize = 1;

/// Pub-sub channel carrying rollup events out of the station
pub type RollupChannel = PubSubChannel<
    CriticalSectionRawMutex,
    RollupEvent,
    EVENT_CHANNEL_CAPACITY,
    EVENT_SUBSCRIBERS,
    EVENT_PUBLISHERS,
>;

/// Publisher half handed to the station at construction
pub type RollupPublisher<'a> = Publisher<
    'a,
    CriticalSectionRawMutex,
    RollupEvent,
    EVENT_CHANNEL_CAPACITY,
    EVENT_SUBSCRIBERS,
    EVENT_PUBLISHERS,
>;

/// The one shared-resource boundary in the system: the trigger registry,
/// guarded by a single async mutex
pub type SharedRegistry = AsyncMutex<CriticalSectionRawMutex, TriggerRegistry>;

/// Composition root wiring the aggregator, the shared registry and the
/// event fan-out together.
pub struct Station<'a> {
    aggregator: Aggregator,
    registry: &'a SharedRegistry,
    events: RollupPublisher<'a>,
}

impl<'a> Station<'a> {
    pub fn new(
        config: &StationConfig,
        registry: &'a SharedRegistry,
        events: RollupPublisher<'a>,
    ) -> Self {
        Self {
            aggregator: Aggregator::new(config.fan_in, config.retention),
            registry,
            events,
        }
    }

    /// Feed one raw sample through the pipeline.
    ///
    /// The sample is aggregated, evaluated against every outstanding watch,
    /// and fanned out to event subscribers. Watches are evaluated even when
    /// aggregation fails, and an aggregation error never prevents the next
    /// sample from being ingested.
    ///
    /// Events are published lossily (`publish_immediate`): a lagging
    /// subscriber loses old events rather than stalling the producer.
    pub async fn ingest(&mut self, reading: Reading) -> Result<(), AggregationError> {
        let aggregated = self.aggregator.ingest(reading);

        {
            let mut registry = self.registry.lock().await;
            registry.evaluate(&reading);
            registry.sweep(reading.timestamp);
        }

        self.events
            .publish_immediate(RollupEvent::Raw(Summary::from(reading)));

        let promoted = aggregated?;
        for summary in &promoted {
            self.events
                .publish_immediate(RollupEvent::Promoted(*summary));
        }
        Ok(())
    }

    /// Register a watch that fires on the next qualifying sample or after
    /// `timeout_secs`, whichever comes first.
    ///
    /// The deadline is anchored at the most recent sample timestamp (the
    /// producer cadence is the system clock); before the first sample it is
    /// anchored at zero.
    pub async fn watch(
        &self,
        conditions: WatchConditions,
        timeout_secs: u32,
        sink: Box<dyn ReportSink + Send>,
    ) -> WatchHandle {
        let mut registry = self.registry.lock().await;
        let deadline = registry.clock().unwrap_or(0).saturating_add(timeout_secs);
        registry.watch(conditions, deadline, sink)
    }

    /// Remove an outstanding watch without firing it
    pub async fn cancel(&self, handle: WatchHandle) -> Result<(), RegistryError> {
        self.registry.lock().await.cancel(handle)
    }

    /// Retained summaries at `rank` with timestamps in `[from, to]`
    pub fn query(&self, rank: Rank, from: u32, to: u32) -> Vec<Summary> {
        self.aggregator.store().query(rank, from, to)
    }

    /// Most recent summary at `rank`, if any
    pub fn latest(&self, rank: Rank) -> Option<Summary> {
        self.aggregator.store().latest(rank).copied()
    }
}
