//! The producer side of the pipeline: polling the sensor head.
//!
//! The core never talks to hardware directly; it consumes readings through
//! the [`SampleSource`] seam. The firmware implements the trait over its
//! sensor drivers, the simulator and tests over scripted data.

use embassy_time::{Duration, Ticker};
use log::{debug, error, warn};

use crate::station::Station;
use crate::storage::Reading;

/// Produces one composite reading per poll.
///
/// The polling cadence defines the `Second` rank of the rollup hierarchy;
/// timestamps must be monotonically non-decreasing.
pub trait SampleSource {
    type Error: core::fmt::Debug;

    /// Read the sensor head and return a composite reading.
    fn next_reading(&mut self) -> impl Future<Output = Result<Reading, Self::Error>>;
}

/// Drive the station from a sample source at a fixed cadence.
///
/// A failed read is logged and the tick skipped; an aggregation error is
/// logged and the loop keeps running. Nothing a consumer does can stall
/// this task: watch evaluation only takes the registry mutex for the
/// duration of a synchronous scan.
pub async fn run_sampler<S: SampleSource>(
    source: &mut S,
    station: &mut Station<'_>,
    interval: Duration,
) -> ! {
    let mut ticker = Ticker::every(interval);
    loop {
        ticker.next().await;

        let reading = match source.next_reading().await {
            Ok(reading) => reading,
            Err(e) => {
                warn!("sample read failed, skipping tick: {e:?}");
                continue;
            }
        };
        debug!("{reading}");

        if let Err(e) = station.ingest(reading).await {
            error!("aggregation failed for sample at {}: {e}", reading.timestamp);
        }
    }
}
