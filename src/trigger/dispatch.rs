//! Delivery of fired watches to their consumers.
//!
//! Delivery is fire-and-forget: the consumer handle was bound when the watch
//! was registered (a long-poll response that is already associated with a
//! live connection), so a failed handoff cannot be retried. It is logged and
//! the watch is still considered consumed.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::error;
use thiserror_no_std::Error;

use crate::export::ExportError;
use crate::storage::Reading;

use super::PendingWatch;

/// Errors raised while handing a report to a consumer
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryError {
    /// The consumer handle is gone or cannot accept the report
    #[error("consumer handle closed: {0}")]
    Closed(&'static str),
    /// The payload could not be rendered for this consumer
    #[error("payload rendering failed: {0}")]
    Render(ExportError),
}

/// Consumer handle for a fired watch.
///
/// Implementations wrap whatever is waiting on the other side: a suspended
/// long-poll task, a rendered transport response, a test recorder.
pub trait ReportSink {
    /// Hand the current composite reading to the consumer.
    fn deliver(&mut self, reading: &Reading) -> Result<(), DeliveryError>;
}

/// Fire a watch exactly once and discard it.
///
/// A delivery failure is reported to the log, never retried; the watch is
/// consumed either way.
pub(crate) fn dispatch(mut watch: PendingWatch, reading: &Reading) {
    if let Err(e) = watch.sink_mut().deliver(reading) {
        error!("watch delivery failed, dropping report: {e}");
    }
}

/// One-shot rendezvous cell for a suspended long-poll consumer
pub type ReportCell = Channel<CriticalSectionRawMutex, Reading, 1>;

/// Sink that resolves a suspended long-poll task.
///
/// The consumer registers a watch carrying this sink and then awaits
/// [`ReportCell::receive`]; delivery completes the rendezvous. The cell has
/// capacity one and each watch fires at most once, so `try_send` can only
/// fail if the cell is reused while still holding an unread report.
pub struct LongPollSink {
    cell: &'static ReportCell,
}

impl LongPollSink {
    pub const fn new(cell: &'static ReportCell) -> Self {
        Self { cell }
    }
}

impl ReportSink for LongPollSink {
    fn deliver(&mut self, reading: &Reading) -> Result<(), DeliveryError> {
        self.cell
            .try_send(*reading)
            .map_err(|_| DeliveryError::Closed("long-poll cell still holds an unread report"))
    }
}
