//! Rendering fired-watch reports for transport.
//!
//! The core is agnostic to the wire encoding: an exporter renders the
//! composite reading into bytes and names its content type, a responder
//! carries those bytes to whatever transport holds the consumer. The
//! [`RenderedSink`] adapter pairs the two behind the `ReportSink` seam so a
//! watch can be wired straight to an HTTP response or message channel.

extern crate alloc;
use alloc::vec::Vec;

use core::fmt::Write;

use thiserror_no_std::Error;

use crate::storage::Reading;
use crate::trigger::{DeliveryError, ReportSink};

/// Errors raised while rendering a report payload
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportError {
    /// Serialization of the reading failed
    #[error("payload encoding failed")]
    Encode,
}

/// Converts a composite reading into a wire payload
pub trait ReportExport {
    /// MIME type of the rendered payload
    fn content_type(&self) -> &'static str;

    /// Render `reading` into `out`
    fn render(&self, reading: &Reading, out: &mut Vec<u8>) -> Result<(), ExportError>;
}

/// Delivers a rendered payload to whatever transport holds the consumer
pub trait Responder {
    fn send(&mut self, content_type: &'static str, payload: &[u8]) -> Result<(), DeliveryError>;
}

/// Compact binary rendering (postcard)
pub struct PostcardExport;

impl ReportExport for PostcardExport {
    fn content_type(&self) -> &'static str {
        "application/octet-stream"
    }

    fn render(&self, reading: &Reading, out: &mut Vec<u8>) -> Result<(), ExportError> {
        let bytes = postcard::to_allocvec(reading).map_err(|_| ExportError::Encode)?;
        out.extend_from_slice(&bytes);
        Ok(())
    }
}

/// One-line human-readable rendering:
/// `timestamp,temperature_c,light_pct,motion`
pub struct CsvExport;

impl ReportExport for CsvExport {
    fn content_type(&self) -> &'static str {
        "text/csv"
    }

    fn render(&self, reading: &Reading, out: &mut Vec<u8>) -> Result<(), ExportError> {
        let mut line = heapless::String::<96>::new();
        writeln!(
            line,
            "{},{:.3},{:.3},{}",
            reading.timestamp,
            reading.temperature_c(),
            reading.light_percent(),
            reading.motion
        )
        .map_err(|_| ExportError::Encode)?;
        out.extend_from_slice(line.as_bytes());
        Ok(())
    }
}

/// Sink that renders a fired watch's reading and sends it on.
///
/// Mirrors the long-poll shape: the responder was bound to a live consumer
/// when the watch was created, so render-then-send happens exactly once.
pub struct RenderedSink<E, R> {
    export: E,
    responder: R,
}

impl<E: ReportExport, R: Responder> RenderedSink<E, R> {
    pub const fn new(export: E, responder: R) -> Self {
        Self { export, responder }
    }
}

impl<E: ReportExport, R: Responder> ReportSink for RenderedSink<E, R> {
    fn deliver(&mut self, reading: &Reading) -> Result<(), DeliveryError> {
        let mut payload = Vec::new();
        self.export
            .render(reading, &mut payload)
            .map_err(DeliveryError::Render)?;
        self.responder.send(self.export.content_type(), &payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::{Arc, Mutex};

    #[derive(Clone)]
    struct CapturingResponder {
        sent: Arc<Mutex<Vec<(&'static str, Vec<u8>)>>>,
    }

    impl CapturingResponder {
        fn new() -> (Self, Arc<Mutex<Vec<(&'static str, Vec<u8>)>>>) {
            let sent = Arc::new(Mutex::new(Vec::new()));
            (Self { sent: sent.clone() }, sent)
        }
    }

    impl Responder for CapturingResponder {
        fn send(&mut self, content_type: &'static str, payload: &[u8]) -> Result<(), DeliveryError> {
            self.sent.lock().unwrap().push((content_type, payload.to_vec()));
            Ok(())
        }
    }

    #[test]
    fn test_csv_line() {
        let reading = Reading::from_units(120, 21.5, 42.25, true);
        let mut out = Vec::new();
        CsvExport.render(&reading, &mut out).unwrap();

        assert_eq!(core::str::from_utf8(&out).unwrap(), "120,21.500,42.250,true\n");
    }

    #[test]
    fn test_postcard_render_round_trips() {
        let reading = Reading::new(7, -1_250, 99_999, false);
        let mut out = Vec::new();
        PostcardExport.render(&reading, &mut out).unwrap();

        let decoded: Reading = postcard::from_bytes(&out).unwrap();
        assert_eq!(decoded, reading);
    }

    #[test]
    fn test_rendered_sink_sends_once_with_content_type() {
        let (responder, sent) = CapturingResponder::new();
        let mut sink = RenderedSink::new(CsvExport, responder);

        sink.deliver(&Reading::from_units(5, 20.0, 50.0, false))
            .unwrap();

        let sent = sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "text/csv");
        assert!(sent[0].1.starts_with(b"5,20.000,50.000,false"));
    }
}
