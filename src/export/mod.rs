//! Handing buffered telemetry to an exporter.
//!
//! The crate does no I/O. An [`Exporter`] receives a snapshot and decides how
//! to ship it; [`flush`] discards exported entries only once the exporter
//! reports success. [`OtlpExporter`] adapts any [`Transport`] that can POST a
//! body to a collector path.

pub mod otlp;

use thiserror::Error;

use crate::clock::Clock;
use crate::telemetry::{Telemetry, TelemetrySnapshot};

pub use otlp::{OtlpBatch, ResourceInfo};

/// Errors surfaced by exporting. Recording itself never errors.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("Transport failed for {path}: {message}")]
    Transport { path: &'static str, message: String },
    #[error("Exporter failed: {0}")]
    Exporter(String),
}

/// Something that ships a batch of telemetry somewhere.
pub trait Exporter {
    type Error: std::fmt::Display;

    fn export(&mut self, batch: &TelemetrySnapshot) -> Result<(), Self::Error>;
}

/// Byte-level delivery to a collector, e.g. an HTTP client.
pub trait Transport {
    type Error: std::fmt::Display;

    fn post(&mut self, path: &'static str, body: &[u8]) -> Result<(), Self::Error>;
}

/// Exporter that encodes snapshots as OTLP/HTTP JSON and hands each signal to
/// a [`Transport`].
#[derive(Debug)]
pub struct OtlpExporter<T> {
    resource: ResourceInfo,
    transport: T,
}

impl<T: Transport> OtlpExporter<T> {
    pub fn new(resource: ResourceInfo, transport: T) -> Self {
        Self { resource, transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }
}

impl<T: Transport> Exporter for OtlpExporter<T> {
    type Error = ExportError;

    fn export(&mut self, batch: &TelemetrySnapshot) -> Result<(), ExportError> {
        let encoded = otlp::encode(&self.resource, batch)?;
        for (path, body) in encoded.requests() {
            self.transport
                .post(path, body)
                .map_err(|e| ExportError::Transport {
                    path,
                    message: e.to_string(),
                })?;
        }
        Ok(())
    }
}

/// Counts of entries handed to the exporter by one [`flush`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub logs: usize,
    pub metrics: usize,
    pub spans: usize,
}

impl FlushReport {
    pub fn is_empty(&self) -> bool {
        self.logs == 0 && self.metrics == 0 && self.spans == 0
    }
}

/// Export everything buffered and discard it on success.
///
/// On failure nothing is discarded, so the next flush retries the same
/// entries (minus whatever the rings evicted in the meantime). Entries
/// recorded while the exporter runs are kept either way. An empty buffer
/// skips the exporter entirely.
///
/// Delivery is at-least-once per signal. [`OtlpExporter`] posts logs,
/// metrics, and traces separately; if a later post fails, the signals already
/// delivered are posted again on the next flush.
pub fn flush<K, E>(telemetry: &Telemetry<K>, exporter: &mut E) -> Result<FlushReport, ExportError>
where
    K: Clock,
    E: Exporter,
{
    let snapshot = telemetry.snapshot();
    let report = FlushReport {
        logs: snapshot.logs.len(),
        metrics: snapshot.metrics.len(),
        spans: snapshot.spans.len(),
    };
    if report.is_empty() {
        return Ok(report);
    }

    if let Err(e) = exporter.export(&snapshot) {
        tracing::warn!(
            logs = report.logs,
            metrics = report.metrics,
            spans = report.spans,
            error = %e,
            "export failed, keeping buffered telemetry"
        );
        return Err(ExportError::Exporter(e.to_string()));
    }

    telemetry.acknowledge(&snapshot);
    tracing::debug!(
        logs = report.logs,
        metrics = report.metrics,
        spans = report.spans,
        "telemetry exported"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Collecting {
        posts: Vec<(&'static str, Vec<u8>)>,
        fail_on: Option<&'static str>,
    }

    impl Transport for Collecting {
        type Error = String;

        fn post(&mut self, path: &'static str, body: &[u8]) -> Result<(), String> {
            if self.fail_on == Some(path) {
                return Err("connection refused".to_string());
            }
            self.posts.push((path, body.to_vec()));
            Ok(())
        }
    }

    #[test]
    fn test_otlp_exporter_posts_each_signal() {
        let t = Telemetry::new();
        t.log_info("up");
        t.record_gauge("rssi", -61);
        let idx = t.start_span("wake");
        t.end_span(idx, true);

        let mut exporter = OtlpExporter::new(ResourceInfo::default(), Collecting::default());
        let report = flush(&t, &mut exporter).unwrap();
        assert_eq!(report, FlushReport { logs: 1, metrics: 1, spans: 1 });

        let paths: Vec<&str> = exporter.transport().posts.iter().map(|(p, _)| *p).collect();
        assert_eq!(paths, vec![otlp::LOGS_PATH, otlp::METRICS_PATH, otlp::TRACES_PATH]);
        assert!(t.snapshot().is_empty());
    }

    #[test]
    fn test_transport_failure_keeps_entries() {
        let t = Telemetry::new();
        t.log_error("sensor fault");
        let transport = Collecting {
            fail_on: Some(otlp::LOGS_PATH),
            ..Collecting::default()
        };
        let mut exporter = OtlpExporter::new(ResourceInfo::default(), transport);

        let err = flush(&t, &mut exporter).unwrap_err();
        assert!(err.to_string().contains("/v1/logs"));
        assert!(err.to_string().contains("connection refused"));
        assert_eq!(t.log_queue().len(), 1);
    }

    #[test]
    fn test_partial_failure_redelivers_earlier_signals() {
        let t = Telemetry::new();
        t.log_info("boot");
        t.record_counter("wakes", 1);
        let transport = Collecting {
            fail_on: Some(otlp::METRICS_PATH),
            ..Collecting::default()
        };
        let mut exporter = OtlpExporter::new(ResourceInfo::default(), transport);
        assert!(flush(&t, &mut exporter).is_err());
        assert_eq!(t.log_queue().len(), 1);

        let mut transport = exporter.into_transport();
        transport.fail_on = None;
        let mut exporter = OtlpExporter::new(ResourceInfo::default(), transport);
        flush(&t, &mut exporter).unwrap();

        let log_posts = exporter
            .transport()
            .posts
            .iter()
            .filter(|(p, _)| *p == otlp::LOGS_PATH)
            .count();
        assert_eq!(log_posts, 2);
        assert!(t.snapshot().is_empty());
    }

    #[test]
    fn test_empty_flush_skips_exporter() {
        let t = Telemetry::new();
        let transport = Collecting {
            fail_on: Some(otlp::LOGS_PATH),
            ..Collecting::default()
        };
        let mut exporter = OtlpExporter::new(ResourceInfo::default(), transport);
        let report = flush(&t, &mut exporter).unwrap();
        assert!(report.is_empty());
        assert!(exporter.into_transport().posts.is_empty());
    }
}
