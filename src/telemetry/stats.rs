//! Accounting for data the buffers discarded.
//!
//! Losing data under pressure is expected behavior, so it is counted rather
//! than reported as an error. Counts live here for exporters and are mirrored
//! to the `metrics` facade for hosts that install a recorder.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Snapshot of drop counters since the last reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropStats {
    pub logs_evicted: u64,
    pub metrics_evicted: u64,
    pub spans_evicted: u64,
    /// Spans rejected at start because every slot was busy.
    pub spans_dropped: u64,
    /// Bodies and names cut to their fixed width.
    pub truncated: u64,
}

impl DropStats {
    pub fn total_lost(&self) -> u64 {
        self.logs_evicted + self.metrics_evicted + self.spans_evicted + self.spans_dropped
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum DropKind {
    LogEvicted,
    MetricEvicted,
    SpanEvicted,
    SpanDropped,
    Truncated,
}

impl DropKind {
    fn metric_name(self) -> &'static str {
        match self {
            Self::LogEvicted => "wakebuf_logs_evicted_total",
            Self::MetricEvicted => "wakebuf_metrics_evicted_total",
            Self::SpanEvicted => "wakebuf_spans_evicted_total",
            Self::SpanDropped => "wakebuf_spans_dropped_total",
            Self::Truncated => "wakebuf_truncated_total",
        }
    }
}

/// Live counters.
#[derive(Debug, Default)]
pub(crate) struct DropCounters {
    logs_evicted: AtomicU64,
    metrics_evicted: AtomicU64,
    spans_evicted: AtomicU64,
    spans_dropped: AtomicU64,
    truncated: AtomicU64,
}

impl DropCounters {
    pub fn record(&self, kind: DropKind) {
        let counter = match kind {
            DropKind::LogEvicted => &self.logs_evicted,
            DropKind::MetricEvicted => &self.metrics_evicted,
            DropKind::SpanEvicted => &self.spans_evicted,
            DropKind::SpanDropped => &self.spans_dropped,
            DropKind::Truncated => &self.truncated,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        metrics::counter!(kind.metric_name()).increment(1);
    }

    pub fn snapshot(&self) -> DropStats {
        DropStats {
            logs_evicted: self.logs_evicted.load(Ordering::Relaxed),
            metrics_evicted: self.metrics_evicted.load(Ordering::Relaxed),
            spans_evicted: self.spans_evicted.load(Ordering::Relaxed),
            spans_dropped: self.spans_dropped.load(Ordering::Relaxed),
            truncated: self.truncated.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        self.logs_evicted.store(0, Ordering::Relaxed);
        self.metrics_evicted.store(0, Ordering::Relaxed);
        self.spans_evicted.store(0, Ordering::Relaxed);
        self.spans_dropped.store(0, Ordering::Relaxed);
        self.truncated.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_start_at_zero() {
        let counters = DropCounters::default();
        assert_eq!(counters.snapshot(), DropStats::default());
    }

    #[test]
    fn test_record_and_reset() {
        let counters = DropCounters::default();
        counters.record(DropKind::LogEvicted);
        counters.record(DropKind::LogEvicted);
        counters.record(DropKind::SpanDropped);
        counters.record(DropKind::Truncated);

        let stats = counters.snapshot();
        assert_eq!(stats.logs_evicted, 2);
        assert_eq!(stats.spans_dropped, 1);
        assert_eq!(stats.truncated, 1);
        assert_eq!(stats.total_lost(), 3, "truncation is not loss of a record");

        counters.reset();
        assert_eq!(counters.snapshot(), DropStats::default());
    }
}
