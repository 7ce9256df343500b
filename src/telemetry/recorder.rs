//! The `Telemetry` recorder: gate, trace context, and the three buffers.
//!
//! Every buffer has its own lock, held only for a single append or copy.
//! Recording never fails and never blocks on anything but those locks.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;
use serde::Serialize;

use super::context::{splitmix64, SpanId, TraceContext, TraceId};
use super::log::{LogBuffer, LogEntry, Severity};
use super::metric::{MetricBuffer, MetricEntry};
use super::span::{EndOutcome, SpanEntry, SpanIndex, SpanTable};
use super::stats::{DropCounters, DropKind, DropStats};
use crate::clock::{Clock, SystemClock};

/// Buffer positions captured with a snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Checkpoint {
    logs: u64,
    metrics: u64,
    spans: u64,
}

/// Copy of everything buffered, oldest first within each queue.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TelemetrySnapshot {
    pub logs: Vec<LogEntry>,
    pub metrics: Vec<MetricEntry>,
    pub spans: Vec<SpanEntry>,
    pub stats: DropStats,
    #[serde(skip)]
    pub checkpoint: Checkpoint,
}

impl TelemetrySnapshot {
    pub fn is_empty(&self) -> bool {
        self.logs.is_empty() && self.metrics.is_empty() && self.spans.is_empty()
    }
}

/// In-memory telemetry buffer for one device.
pub struct Telemetry<K: Clock = SystemClock> {
    clock: K,
    enabled: AtomicBool,
    context: Mutex<TraceContext>,
    logs: Mutex<LogBuffer>,
    metrics: Mutex<MetricBuffer>,
    spans: Mutex<SpanTable>,
    drops: DropCounters,
    span_seq: AtomicU64,
}

impl Telemetry<SystemClock> {
    /// Create an enabled recorder stamped by the wall clock.
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for Telemetry<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clock> Telemetry<K> {
    pub fn with_clock(clock: K) -> Self {
        Self {
            clock,
            enabled: AtomicBool::new(true),
            context: Mutex::new(TraceContext::default()),
            logs: Mutex::new(LogBuffer::new()),
            metrics: Mutex::new(MetricBuffer::new()),
            spans: Mutex::new(SpanTable::new()),
            drops: DropCounters::default(),
            span_seq: AtomicU64::new(0),
        }
    }

    pub fn clock(&self) -> &K {
        &self.clock
    }

    // ---------------------------------------------------------------------
    // Gate
    // ---------------------------------------------------------------------

    pub fn enable(&self) {
        self.enabled.store(true, Ordering::Release);
    }

    pub fn disable(&self) {
        self.enabled.store(false, Ordering::Release);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    // ---------------------------------------------------------------------
    // Trace context
    // ---------------------------------------------------------------------

    /// Replace the current trace context. Applies to every later log and span
    /// until replaced, cleared, or reset.
    pub fn set_trace_context(&self, trace_id: TraceId, span_id: SpanId) {
        *self.context.lock() = TraceContext::new(trace_id, span_id);
    }

    pub fn clear_trace_context(&self) {
        *self.context.lock() = TraceContext::default();
    }

    pub fn trace_context(&self) -> TraceContext {
        *self.context.lock()
    }

    // ---------------------------------------------------------------------
    // Logs
    // ---------------------------------------------------------------------

    /// Buffer a log record. Bodies over 64 bytes are truncated.
    pub fn log(&self, severity: Severity, message: impl AsRef<[u8]>) {
        if !self.is_enabled() {
            return;
        }
        let ctx = self.trace_context();
        let (entry, truncated) =
            LogEntry::new(self.clock.now_unix_nano(), severity, message.as_ref(), ctx);
        if truncated {
            self.drops.record(DropKind::Truncated);
        }
        if self.logs.lock().push(entry) {
            self.drops.record(DropKind::LogEvicted);
            tracing::trace!("log buffer full, oldest entry evicted");
        }
    }

    pub fn log_debug(&self, message: impl AsRef<[u8]>) {
        self.log(Severity::Debug, message);
    }

    pub fn log_info(&self, message: impl AsRef<[u8]>) {
        self.log(Severity::Info, message);
    }

    pub fn log_warn(&self, message: impl AsRef<[u8]>) {
        self.log(Severity::Warn, message);
    }

    pub fn log_error(&self, message: impl AsRef<[u8]>) {
        self.log(Severity::Error, message);
    }

    /// Retained logs, oldest first. Non-destructive.
    pub fn log_queue(&self) -> Vec<LogEntry> {
        self.logs.lock().snapshot()
    }

    // ---------------------------------------------------------------------
    // Metrics
    // ---------------------------------------------------------------------

    pub fn record_gauge(&self, name: impl AsRef<[u8]>, value: i64) {
        self.record_metric(name.as_ref(), value, true);
    }

    pub fn record_counter(&self, name: impl AsRef<[u8]>, value: i64) {
        self.record_metric(name.as_ref(), value, false);
    }

    fn record_metric(&self, name: &[u8], value: i64, is_gauge: bool) {
        if !self.is_enabled() {
            return;
        }
        let (entry, truncated) = MetricEntry::new(self.clock.now_unix_nano(), name, value, is_gauge);
        if truncated {
            self.drops.record(DropKind::Truncated);
        }
        if self.metrics.lock().push(entry) {
            self.drops.record(DropKind::MetricEvicted);
            tracing::trace!("metric buffer full, oldest entry evicted");
        }
    }

    /// Retained metric points, oldest first. Non-destructive.
    pub fn metric_queue(&self) -> Vec<MetricEntry> {
        self.metrics.lock().snapshot()
    }

    // ---------------------------------------------------------------------
    // Spans
    // ---------------------------------------------------------------------

    /// Open a span. Returns [`SpanIndex::INVALID`] when disabled or when every
    /// slot is already in use; the span is then simply not recorded.
    pub fn start_span(&self, name: impl AsRef<[u8]>) -> SpanIndex {
        if !self.is_enabled() {
            return SpanIndex::INVALID;
        }
        let ctx = self.trace_context();
        let now = self.clock.now_unix_nano();
        let span_id = self.next_span_id(now);
        let started = self.spans.lock().start(name.as_ref(), now, &ctx, span_id);
        match started {
            Some((index, truncated)) => {
                if truncated {
                    self.drops.record(DropKind::Truncated);
                }
                index
            }
            None => {
                self.drops.record(DropKind::SpanDropped);
                tracing::debug!("all span slots busy, span dropped");
                SpanIndex::INVALID
            }
        }
    }

    /// Non-zero id from a per-recorder sequence mixed with the start time.
    fn next_span_id(&self, now: u64) -> SpanId {
        let seq = self.span_seq.fetch_add(1, Ordering::Relaxed);
        let id = splitmix64(now ^ seq.rotate_left(32)).max(1);
        id.to_be_bytes()
    }

    /// Close a span started by [`start_span`](Self::start_span). Indices that
    /// do not name an open span are ignored. Not affected by the gate.
    pub fn end_span(&self, index: impl Into<SpanIndex>, success: bool) {
        let index = index.into();
        let now = self.clock.now_unix_nano();
        let outcome = self.spans.lock().end(index, success, now);
        match outcome {
            EndOutcome::Completed { evicted: true } => {
                self.drops.record(DropKind::SpanEvicted);
                tracing::trace!("span buffer full, oldest entry evicted");
            }
            EndOutcome::Completed { evicted: false } => {}
            EndOutcome::Ignored => {
                tracing::trace!(index = index.get(), "end_span on idle or unknown slot ignored");
            }
        }
    }

    /// Completed spans, oldest first. In-flight spans are not included.
    pub fn span_queue(&self) -> Vec<SpanEntry> {
        self.spans.lock().completed()
    }

    pub fn active_spans(&self) -> usize {
        self.spans.lock().active_count()
    }

    // ---------------------------------------------------------------------
    // Drain / reset
    // ---------------------------------------------------------------------

    pub fn stats(&self) -> DropStats {
        self.drops.snapshot()
    }

    /// Copy all three queues along with a checkpoint for
    /// [`acknowledge`](Self::acknowledge).
    pub fn snapshot(&self) -> TelemetrySnapshot {
        let (logs, logs_mark) = {
            let buf = self.logs.lock();
            (buf.snapshot(), buf.mark())
        };
        let (metrics, metrics_mark) = {
            let buf = self.metrics.lock();
            (buf.snapshot(), buf.mark())
        };
        let (spans, spans_mark) = {
            let table = self.spans.lock();
            (table.completed(), table.completed_mark())
        };
        TelemetrySnapshot {
            logs,
            metrics,
            spans,
            stats: self.stats(),
            checkpoint: Checkpoint {
                logs: logs_mark,
                metrics: metrics_mark,
                spans: spans_mark,
            },
        }
    }

    /// Discard the entries contained in `snapshot`, keeping anything recorded
    /// after it was taken. In-flight spans, the gate, and the trace context
    /// are untouched.
    pub fn acknowledge(&self, snapshot: &TelemetrySnapshot) {
        let mark = snapshot.checkpoint;
        self.logs.lock().discard_before(mark.logs);
        self.metrics.lock().discard_before(mark.metrics);
        self.spans.lock().discard_completed_before(mark.spans);
    }

    /// Return to the freshly-constructed state: buffers and slots empty, gate
    /// enabled, trace context cleared, drop counters zeroed.
    pub fn reset(&self) {
        self.logs.lock().clear();
        self.metrics.lock().clear();
        self.spans.lock().clear();
        self.clear_trace_context();
        self.drops.reset();
        self.enable();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn recorder() -> Telemetry<ManualClock> {
        Telemetry::with_clock(ManualClock::new(1_000))
    }

    #[test]
    fn test_log_stamps_clock_time() {
        let t = recorder();
        t.clock().set(5_000);
        t.log_info("hello");
        assert_eq!(t.log_queue()[0].timestamp, 5_000);
    }

    #[test]
    fn test_span_times_follow_clock() {
        let t = recorder();
        let idx = t.start_span("fetch");
        t.clock().advance(250);
        t.end_span(idx, true);
        let span = t.span_queue()[0];
        assert_eq!(span.start_time, 1_000);
        assert_eq!(span.end_time, 1_250);
    }

    #[test]
    fn test_span_captures_trace_at_start() {
        let t = recorder();
        t.set_trace_context([1; 16], [2; 8]);
        let idx = t.start_span("op");
        t.set_trace_context([9; 16], [9; 8]);
        t.end_span(idx, true);
        assert_eq!(t.span_queue()[0].trace_id, [1; 16]);
    }

    #[test]
    fn test_span_ids_distinct_and_parented() {
        let t = recorder();
        t.set_trace_context([1; 16], [2; 8]);
        let a = t.start_span("a");
        let b = t.start_span("b");
        t.end_span(a, true);
        t.end_span(b, true);
        let spans = t.span_queue();
        assert_ne!(spans[0].span_id, spans[1].span_id);
        assert_ne!(spans[0].span_id, [0; 8]);
        assert_eq!(spans[0].parent_span_id, [2; 8]);
    }

    #[test]
    fn test_end_span_not_gated() {
        let t = recorder();
        let idx = t.start_span("op");
        t.disable();
        t.end_span(idx, true);
        assert_eq!(t.span_queue().len(), 1);
        assert_eq!(t.active_spans(), 0);
    }

    #[test]
    fn test_truncation_counted() {
        let t = recorder();
        t.log_info([b'x'; 65]);
        t.record_gauge([b'n'; 33], 1);
        let idx = t.start_span([b's'; 40]);
        t.end_span(idx, true);
        assert_eq!(t.stats().truncated, 3);
    }

    #[test]
    fn test_clear_trace_context() {
        let t = recorder();
        t.set_trace_context([1; 16], [1; 8]);
        t.clear_trace_context();
        t.log_info("after clear");
        assert!(!t.log_queue()[0].has_trace);
    }

    #[test]
    fn test_snapshot_checkpoint_keeps_later_entries() {
        let t = recorder();
        t.log_info("a");
        t.record_counter("c", 1);
        let snap = t.snapshot();
        t.log_info("b");
        t.acknowledge(&snap);

        let logs = t.log_queue();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].body, "b");
        assert!(t.metric_queue().is_empty());
    }

    #[test]
    fn test_acknowledge_keeps_active_spans() {
        let t = recorder();
        let done = t.start_span("done");
        t.end_span(done, true);
        let open = t.start_span("open");
        let snap = t.snapshot();
        t.acknowledge(&snap);

        assert!(t.span_queue().is_empty());
        assert_eq!(t.active_spans(), 1);
        t.end_span(open, true);
        assert_eq!(t.span_queue().len(), 1);
    }
}
