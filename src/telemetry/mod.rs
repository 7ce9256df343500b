//! Telemetry buffering: logs, metric points, and spans held in fixed rings
//! until an exporter collects them.
//!
//! All storage is sized at compile time; nothing allocates on the recording
//! path.

mod context;
mod log;
mod logging;
mod metric;
mod recorder;
mod span;
mod stats;

pub use context::{SpanId, TraceContext, TraceId};
pub(crate) use context::{is_zero_id, splitmix64};
pub use log::{LogBuffer, LogEntry, Severity, LOG_CAPACITY, MAX_BODY_LEN};
pub use logging::{init_logging, LogConfig, LogError, LogFormat};
pub use metric::{MetricBuffer, MetricEntry, MAX_METRIC_NAME_LEN, METRIC_CAPACITY};
pub use recorder::{Checkpoint, Telemetry, TelemetrySnapshot};
pub use span::{
    ActiveSpan, EndOutcome, SpanEntry, SpanIndex, SpanStatus, SpanTable, MAX_ACTIVE_SPANS,
    MAX_SPAN_NAME_LEN, SPAN_CAPACITY,
};
pub use stats::DropStats;
