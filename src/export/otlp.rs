//! OTLP/HTTP JSON request bodies built from buffered entries.
//!
//! Field names and encodings follow the OTLP protobuf JSON mapping: ids are
//! lowercase hex, 64-bit integers and timestamps are decimal strings.

use serde::Serialize;

use crate::telemetry::{
    is_zero_id, splitmix64, LogEntry, MetricEntry, SpanEntry, SpanId, TelemetrySnapshot, TraceId,
};

use super::ExportError;

/// Collector path for log exports.
pub const LOGS_PATH: &str = "/v1/logs";
/// Collector path for metric exports.
pub const METRICS_PATH: &str = "/v1/metrics";
/// Collector path for trace exports.
pub const TRACES_PATH: &str = "/v1/traces";

/// `AGGREGATION_TEMPORALITY_CUMULATIVE`
const CUMULATIVE: u8 = 2;
/// `SPAN_KIND_INTERNAL`
const SPAN_KIND_INTERNAL: u8 = 1;

const SCOPE_NAME: &str = "wakebuf";

/// Identity attached to every export as OTLP resource attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceInfo {
    pub service_name: String,
    pub instance_id: Option<String>,
}

impl Default for ResourceInfo {
    fn default() -> Self {
        Self {
            service_name: SCOPE_NAME.to_string(),
            instance_id: None,
        }
    }
}

impl ResourceInfo {
    fn to_resource(&self) -> Resource {
        let mut attributes = vec![KeyValue::string("service.name", &self.service_name)];
        if let Some(id) = &self.instance_id {
            attributes.push(KeyValue::string("service.instance.id", id));
        }
        Resource { attributes }
    }
}

// =============================================================================
// Common
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct Resource {
    pub attributes: Vec<KeyValue>,
}

#[derive(Debug, Clone, Serialize)]
pub struct KeyValue {
    pub key: String,
    pub value: AnyValue,
}

impl KeyValue {
    fn string(key: &str, value: &str) -> Self {
        Self {
            key: key.to_string(),
            value: AnyValue::StringValue(value.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AnyValue {
    StringValue(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct InstrumentationScope {
    pub name: &'static str,
    pub version: &'static str,
}

fn scope() -> InstrumentationScope {
    InstrumentationScope {
        name: SCOPE_NAME,
        version: env!("CARGO_PKG_VERSION"),
    }
}

// =============================================================================
// Logs
// =============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportLogsServiceRequest {
    pub resource_logs: Vec<ResourceLogs>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceLogs {
    pub resource: Resource,
    pub scope_logs: Vec<ScopeLogs>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeLogs {
    pub scope: InstrumentationScope,
    pub log_records: Vec<LogRecord>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    pub time_unix_nano: String,
    pub observed_time_unix_nano: String,
    pub severity_number: u8,
    pub severity_text: &'static str,
    pub body: AnyValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span_id: Option<String>,
}

impl From<&LogEntry> for LogRecord {
    fn from(entry: &LogEntry) -> Self {
        // A span id without a trace id means nothing to a collector.
        let trace_id = (entry.has_trace && !is_zero_id(&entry.trace_id))
            .then(|| hex::encode(entry.trace_id));
        let span_id = (trace_id.is_some() && !is_zero_id(&entry.span_id))
            .then(|| hex::encode(entry.span_id));
        Self {
            time_unix_nano: entry.timestamp.to_string(),
            observed_time_unix_nano: entry.timestamp.to_string(),
            severity_number: entry.severity.number(),
            severity_text: entry.severity.as_str(),
            body: AnyValue::StringValue(entry.body.to_string_lossy()),
            trace_id,
            span_id,
        }
    }
}

pub fn logs_request(resource: &ResourceInfo, logs: &[LogEntry]) -> ExportLogsServiceRequest {
    ExportLogsServiceRequest {
        resource_logs: vec![ResourceLogs {
            resource: resource.to_resource(),
            scope_logs: vec![ScopeLogs {
                scope: scope(),
                log_records: logs.iter().map(LogRecord::from).collect(),
            }],
        }],
    }
}

// =============================================================================
// Metrics
// =============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportMetricsServiceRequest {
    pub resource_metrics: Vec<ResourceMetrics>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceMetrics {
    pub resource: Resource,
    pub scope_metrics: Vec<ScopeMetrics>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeMetrics {
    pub scope: InstrumentationScope,
    pub metrics: Vec<Metric>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Metric {
    pub name: String,
    #[serde(flatten)]
    pub data: MetricData,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MetricData {
    Gauge(Gauge),
    Sum(Sum),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Gauge {
    pub data_points: Vec<NumberDataPoint>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Sum {
    pub data_points: Vec<NumberDataPoint>,
    pub aggregation_temporality: u8,
    pub is_monotonic: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NumberDataPoint {
    pub time_unix_nano: String,
    pub as_int: String,
}

impl MetricData {
    fn points_mut(&mut self) -> &mut Vec<NumberDataPoint> {
        match self {
            Self::Gauge(g) => &mut g.data_points,
            Self::Sum(s) => &mut s.data_points,
        }
    }

    fn is_gauge(&self) -> bool {
        matches!(self, Self::Gauge(_))
    }
}

/// Points sharing a name and kind become one metric, in first-seen order.
/// Every point is kept; nothing is summed.
pub fn metrics_request(resource: &ResourceInfo, points: &[MetricEntry]) -> ExportMetricsServiceRequest {
    let mut metrics: Vec<Metric> = Vec::new();
    for entry in points {
        let name = entry.name.to_string_lossy();
        let point = NumberDataPoint {
            time_unix_nano: entry.timestamp.to_string(),
            as_int: entry.value.to_string(),
        };
        let existing = metrics
            .iter_mut()
            .find(|m| m.name == name && m.data.is_gauge() == entry.is_gauge);
        match existing {
            Some(metric) => metric.data.points_mut().push(point),
            None => {
                let data = if entry.is_gauge {
                    MetricData::Gauge(Gauge { data_points: vec![point] })
                } else {
                    MetricData::Sum(Sum {
                        data_points: vec![point],
                        aggregation_temporality: CUMULATIVE,
                        is_monotonic: true,
                    })
                };
                metrics.push(Metric { name, data });
            }
        }
    }

    ExportMetricsServiceRequest {
        resource_metrics: vec![ResourceMetrics {
            resource: resource.to_resource(),
            scope_metrics: vec![ScopeMetrics {
                scope: scope(),
                metrics,
            }],
        }],
    }
}

// =============================================================================
// Traces
// =============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportTraceServiceRequest {
    pub resource_spans: Vec<ResourceSpans>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSpans {
    pub resource: Resource,
    pub scope_spans: Vec<ScopeSpans>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeSpans {
    pub scope: InstrumentationScope,
    pub spans: Vec<Span>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Span {
    pub trace_id: String,
    pub span_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_span_id: Option<String>,
    pub name: String,
    pub kind: u8,
    pub start_time_unix_nano: String,
    pub end_time_unix_nano: String,
    pub status: Status,
}

#[derive(Debug, Clone, Serialize)]
pub struct Status {
    pub code: u8,
}

/// Ids a span is exported under, never all-zero. A span recorded outside any
/// trace becomes the root of its own trace, derived from its span id.
fn export_ids(entry: &SpanEntry) -> (TraceId, SpanId, Option<SpanId>) {
    let span_id = if is_zero_id(&entry.span_id) {
        splitmix64(entry.start_time ^ entry.end_time.rotate_left(32))
            .max(1)
            .to_be_bytes()
    } else {
        entry.span_id
    };
    if is_zero_id(&entry.trace_id) {
        let mut trace_id = [0u8; 16];
        trace_id[..8].copy_from_slice(&splitmix64(u64::from_be_bytes(span_id)).to_be_bytes());
        trace_id[8..].copy_from_slice(&span_id);
        return (trace_id, span_id, None);
    }
    let parent = (!is_zero_id(&entry.parent_span_id)).then_some(entry.parent_span_id);
    (entry.trace_id, span_id, parent)
}

impl From<&SpanEntry> for Span {
    fn from(entry: &SpanEntry) -> Self {
        let (trace_id, span_id, parent) = export_ids(entry);
        Self {
            trace_id: hex::encode(trace_id),
            span_id: hex::encode(span_id),
            parent_span_id: parent.map(hex::encode),
            name: entry.name.to_string_lossy(),
            kind: SPAN_KIND_INTERNAL,
            start_time_unix_nano: entry.start_time.to_string(),
            end_time_unix_nano: entry.end_time.to_string(),
            status: Status {
                code: entry.status().code(),
            },
        }
    }
}

pub fn traces_request(resource: &ResourceInfo, spans: &[SpanEntry]) -> ExportTraceServiceRequest {
    ExportTraceServiceRequest {
        resource_spans: vec![ResourceSpans {
            resource: resource.to_resource(),
            scope_spans: vec![ScopeSpans {
                scope: scope(),
                spans: spans.iter().map(Span::from).collect(),
            }],
        }],
    }
}

// =============================================================================
// Encoding
// =============================================================================

/// JSON bodies for one export round. A signal with nothing buffered is `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OtlpBatch {
    pub logs: Option<Vec<u8>>,
    pub metrics: Option<Vec<u8>>,
    pub traces: Option<Vec<u8>>,
}

impl OtlpBatch {
    /// `(collector path, body)` pairs for the signals present.
    pub fn requests(&self) -> impl Iterator<Item = (&'static str, &[u8])> + '_ {
        [
            (LOGS_PATH, self.logs.as_deref()),
            (METRICS_PATH, self.metrics.as_deref()),
            (TRACES_PATH, self.traces.as_deref()),
        ]
        .into_iter()
        .filter_map(|(path, body)| body.map(|b| (path, b)))
    }
}

/// Encode a snapshot as OTLP/HTTP JSON bodies.
pub fn encode(resource: &ResourceInfo, snapshot: &TelemetrySnapshot) -> Result<OtlpBatch, ExportError> {
    let logs = if snapshot.logs.is_empty() {
        None
    } else {
        Some(serde_json::to_vec(&logs_request(resource, &snapshot.logs))?)
    };
    let metrics = if snapshot.metrics.is_empty() {
        None
    } else {
        Some(serde_json::to_vec(&metrics_request(resource, &snapshot.metrics))?)
    };
    let traces = if snapshot.spans.is_empty() {
        None
    } else {
        Some(serde_json::to_vec(&traces_request(resource, &snapshot.spans))?)
    };
    Ok(OtlpBatch { logs, metrics, traces })
}
