//! Log records and their ring buffer.

use serde::Serialize;

use super::context::{hex_bytes, SpanId, TraceContext, TraceId};
use crate::buffer::{FixedBytes, RingBuffer};

/// Maximum stored log body, in bytes.
pub const MAX_BODY_LEN: usize = 64;

/// Retained log entries.
pub const LOG_CAPACITY: usize = 8;

/// Log severity. Discriminants are OTLP `SeverityNumber` values and are part
/// of the wire contract.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[repr(u8)]
pub enum Severity {
    Debug = 5,
    #[default]
    Info = 9,
    Warn = 13,
    Error = 17,
}

impl Severity {
    /// OTLP severity number.
    pub fn number(self) -> u8 {
        self as u8
    }

    /// OTLP severity text.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }

    /// Map an OTLP severity number back, if it is one of ours.
    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            5 => Some(Self::Debug),
            9 => Some(Self::Info),
            13 => Some(Self::Warn),
            17 => Some(Self::Error),
            _ => None,
        }
    }
}

/// A buffered log record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    /// Unix nanoseconds.
    pub timestamp: u64,
    pub severity: Severity,
    pub body: FixedBytes<MAX_BODY_LEN>,
    pub has_trace: bool,
    #[serde(with = "hex_bytes")]
    pub trace_id: TraceId,
    #[serde(with = "hex_bytes")]
    pub span_id: SpanId,
}

impl LogEntry {
    /// Build an entry, truncating `message`. Returns the entry and whether
    /// truncation happened.
    pub fn new(timestamp: u64, severity: Severity, message: &[u8], ctx: TraceContext) -> (Self, bool) {
        let (body, truncated) = FixedBytes::truncating(message);
        let entry = Self {
            timestamp,
            severity,
            body,
            has_trace: ctx.active,
            trace_id: ctx.trace_id,
            span_id: ctx.span_id,
        };
        (entry, truncated)
    }

    pub fn body_len(&self) -> usize {
        self.body.len()
    }
}

/// Ring of the most recent log entries.
pub type LogBuffer = RingBuffer<LogEntry, LOG_CAPACITY>;
