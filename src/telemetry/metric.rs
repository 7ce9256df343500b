//! Metric points and their ring buffer.
//!
//! Points are stored as recorded. Nothing here sums counters or keeps
//! per-name state; each call is one retained point.

use serde::Serialize;

use crate::buffer::{FixedBytes, RingBuffer};

/// Maximum stored metric name, in bytes.
pub const MAX_METRIC_NAME_LEN: usize = 32;

/// Retained metric entries.
pub const METRIC_CAPACITY: usize = 8;

/// A buffered metric point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricEntry {
    /// Unix nanoseconds.
    pub timestamp: u64,
    pub name: FixedBytes<MAX_METRIC_NAME_LEN>,
    pub value: i64,
    /// `true` for a point-in-time gauge, `false` for a monotonic counter.
    pub is_gauge: bool,
}

impl MetricEntry {
    pub fn new(timestamp: u64, name: &[u8], value: i64, is_gauge: bool) -> (Self, bool) {
        let (name, truncated) = FixedBytes::truncating(name);
        let entry = Self {
            timestamp,
            name,
            value,
            is_gauge,
        };
        (entry, truncated)
    }

    pub fn name_len(&self) -> usize {
        self.name.len()
    }
}

/// Ring of the most recent metric points.
pub type MetricBuffer = RingBuffer<MetricEntry, METRIC_CAPACITY>;
