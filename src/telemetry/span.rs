//! Span lifecycle: a fixed table of in-flight spans feeding a ring of
//! completed ones.
//!
//! A slot is either idle or active. `start` moves a free slot to active and
//! `end` converts it into a [`SpanEntry`] in the completed ring and frees the
//! slot. Completed spans never return to the table.

use serde::Serialize;

use super::context::{hex_bytes, SpanId, TraceContext, TraceId};
use crate::buffer::{FixedBytes, RingBuffer};

/// Maximum stored span name, in bytes.
pub const MAX_SPAN_NAME_LEN: usize = 32;

/// Retained completed spans.
pub const SPAN_CAPACITY: usize = 8;

/// Concurrently open spans.
pub const MAX_ACTIVE_SPANS: usize = 4;

/// OTLP span status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum SpanStatus {
    Unset = 0,
    Ok = 1,
    Error = 2,
}

impl SpanStatus {
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Handle to an active span slot.
///
/// Any `i32` converts into a `SpanIndex`; values that do not name an occupied
/// slot are ignored by [`SpanTable::end`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SpanIndex(i32);

impl SpanIndex {
    /// Returned when no slot was allocated.
    pub const INVALID: SpanIndex = SpanIndex(-1);

    pub fn get(self) -> i32 {
        self.0
    }

    /// `false` only for the sentinel and other negative values. A
    /// non-negative index may still be out of range or already ended.
    pub fn is_valid(self) -> bool {
        self.0 >= 0
    }

    fn slot(self) -> Option<usize> {
        usize::try_from(self.0).ok()
    }
}

impl From<i32> for SpanIndex {
    fn from(raw: i32) -> Self {
        SpanIndex(raw)
    }
}

/// A finished span.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SpanEntry {
    pub name: FixedBytes<MAX_SPAN_NAME_LEN>,
    /// Unix nanoseconds.
    pub start_time: u64,
    /// Unix nanoseconds, never before `start_time`.
    pub end_time: u64,
    pub status_ok: bool,
    #[serde(with = "hex_bytes")]
    pub trace_id: TraceId,
    /// Identifier generated for this span at start.
    #[serde(with = "hex_bytes")]
    pub span_id: SpanId,
    /// Span id from the trace context at start, zero if none was active.
    #[serde(with = "hex_bytes")]
    pub parent_span_id: SpanId,
}

impl SpanEntry {
    pub fn name_len(&self) -> usize {
        self.name.len()
    }

    pub fn status(&self) -> SpanStatus {
        if self.status_ok {
            SpanStatus::Ok
        } else {
            SpanStatus::Error
        }
    }

    pub fn duration_nanos(&self) -> u64 {
        self.end_time.saturating_sub(self.start_time)
    }
}

/// An in-flight span occupying a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveSpan {
    pub name: FixedBytes<MAX_SPAN_NAME_LEN>,
    pub start_time: u64,
    pub trace_id: TraceId,
    pub span_id: SpanId,
    pub parent_span_id: SpanId,
}

/// What happened when a span was ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndOutcome {
    /// Index did not name an active slot.
    Ignored,
    /// Span completed. `evicted` is set if the completed ring overwrote an entry.
    Completed { evicted: bool },
}

/// Slot table plus completed-span ring.
#[derive(Debug, Clone)]
pub struct SpanTable<const N: usize = MAX_ACTIVE_SPANS, const C: usize = SPAN_CAPACITY> {
    slots: [Option<ActiveSpan>; N],
    completed: RingBuffer<SpanEntry, C>,
}

impl<const N: usize, const C: usize> SpanTable<N, C> {
    pub fn new() -> Self {
        Self {
            slots: [None; N],
            completed: RingBuffer::new(),
        }
    }

    /// Claim the lowest free slot. Returns `None` when every slot is busy.
    /// On success also reports whether the name was truncated.
    ///
    /// The span joins `ctx`'s trace; if `ctx` is active its span id becomes
    /// the parent.
    pub fn start(
        &mut self,
        name: &[u8],
        now: u64,
        ctx: &TraceContext,
        span_id: SpanId,
    ) -> Option<(SpanIndex, bool)> {
        let free = self.slots.iter().position(Option::is_none)?;
        let (name, truncated) = FixedBytes::truncating(name);
        self.slots[free] = Some(ActiveSpan {
            name,
            start_time: now,
            trace_id: ctx.trace_id,
            span_id,
            parent_span_id: if ctx.active { ctx.span_id } else { [0; 8] },
        });
        // N is a small compile-time constant, well within i32.
        Some((SpanIndex(free as i32), truncated))
    }

    /// Complete the span in `index`. Unknown or idle indices are ignored.
    pub fn end(&mut self, index: SpanIndex, success: bool, now: u64) -> EndOutcome {
        let Some(active) = index
            .slot()
            .and_then(|i| self.slots.get_mut(i))
            .and_then(Option::take)
        else {
            return EndOutcome::Ignored;
        };

        let entry = SpanEntry {
            name: active.name,
            start_time: active.start_time,
            end_time: now.max(active.start_time),
            status_ok: success,
            trace_id: active.trace_id,
            span_id: active.span_id,
            parent_span_id: active.parent_span_id,
        };
        let evicted = self.completed.push(entry);
        EndOutcome::Completed { evicted }
    }

    pub fn is_active(&self, index: SpanIndex) -> bool {
        index
            .slot()
            .and_then(|i| self.slots.get(i))
            .map_or(false, Option::is_some)
    }

    /// Number of occupied slots.
    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Completed spans, oldest first.
    pub fn completed(&self) -> Vec<SpanEntry> {
        self.completed.snapshot()
    }

    pub fn completed_len(&self) -> usize {
        self.completed.len()
    }

    pub fn completed_mark(&self) -> u64 {
        self.completed.mark()
    }

    /// Drop completed spans finished before `mark`, leaving in-flight ones
    /// and anything completed since alone.
    pub fn discard_completed_before(&mut self, mark: u64) {
        self.completed.discard_before(mark);
    }

    /// Free every slot and drop every completed span.
    pub fn clear(&mut self) {
        self.slots = [None; N];
        self.completed.clear();
    }
}

impl<const N: usize, const C: usize> Default for SpanTable<N, C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(trace_id: TraceId) -> TraceContext {
        TraceContext::new(trace_id, [0xee; 8])
    }

    #[test]
    fn test_status_codes_match_otlp() {
        assert_eq!(SpanStatus::Unset.code(), 0);
        assert_eq!(SpanStatus::Ok.code(), 1);
        assert_eq!(SpanStatus::Error.code(), 2);
    }

    #[test]
    fn test_start_uses_lowest_free_slot() {
        let mut table: SpanTable<3, 4> = SpanTable::new();
        let (a, _) = table.start(b"a", 1, &ctx([0; 16]), [1; 8]).unwrap();
        let (b, _) = table.start(b"b", 1, &ctx([0; 16]), [1; 8]).unwrap();
        assert_eq!(a.get(), 0);
        assert_eq!(b.get(), 1);

        table.end(a, true, 2);
        let (c, _) = table.start(b"c", 3, &ctx([0; 16]), [1; 8]).unwrap();
        assert_eq!(c.get(), 0, "freed slot is reused");
    }

    #[test]
    fn test_start_when_full_returns_none() {
        let mut table: SpanTable<2, 4> = SpanTable::new();
        assert!(table.start(b"a", 1, &ctx([0; 16]), [1; 8]).is_some());
        assert!(table.start(b"b", 1, &ctx([0; 16]), [1; 8]).is_some());
        assert!(table.start(b"c", 1, &ctx([0; 16]), [1; 8]).is_none());
        assert_eq!(table.active_count(), 2);
    }

    #[test]
    fn test_end_moves_to_completed() {
        let mut table: SpanTable<2, 4> = SpanTable::new();
        let (idx, _) = table.start(b"connect", 100, &ctx([3; 16]), [1; 8]).unwrap();
        assert!(table.is_active(idx));
        assert_eq!(table.completed_len(), 0);

        let outcome = table.end(idx, false, 250);
        assert_eq!(outcome, EndOutcome::Completed { evicted: false });
        assert!(!table.is_active(idx));

        let spans = table.completed();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].name, "connect");
        assert_eq!(spans[0].start_time, 100);
        assert_eq!(spans[0].end_time, 250);
        assert_eq!(spans[0].duration_nanos(), 150);
        assert_eq!(spans[0].status(), SpanStatus::Error);
        assert_eq!(spans[0].trace_id, [3; 16]);
        assert_eq!(spans[0].span_id, [1; 8]);
        assert_eq!(spans[0].parent_span_id, [0xee; 8]);
    }

    #[test]
    fn test_no_parent_without_active_context() {
        let mut table: SpanTable<1, 1> = SpanTable::new();
        let (idx, _) = table
            .start(b"root", 1, &TraceContext::default(), [5; 8])
            .unwrap();
        table.end(idx, true, 2);
        let span = table.completed()[0];
        assert_eq!(span.parent_span_id, [0; 8]);
        assert_eq!(span.trace_id, [0; 16]);
        assert_eq!(span.span_id, [5; 8]);
    }

    #[test]
    fn test_end_twice_is_ignored() {
        let mut table: SpanTable<2, 4> = SpanTable::new();
        let (idx, _) = table.start(b"x", 1, &ctx([0; 16]), [1; 8]).unwrap();
        table.end(idx, true, 2);
        assert_eq!(table.end(idx, true, 3), EndOutcome::Ignored);
        assert_eq!(table.completed_len(), 1);
    }

    #[test]
    fn test_end_adversarial_indices() {
        let mut table: SpanTable<2, 4> = SpanTable::new();
        for raw in [i32::MIN, -1, 0, 1, 2, 100, i32::MAX] {
            assert_eq!(table.end(SpanIndex::from(raw), true, 1), EndOutcome::Ignored);
        }
        assert_eq!(table.end(SpanIndex::INVALID, false, 1), EndOutcome::Ignored);
        assert_eq!(table.completed_len(), 0);
    }

    #[test]
    fn test_end_time_clamped_to_start() {
        let mut table: SpanTable<1, 2> = SpanTable::new();
        let (idx, _) = table.start(b"x", 500, &ctx([0; 16]), [1; 8]).unwrap();
        table.end(idx, true, 100);
        let span = table.completed()[0];
        assert_eq!(span.end_time, 500);
        assert_eq!(span.duration_nanos(), 0);
    }

    #[test]
    fn test_completed_ring_evicts() {
        let mut table: SpanTable<1, 2> = SpanTable::new();
        let mut evictions = 0;
        for i in 0..5u64 {
            let (idx, _) = table.start(b"s", i, &ctx([0; 16]), [1; 8]).unwrap();
            if let EndOutcome::Completed { evicted: true } = table.end(idx, true, i) {
                evictions += 1;
            }
        }
        assert_eq!(evictions, 3);
        let starts: Vec<u64> = table.completed().iter().map(|s| s.start_time).collect();
        assert_eq!(starts, vec![3, 4]);
    }

    #[test]
    fn test_clear_frees_slots() {
        let mut table: SpanTable<2, 2> = SpanTable::new();
        let (idx, _) = table.start(b"x", 1, &ctx([0; 16]), [1; 8]).unwrap();
        table.start(b"y", 1, &ctx([0; 16]), [1; 8]).unwrap();
        table.clear();
        assert_eq!(table.active_count(), 0);
        assert_eq!(table.end(idx, true, 2), EndOutcome::Ignored);
    }

    #[test]
    fn test_sentinel_is_not_valid() {
        assert!(!SpanIndex::INVALID.is_valid());
        assert_eq!(SpanIndex::INVALID.get(), -1);
        assert!(SpanIndex::from(0).is_valid());
    }

    #[test]
    fn test_duration_of_hand_built_entry_saturates() {
        let entry = SpanEntry {
            start_time: 500,
            end_time: 100,
            ..SpanEntry::default()
        };
        assert_eq!(entry.duration_nanos(), 0);
        assert_eq!(SpanEntry::default().duration_nanos(), 0);
    }
}
