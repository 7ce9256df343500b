//! Fixed-capacity circular buffer with FIFO eviction.

/// Circular buffer holding at most `C` entries.
///
/// Storage is a fixed array addressed by a write cursor. Once full, each push
/// overwrites the logically oldest entry in place.
#[derive(Debug, Clone)]
pub struct RingBuffer<T, const C: usize> {
    entries: [T; C],
    /// Slot the next push writes to.
    cursor: usize,
    count: usize,
    /// Total pushes since construction. Never reset.
    pushed: u64,
}

impl<T: Copy + Default, const C: usize> RingBuffer<T, C> {
    pub fn new() -> Self {
        assert!(C > 0, "ring buffer capacity must be non-zero");
        Self {
            entries: [T::default(); C],
            cursor: 0,
            count: 0,
            pushed: 0,
        }
    }

    /// Append an entry. Returns `true` if the oldest entry was evicted.
    pub fn push(&mut self, entry: T) -> bool {
        let evicted = self.count == C;
        self.entries[self.cursor] = entry;
        self.cursor = (self.cursor + 1) % C;
        if !evicted {
            self.count += 1;
        }
        self.pushed += 1;
        evicted
    }

    /// Iterate retained entries, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        let start = (self.cursor + C - self.count) % C;
        (0..self.count).map(move |i| &self.entries[(start + i) % C])
    }

    /// Copy retained entries out, oldest first. Does not consume them.
    pub fn snapshot(&self) -> Vec<T> {
        self.iter().copied().collect()
    }

    /// Position marker for [`discard_before`](Self::discard_before).
    pub fn mark(&self) -> u64 {
        self.pushed
    }

    /// Drop every retained entry pushed before `mark` was taken, keeping
    /// anything newer.
    pub fn discard_before(&mut self, mark: u64) {
        let newer = self.pushed.saturating_sub(mark).min(self.count as u64);
        self.count = newer as usize;
    }

    pub fn clear(&mut self) {
        self.entries = [T::default(); C];
        self.cursor = 0;
        self.count = 0;
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn is_full(&self) -> bool {
        self.count == C
    }

    pub const fn capacity(&self) -> usize {
        C
    }
}

impl<T: Copy + Default, const C: usize> Default for RingBuffer<T, C> {
    fn default() -> Self {
        Self::new()
    }
}
