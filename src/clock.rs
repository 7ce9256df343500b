//! Time sources for entry timestamps.
//!
//! The buffer never decides what time it is. Hosts plug in whatever they
//! trust: the wall clock, an RTC synced over the network, or a test clock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of timestamps, in nanoseconds since the Unix epoch.
pub trait Clock: Send + Sync {
    fn now_unix_nano(&self) -> u64;
}

/// Wall clock backed by [`SystemTime`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix_nano(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            // A clock before 1970 means the RTC was never set. Never hand out 0.
            .unwrap_or(1)
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start_unix_nano: u64) -> Self {
        Self {
            now: AtomicU64::new(start_unix_nano),
        }
    }

    pub fn set(&self, unix_nano: u64) {
        self.now.store(unix_nano, Ordering::Release);
    }

    pub fn advance(&self, nanos: u64) {
        self.now.fetch_add(nanos, Ordering::AcqRel);
    }
}

impl Clock for ManualClock {
    fn now_unix_nano(&self) -> u64 {
        self.now.load(Ordering::Acquire)
    }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now_unix_nano(&self) -> u64 {
        (**self).now_unix_nano()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_non_zero() {
        assert!(SystemClock.now_unix_nano() > 0);
    }

    #[test]
    fn test_manual_clock_set_and_advance() {
        let clock = ManualClock::new(1_000);
        assert_eq!(clock.now_unix_nano(), 1_000);
        clock.advance(500);
        assert_eq!(clock.now_unix_nano(), 1_500);
        clock.set(10);
        assert_eq!(clock.now_unix_nano(), 10);
    }

    #[test]
    fn test_arc_clock_delegates() {
        let clock = std::sync::Arc::new(ManualClock::new(42));
        let shared: std::sync::Arc<ManualClock> = clock.clone();
        clock.advance(1);
        assert_eq!(shared.now_unix_nano(), 43);
    }
}
