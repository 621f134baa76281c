//! Clock Abstraction for Deterministic Waits
//!
//! Every wait in the engine reads time and sleeps through a [`Clock`], so tests
//! can swap [`SystemClock`] for a [`FakeClock`] whose sleeps advance virtual time
//! instantly.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Time source used by waits
pub trait Clock: Send + Sync + fmt::Debug {
    /// Current instant
    fn now(&self) -> Instant;

    /// Block the calling thread for `duration`
    fn sleep(&self, duration: Duration);

    /// Time since `start`
    fn elapsed_since(&self, start: Instant) -> Duration {
        self.now().saturating_duration_since(start)
    }
}

/// Wall clock backed by `std::thread::sleep`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Shared system clock
#[must_use]
pub fn system_clock() -> Arc<dyn Clock> {
    Arc::new(SystemClock)
}

/// Virtual clock: time only moves when someone sleeps or calls [`advance`](Self::advance)
#[derive(Debug)]
pub struct FakeClock {
    base: Instant,
    /// Virtual offset from `base`, in milliseconds
    offset_ms: AtomicU64,
    /// Total number of sleeps observed
    sleeps: AtomicU64,
}

impl FakeClock {
    /// Create a fake clock at offset zero
    #[must_use]
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset_ms: AtomicU64::new(0),
            sleeps: AtomicU64::new(0),
        }
    }

    /// Create a shared fake clock
    #[must_use]
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Move virtual time forward
    pub fn advance(&self, duration: Duration) {
        self.offset_ms
            .fetch_add(duration.as_millis() as u64, Ordering::SeqCst);
    }

    /// Virtual time elapsed since creation
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.offset_ms.load(Ordering::SeqCst))
    }

    /// Number of sleeps so far
    #[must_use]
    pub fn sleep_count(&self) -> u64 {
        self.sleeps.load(Ordering::SeqCst)
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        self.base + self.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        self.sleeps.fetch_add(1, Ordering::SeqCst);
        self.advance(duration);
    }
}
