//! Wait Mechanisms
//!
//! The blocking poll loop shared by every readiness condition, and the bounded
//! document-settle heuristic used to recover from page transitions.
//!
//! ## Polling contract
//!
//! - A condition is always checked at least once, even with a zero timeout
//! - Sleeping goes through the injected [`Clock`]
//! - A stale fault aborts the loop immediately so the caller can recover

use crate::clock::Clock;
use crate::driver::Driver;
use crate::result::{PageError, PageResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default timeout for readiness waits (10 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 10_000;

/// Default polling interval (100ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Default upper bound on document-ready polls during settle
pub const DEFAULT_SETTLE_MAX_POLLS: u32 = 20;

/// Default pause before each document-ready poll (500ms)
pub const DEFAULT_SETTLE_INTERVAL_MS: u64 = 500;

/// Default number of consecutive ready reports that count as settled
pub const DEFAULT_SETTLE_READY_STREAK: u32 = 3;

// =============================================================================
// WAIT POLICY
// =============================================================================

/// Timeout and polling interval for a readiness wait
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitPolicy {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitPolicy {
    /// Create a policy with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Replace the timeout when a field declares its own
    #[must_use]
    pub fn overridden_by(self, timeout: Option<Duration>) -> Self {
        match timeout {
            Some(t) => self.with_timeout(t.as_millis() as u64),
            None => self,
        }
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

// =============================================================================
// POLL LOOP
// =============================================================================

/// Why a poll loop stopped without the condition holding
#[derive(Debug)]
pub enum WaitFault {
    /// The timeout elapsed
    TimedOut {
        /// Time spent polling
        elapsed: Duration,
    },
    /// The condition hit a stale element reference
    Stale,
    /// The condition failed with a non-transient error
    Failed(PageError),
}

/// Poll `check` until it reports `true` or the policy timeout elapses.
///
/// Returns the time spent waiting on success.
pub fn poll_until<F>(clock: &dyn Clock, policy: &WaitPolicy, mut check: F) -> Result<Duration, WaitFault>
where
    F: FnMut() -> PageResult<bool>,
{
    let start = clock.now();
    let timeout = policy.timeout();
    let interval = policy.poll_interval();

    loop {
        match check() {
            Ok(true) => return Ok(clock.elapsed_since(start)),
            Ok(false) => {}
            Err(e) if e.is_stale() => return Err(WaitFault::Stale),
            Err(e) => return Err(WaitFault::Failed(e)),
        }

        let elapsed = clock.elapsed_since(start);
        if elapsed >= timeout {
            return Err(WaitFault::TimedOut { elapsed });
        }
        clock.sleep(interval.min(timeout - elapsed));
    }
}

// =============================================================================
// DOCUMENT SETTLE
// =============================================================================

/// Bounds of the document-settle heuristic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettlePolicy {
    /// Maximum number of document-ready polls
    pub max_polls: u32,
    /// Pause before each poll, in milliseconds
    pub interval_ms: u64,
    /// Consecutive ready reports required
    pub ready_streak: u32,
}

impl Default for SettlePolicy {
    fn default() -> Self {
        Self {
            max_polls: DEFAULT_SETTLE_MAX_POLLS,
            interval_ms: DEFAULT_SETTLE_INTERVAL_MS,
            ready_streak: DEFAULT_SETTLE_READY_STREAK,
        }
    }
}

impl SettlePolicy {
    /// Pause before each poll as Duration
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Outcome of one settle observation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleState {
    /// Keep polling
    Pending,
    /// The document reported ready often enough in a row
    Settled,
    /// The poll budget ran out first
    GaveUp,
}

/// Counts document-ready reports until the page looks settled.
///
/// A not-ready report resets the streak. The machine never runs past
/// `max_polls` observations.
#[derive(Debug, Clone)]
pub struct DocumentSettle {
    policy: SettlePolicy,
    polls: u32,
    streak: u32,
}

impl DocumentSettle {
    /// Start a fresh settle
    #[must_use]
    pub const fn new(policy: SettlePolicy) -> Self {
        Self {
            policy,
            polls: 0,
            streak: 0,
        }
    }

    /// Record one poll result
    pub fn observe(&mut self, ready: bool) -> SettleState {
        self.polls += 1;
        self.streak = if ready { self.streak + 1 } else { 0 };

        if self.streak >= self.policy.ready_streak {
            SettleState::Settled
        } else if self.polls >= self.policy.max_polls {
            SettleState::GaveUp
        } else {
            SettleState::Pending
        }
    }

    /// Polls observed so far
    #[must_use]
    pub const fn polls(&self) -> u32 {
        self.polls
    }

    /// Pause, probe and observe until the machine leaves `Pending`.
    ///
    /// Probe failures count as not ready.
    pub fn run(&mut self, driver: &dyn Driver, clock: &dyn Clock) -> SettleState {
        loop {
            clock.sleep(self.policy.interval());
            let ready = match driver.document_ready() {
                Ok(ready) => ready,
                Err(e) => {
                    debug!(error = %e, "document ready probe failed");
                    false
                }
            };
            let state = self.observe(ready);
            debug!(poll = self.polls, ready, ?state, "document settle poll");
            if state != SettleState::Pending {
                return state;
            }
        }
    }
}
