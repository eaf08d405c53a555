//! Circuit breaker guarding a single remote dependency.
//!
//! After a run of consecutive faults the breaker opens and calls fail
//! immediately without touching the network. Once the cooldown elapses
//! a single probe call is admitted; its outcome decides whether the
//! breaker closes again or re-opens for another cooldown.

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU32, Ordering};
use std::time::Duration;

use chrono::Utc;

/// Observable breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    /// Normal operation, calls pass through.
    Closed,
    /// Tripped: calls fail fast until the cooldown elapses.
    Open,
    /// Cooldown elapsed: one probe call is in flight.
    HalfOpen,
}

impl std::fmt::Display for BreakerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BreakerState::Closed => write!(f, "Closed"),
            BreakerState::Open => write!(f, "Open"),
            BreakerState::HalfOpen => write!(f, "HalfOpen"),
        }
    }
}

/// Lock-free circuit breaker.
///
/// All state lives in atomics so the breaker can sit on the request
/// path of every cross-service call without contention.
#[derive(Debug)]
pub struct CircuitBreaker {
    max_consecutive_failures: u32,
    cooldown: Duration,
    open: AtomicBool,
    half_open: AtomicBool,
    consecutive_failures: AtomicU32,
    opened_at_ms: AtomicI64,
}

impl CircuitBreaker {
    /// Creates a breaker that opens after `max_consecutive_failures`
    /// faults and stays open for `cooldown`.
    pub fn new(max_consecutive_failures: u32, cooldown: Duration) -> Self {
        Self {
            max_consecutive_failures,
            cooldown,
            open: AtomicBool::new(false),
            half_open: AtomicBool::new(false),
            consecutive_failures: AtomicU32::new(0),
            opened_at_ms: AtomicI64::new(0),
        }
    }

    /// Returns the current state.
    pub fn state(&self) -> BreakerState {
        if !self.open.load(Ordering::Acquire) {
            BreakerState::Closed
        } else if self.half_open.load(Ordering::Acquire) {
            BreakerState::HalfOpen
        } else {
            BreakerState::Open
        }
    }

    /// True while the breaker refuses regular calls.
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Current consecutive fault count.
    pub fn failure_count(&self) -> u32 {
        self.consecutive_failures.load(Ordering::Acquire)
    }

    /// Records a successful call. Closes the breaker if it was probing.
    pub fn record_success(&self) {
        self.consecutive_failures.store(0, Ordering::Release);
        if self.half_open.load(Ordering::Acquire) {
            self.half_open.store(false, Ordering::Release);
            self.open.store(false, Ordering::Release);
        }
    }

    /// Records a fault. Returns true if the breaker opened as a result.
    pub fn record_failure(&self) -> bool {
        // A failed probe re-opens immediately for another cooldown.
        if self.half_open.swap(false, Ordering::AcqRel) {
            self.trip();
            return true;
        }

        let failures = self.consecutive_failures.fetch_add(1, Ordering::AcqRel) + 1;
        if failures >= self.max_consecutive_failures && !self.open.load(Ordering::Acquire) {
            self.trip();
            return true;
        }
        false
    }

    /// Decides whether a call may proceed right now.
    ///
    /// Closed: always. Open: only once the cooldown has elapsed, and
    /// then only for a single probe at a time; the winning caller gets
    /// `true` and every concurrent caller keeps failing fast until the
    /// probe settles via `record_success` / `record_failure`.
    pub fn admit(&self) -> bool {
        if !self.open.load(Ordering::Acquire) {
            return true;
        }
        if !self.cooldown_elapsed() {
            return false;
        }
        self.half_open
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Time left before an open breaker will admit a probe.
    pub fn cooldown_remaining(&self) -> Option<Duration> {
        if !self.open.load(Ordering::Acquire) {
            return None;
        }
        let elapsed_ms = Utc::now().timestamp_millis() - self.opened_at_ms.load(Ordering::Acquire);
        let cooldown_ms = self.cooldown.as_millis() as i64;
        Some(Duration::from_millis(
            (cooldown_ms - elapsed_ms).max(0) as u64
        ))
    }

    fn trip(&self) {
        self.open.store(true, Ordering::Release);
        self.opened_at_ms
            .store(Utc::now().timestamp_millis(), Ordering::Release);
    }

    fn cooldown_elapsed(&self) -> bool {
        let elapsed_ms = Utc::now().timestamp_millis() - self.opened_at_ms.load(Ordering::Acquire);
        elapsed_ms >= self.cooldown.as_millis() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stays_closed_below_the_failure_threshold() {
        let breaker = CircuitBreaker::new(3, Duration::from_secs(60));
        assert!(!breaker.record_failure());
        assert!(!breaker.record_failure());
        assert_eq!(breaker.state(), BreakerState::Closed);
        assert!(breaker.admit());
    }

    #[test]
    fn opens_after_consecutive_failures() {
        let breaker = CircuitBreaker::new(3, Duration::from_secs(60));
        breaker.record_failure();
        breaker.record_failure();
        assert!(breaker.record_failure());
        assert_eq!(breaker.state(), BreakerState::Open);
        assert!(!breaker.admit());
    }

    #[test]
    fn success_resets_the_failure_count() {
        let breaker = CircuitBreaker::new(3, Duration::from_secs(60));
        breaker.record_failure();
        breaker.record_failure();
        breaker.record_success();
        assert_eq!(breaker.failure_count(), 0);
        assert!(!breaker.record_failure());
        assert_eq!(breaker.state(), BreakerState::Closed);
    }

    #[test]
    fn admits_a_single_probe_after_cooldown() {
        let breaker = CircuitBreaker::new(1, Duration::from_millis(10));
        breaker.record_failure();
        assert!(!breaker.admit());

        std::thread::sleep(Duration::from_millis(15));
        assert!(breaker.admit());
        assert_eq!(breaker.state(), BreakerState::HalfOpen);
        // A second caller is still refused while the probe is in flight.
        assert!(!breaker.admit());
    }

    #[test]
    fn successful_probe_closes_the_breaker() {
        let breaker = CircuitBreaker::new(1, Duration::from_millis(10));
        breaker.record_failure();
        std::thread::sleep(Duration::from_millis(15));
        assert!(breaker.admit());

        breaker.record_success();
        assert_eq!(breaker.state(), BreakerState::Closed);
        assert!(breaker.admit());
    }

    #[test]
    fn failed_probe_reopens_for_another_cooldown() {
        let breaker = CircuitBreaker::new(1, Duration::from_millis(10));
        breaker.record_failure();
        std::thread::sleep(Duration::from_millis(15));
        assert!(breaker.admit());

        assert!(breaker.record_failure());
        assert_eq!(breaker.state(), BreakerState::Open);
        assert!(!breaker.admit());
    }

    #[test]
    fn cooldown_remaining_reports_only_while_open() {
        let breaker = CircuitBreaker::new(1, Duration::from_secs(300));
        assert!(breaker.cooldown_remaining().is_none());

        breaker.record_failure();
        let remaining = breaker.cooldown_remaining().unwrap();
        assert!(remaining > Duration::from_secs(290));
    }
}
