// Sliding window request quota: a request is admitted only while fewer than
// `quota` accepted timestamps are younger than `window`

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::errors::{Error, RateLimitOrigin, Result};

// Source of the current time for the limiter
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

// Simulated clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    start: Instant,
    elapsed: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            elapsed: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut elapsed = self.elapsed.lock().unwrap_or_else(PoisonError::into_inner);
        *elapsed += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.start + *self.elapsed.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// Accepted request timestamps, oldest first
#[derive(Debug, Default)]
pub struct RateWindow {
    accepted: VecDeque<Instant>,
}

impl RateWindow {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_capacity(capacity: usize) -> Self {
        Self {
            accepted: VecDeque::with_capacity(capacity),
        }
    }

    // Drop every timestamp that is at least `window` old
    fn evict(&mut self, now: Instant, window: Duration) {
        while let Some(&oldest) = self.accepted.front() {
            if now.saturating_duration_since(oldest) < window {
                break;
            }
            self.accepted.pop_front();
        }
    }

    pub fn try_admit(&mut self, now: Instant, quota: usize, window: Duration) -> Result<()> {
        self.evict(now, window);

        if self.accepted.len() >= quota {
            return Err(Error::RateLimitExceeded {
                origin: RateLimitOrigin::Client { quota, window },
            });
        }

        self.accepted.push_back(now);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.accepted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty()
    }
}

pub struct RateLimiter {
    quota: usize,             // Max accepted requests per window
    window: Duration,         // Length of the rolling window
    clock: Arc<dyn Clock>,
    state: Mutex<RateWindow>, // Check and record happen under one lock
}

impl RateLimiter {
    pub fn new(quota: usize, window: Duration) -> Self {
        Self::with_clock(quota, window, Arc::new(SystemClock))
    }

    pub fn with_clock(quota: usize, window: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            quota,
            window,
            clock,
            state: Mutex::new(RateWindow::with_capacity(quota.min(1024))),
        }
    }

    // Admits one request or rejects it immediately, never waits for room
    pub fn try_admit(&self) -> Result<()> {
        let now = self.clock.now();
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        match state.try_admit(now, self.quota, self.window) {
            Ok(()) => {
                debug!(in_window = state.len(), quota = self.quota, "request admitted");
                Ok(())
            }
            Err(err) => {
                warn!(quota = self.quota, window = ?self.window, "client-side quota exhausted");
                Err(err)
            }
        }
    }

    // Requests still counting against the quota right now
    pub fn in_flight(&self) -> usize {
        let now = self.clock.now();
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.evict(now, self.window);
        state.len()
    }

    pub fn quota(&self) -> usize {
        self.quota
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn limiter(quota: usize, window: Duration) -> (RateLimiter, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        (RateLimiter::with_clock(quota, window, clock.clone()), clock)
    }

    #[test]
    fn rejects_the_request_after_a_full_window() {
        let (limiter, clock) = limiter(100, Duration::from_secs(60));

        for _ in 0..100 {
            limiter.try_admit().unwrap();
            clock.advance(Duration::from_millis(100));
        }

        let err = limiter.try_admit().unwrap_err();
        assert!(matches!(
            err,
            Error::RateLimitExceeded { origin: RateLimitOrigin::Client { quota: 100, .. } }
        ));

        clock.advance(Duration::from_secs(61));
        limiter.try_admit().unwrap();
        assert_eq!(limiter.in_flight(), 1);
    }

    #[test]
    fn rejected_attempts_are_not_recorded() {
        let window = Duration::from_secs(10);
        let (limiter, clock) = limiter(2, window);

        limiter.try_admit().unwrap();
        limiter.try_admit().unwrap();
        for _ in 0..5 {
            assert!(limiter.try_admit().is_err());
        }
        assert_eq!(limiter.in_flight(), 2);

        clock.advance(window);
        assert_eq!(limiter.in_flight(), 0);
        limiter.try_admit().unwrap();
        limiter.try_admit().unwrap();
    }

    #[test]
    fn timestamp_exactly_one_window_old_is_expired() {
        let window = Duration::from_secs(60);
        let mut rate_window = RateWindow::new();
        let start = Instant::now();

        rate_window.try_admit(start, 1, window).unwrap();

        let almost = start + window - Duration::from_millis(1);
        assert!(rate_window.try_admit(almost, 1, window).is_err());

        rate_window.try_admit(start + window, 1, window).unwrap();
        assert_eq!(rate_window.len(), 1);
    }

    #[test]
    fn zero_quota_rejects_everything() {
        let (limiter, _clock) = limiter(0, Duration::from_secs(1));
        assert!(limiter.try_admit().unwrap_err().is_rate_limited());
    }

    #[test]
    fn concurrent_admissions_never_exceed_quota() {
        let limiter = Arc::new(RateLimiter::with_clock(
            50,
            Duration::from_secs(60),
            Arc::new(ManualClock::new()),
        ));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = limiter.clone();
                std::thread::spawn(move || (0..20).filter(|_| limiter.try_admit().is_ok()).count())
            })
            .collect();

        let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(admitted, 50);
    }

    proptest! {
        #[test]
        fn trailing_window_never_holds_more_than_quota(
            quota in 1usize..8,
            steps in prop::collection::vec(0u64..700, 1..200),
        ) {
            let window = Duration::from_millis(1_000);
            let (limiter, clock) = limiter(quota, window);
            let mut accepted: Vec<Instant> = Vec::new();

            for step in steps {
                clock.advance(Duration::from_millis(step));
                if limiter.try_admit().is_ok() {
                    accepted.push(clock.now());
                }
            }

            for &at in &accepted {
                let in_window = accepted
                    .iter()
                    .filter(|&&t| t <= at && at.saturating_duration_since(t) < window)
                    .count();
                prop_assert!(in_window <= quota);
            }
        }
    }
}
