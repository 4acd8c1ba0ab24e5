use crate::clock::{Clock, MonotonicClock};
use crate::rate_limit::store::{InMemoryTimestampStore, TimestampStore};
use crate::rate_limit::{Decision, RateLimitConfig, RateLimiter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Calls between full sweeps of idle keys.
pub const DEFAULT_SWEEP_EVERY: u64 = 64;

/// A keyed sliding-window rate limiter.
///
/// Every check looks back exactly `window_ms` from the current time: recorded
/// timestamps at or before `now - window_ms` are dropped, and the request is
/// allowed only if fewer than `max_requests` remain. Denied requests are not
/// recorded.
///
/// Clones share the same store, clock and sweep counter.
#[derive(Debug)]
pub struct SlidingWindow<S = InMemoryTimestampStore> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    sweep_every: u64,
    calls: Arc<AtomicU64>,
}

impl<S> Clone for SlidingWindow<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            clock: self.clock.clone(),
            sweep_every: self.sweep_every,
            calls: self.calls.clone(),
        }
    }
}

impl Default for SlidingWindow<InMemoryTimestampStore> {
    fn default() -> Self {
        Self::new(InMemoryTimestampStore::new())
    }
}

impl<S> SlidingWindow<S>
where
    S: TimestampStore + 'static,
{
    /// Create a limiter backed by `store`, using a monotonic clock.
    ///
    /// # Examples
    /// ```
    /// use roi_estimator::{RateLimitConfig, RateLimiter, SlidingWindow};
    /// use roi_estimator::rate_limit::InMemoryTimestampStore;
    ///
    /// let limiter = SlidingWindow::new(InMemoryTimestampStore::new());
    /// let cfg = RateLimitConfig::new(60_000, 1).unwrap();
    /// assert!(limiter.is_allowed("contact-form", &cfg));
    /// assert!(!limiter.is_allowed("contact-form", &cfg));
    /// ```
    pub fn new(store: S) -> Self {
        Self {
            store: Arc::new(store),
            clock: Arc::new(MonotonicClock::default()),
            sweep_every: DEFAULT_SWEEP_EVERY,
            calls: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Override the clock (useful for deterministic tests).
    pub fn with_clock<C: Clock + 'static>(mut self, clock: C) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Sweep idle keys every `calls` checks; `0` disables periodic sweeping.
    pub fn with_sweep_every(mut self, calls: u64) -> Self {
        self.sweep_every = calls;
        self
    }

    /// Backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Drop every key with nothing left inside its window. Returns the number removed.
    pub fn sweep(&self) -> usize {
        let removed = self.store.sweep(self.clock.now_millis());
        tracing::trace!(removed, "swept idle rate-limit keys");
        removed
    }

    fn maybe_sweep(&self) {
        if self.sweep_every == 0 {
            return;
        }
        let calls = self.calls.fetch_add(1, Ordering::Relaxed) + 1;
        if calls % self.sweep_every == 0 {
            self.sweep();
        }
    }
}

impl<S> RateLimiter for SlidingWindow<S>
where
    S: TimestampStore + 'static,
{
    fn check(&self, key: &str, config: &RateLimitConfig) -> Decision {
        let now = self.clock.now_millis();
        let window_ms = config.window_ms();
        let max_requests = config.max_requests();
        let admission = self.store.admit(key, now, window_ms, max_requests as usize);
        self.maybe_sweep();

        let in_window = u32::try_from(admission.in_window).unwrap_or(u32::MAX);
        if admission.allowed {
            return Decision::Allowed { remaining: max_requests.saturating_sub(in_window) };
        }

        let wait_ms = admission
            .oldest
            .map_or(window_ms, |oldest| oldest.saturating_add(window_ms).saturating_sub(now));
        tracing::debug!(key, in_window, wait_ms, "rate limit denied");
        Decision::Denied { wait: Duration::from_millis(wait_ms), in_window }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn limiter(clock: &ManualClock) -> SlidingWindow {
        SlidingWindow::<InMemoryTimestampStore>::default().with_clock(clock.clone())
    }

    #[test]
    fn allows_up_to_max_then_denies() {
        let clock = ManualClock::new();
        let limiter = limiter(&clock);
        let cfg = RateLimitConfig::new(1_000, 3).expect("valid config");

        assert_eq!(limiter.check("k", &cfg), Decision::Allowed { remaining: 2 });
        clock.advance(100);
        assert_eq!(limiter.check("k", &cfg), Decision::Allowed { remaining: 1 });
        clock.advance(100);
        assert_eq!(limiter.check("k", &cfg), Decision::Allowed { remaining: 0 });
        clock.advance(100);
        assert_eq!(
            limiter.check("k", &cfg),
            Decision::Denied { wait: Duration::from_millis(700), in_window: 3 }
        );
    }

    #[test]
    fn window_slides_one_request_at_a_time() {
        let clock = ManualClock::new();
        let limiter = limiter(&clock);
        let cfg = RateLimitConfig::new(1_000, 2).expect("valid config");

        assert!(limiter.is_allowed("k", &cfg)); // t=0
        clock.advance(600);
        assert!(limiter.is_allowed("k", &cfg)); // t=600
        clock.advance(399);
        assert!(!limiter.is_allowed("k", &cfg)); // t=999, both still inside
        clock.advance(1);
        assert!(limiter.is_allowed("k", &cfg)); // t=1000, t=0 expired
        assert!(!limiter.is_allowed("k", &cfg));
        assert_eq!(limiter.store().recorded("k"), 2);
    }

    #[test]
    fn denied_requests_are_not_recorded() {
        let clock = ManualClock::new();
        let limiter = limiter(&clock);
        let cfg = RateLimitConfig::new(100, 1).expect("valid config");
        assert!(limiter.is_allowed("k", &cfg));
        for _ in 0..10 {
            clock.advance(5);
            assert!(!limiter.is_allowed("k", &cfg));
        }
        assert_eq!(limiter.store().recorded("k"), 1);
        clock.advance(50);
        assert!(limiter.is_allowed("k", &cfg));
    }

    #[test]
    fn periodic_sweep_drops_idle_keys() {
        let clock = ManualClock::new();
        let limiter = limiter(&clock).with_sweep_every(2);
        let cfg = RateLimitConfig::new(100, 5).expect("valid config");

        limiter.check("idle", &cfg);
        clock.advance(500);
        limiter.check("busy", &cfg); // second call triggers a sweep
        assert_eq!(limiter.store().tracked_keys(), 1);
        assert_eq!(limiter.store().recorded("idle"), 0);
    }

    #[test]
    fn sweeping_can_be_disabled() {
        let clock = ManualClock::new();
        let limiter = limiter(&clock).with_sweep_every(0);
        let cfg = RateLimitConfig::new(100, 5).expect("valid config");
        for i in 0..200 {
            limiter.check(&format!("k{i}"), &cfg);
            clock.advance(1_000);
        }
        assert_eq!(limiter.store().tracked_keys(), 200);
        assert_eq!(limiter.sweep(), 200);
    }

    #[test]
    fn clones_share_state() {
        let clock = ManualClock::new();
        let limiter = limiter(&clock);
        let twin = limiter.clone();
        let cfg = RateLimitConfig::new(1_000, 1).expect("valid config");
        assert!(limiter.is_allowed("k", &cfg));
        assert!(!twin.is_allowed("k", &cfg));
    }
}
