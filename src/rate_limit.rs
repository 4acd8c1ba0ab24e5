//! Rate limiting primitives.
//!
//! This module provides the building blocks for keyed rate limiting:
//! - [`RateLimiter`]: The core trait for rate limiting logic.
//! - [`RateLimitConfig`]: Window length and request budget, supplied per call.
//! - [`Decision`]: The result of a rate limit check (Allowed/Denied).
//!
//! # Architecture
//!
//! - **Logic**: [`SlidingWindow`] (in `strategies`) looks back exactly
//!   `window_ms` from every call, so bursts cannot exploit window resets.
//! - **Storage**: [`TimestampStore`] (in `store`) owns the per-key timestamp
//!   sequences and performs prune-then-append atomically per key.
//! - **Middleware**: [`RateLimitLayer`] gates a `tower::Service` (e.g. a form
//!   submission) with any `RateLimiter`.
//!
//! Denial is an expected outcome, not an error: `check` returns a value and
//! never fails.

use std::time::Duration;

pub mod middleware;
pub mod store;
pub mod strategies;
pub use middleware::{RateLimitLayer, RateLimitService};
pub use store::{Admission, InMemoryTimestampStore, ShardedTimestampStore, TimestampStore};
pub use strategies::SlidingWindow;

/// Errors produced when validating rate-limit configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RateLimitConfigError {
    /// Window must be > 0 ms.
    #[error("window_ms must be > 0 (got {0})")]
    InvalidWindow(u64),
    /// Request budget must be > 0.
    #[error("max_requests must be > 0 (got {0})")]
    InvalidMaxRequests(u32),
}

/// Validated sliding-window parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(rename_all = "camelCase", try_from = "RateLimitConfigRepr")
)]
pub struct RateLimitConfig {
    window_ms: u64,
    max_requests: u32,
}

impl RateLimitConfig {
    /// Create a config with validation.
    ///
    /// # Examples
    /// ```
    /// use roi_estimator::RateLimitConfig;
    /// let cfg = RateLimitConfig::new(1_000, 3).unwrap();
    /// assert_eq!(cfg.max_requests(), 3);
    /// ```
    pub fn new(window_ms: u64, max_requests: u32) -> Result<Self, RateLimitConfigError> {
        if window_ms == 0 {
            return Err(RateLimitConfigError::InvalidWindow(window_ms));
        }
        if max_requests == 0 {
            return Err(RateLimitConfigError::InvalidMaxRequests(max_requests));
        }
        Ok(Self { window_ms, max_requests })
    }

    // Callers guarantee both values are non-zero.
    pub(crate) const fn fixed(window_ms: u64, max_requests: u32) -> Self {
        Self { window_ms, max_requests }
    }

    /// Create a config from a `Duration` window (saturating at `u64::MAX` ms).
    pub fn from_window(window: Duration, max_requests: u32) -> Result<Self, RateLimitConfigError> {
        Self::new(u64::try_from(window.as_millis()).unwrap_or(u64::MAX), max_requests)
    }

    /// Lookback window in milliseconds.
    pub fn window_ms(&self) -> u64 {
        self.window_ms
    }

    /// Lookback window as a `Duration`.
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    /// Requests allowed per window.
    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct RateLimitConfigRepr {
    window_ms: u64,
    max_requests: u32,
}

#[cfg(feature = "serde")]
impl TryFrom<RateLimitConfigRepr> for RateLimitConfig {
    type Error = RateLimitConfigError;

    fn try_from(repr: RateLimitConfigRepr) -> Result<Self, Self::Error> {
        RateLimitConfig::new(repr.window_ms, repr.max_requests)
    }
}

/// The decision returned by a rate limiter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// The request is allowed to proceed and was recorded.
    Allowed {
        /// Requests still available in the current window after this one.
        remaining: u32,
    },
    /// The request is denied and was not recorded.
    Denied {
        /// How long until the oldest recorded request leaves the window.
        wait: Duration,
        /// Requests currently counted in the window.
        in_window: u32,
    },
}

impl Decision {
    /// Helper to check if allowed.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed { .. })
    }

    /// Suggested wait before retrying; zero when allowed.
    pub fn wait(&self) -> Duration {
        match self {
            Decision::Allowed { .. } => Duration::ZERO,
            Decision::Denied { wait, .. } => *wait,
        }
    }
}

/// Core interface for keyed rate limiting.
///
/// Implementations must make the check-and-record step atomic per key, so the
/// number of recorded requests in any window never exceeds `max_requests`.
pub trait RateLimiter: Send + Sync {
    /// Check `key` against `config`, recording the request if it is allowed.
    fn check(&self, key: &str, config: &RateLimitConfig) -> Decision;

    /// `true` if the request is allowed (and recorded).
    fn is_allowed(&self, key: &str, config: &RateLimitConfig) -> bool {
        self.check(key, config).is_allowed()
    }
}

impl<L: RateLimiter + ?Sized> RateLimiter for std::sync::Arc<L> {
    fn check(&self, key: &str, config: &RateLimitConfig) -> Decision {
        (**self).check(key, config)
    }
}
