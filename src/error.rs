//! Error taxonomy shared across the estimator and the rate limiter.
//!
//! Expected conditions (an out-of-range field, a rate-limit denial) are plain
//! values here, never panics. Configuration mistakes have their own error types
//! next to the config they validate.
use crate::fields::FieldName;
use std::fmt;
use std::time::Duration;

/// What went wrong with a single field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind"))]
pub enum FieldErrorKind {
    /// Value was non-finite or outside the inclusive `[min, max]` interval.
    OutOfRange {
        /// Inclusive lower bound.
        min: u32,
        /// Inclusive upper bound.
        max: u32,
    },
}

/// A single invalid input field. Recoverable by correcting the value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[error("{field}: {message}")]
pub struct FieldError {
    /// Field the error belongs to.
    pub field: FieldName,
    /// Machine-readable reason.
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub kind: FieldErrorKind,
    /// Static range description, e.g. `Must be between 1 and 100,000`.
    pub message: String,
}

impl FieldError {
    /// Build an out-of-range error for `field` with its range message.
    pub fn out_of_range(field: FieldName, min: u32, max: u32) -> Self {
        Self { field, kind: FieldErrorKind::OutOfRange { min, max }, message: range_message(min, max) }
    }
}

/// Human-readable description of an inclusive range, with grouped thousands.
pub fn range_message(min: u32, max: u32) -> String {
    format!("Must be between {} and {}", group_thousands(min), group_thousands(max))
}

fn group_thousands(value: u32) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// A rate limiter refused an action.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("rate limited for key '{key}'; retry in {wait:?}")]
pub struct RateLimited {
    /// Key that was throttled.
    pub key: String,
    /// Time until the oldest request in the window expires.
    pub wait: Duration,
}

/// Error returned by services wrapped in the rate-limit middleware.
#[derive(Debug, Clone)]
pub enum GateError<E> {
    /// The limiter denied the request; the inner service was not called.
    RateLimited(RateLimited),
    /// The inner service failed.
    Inner(E),
}

impl<E: fmt::Display> fmt::Display for GateError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RateLimited(denied) => write!(f, "{}", denied),
            Self::Inner(e) => write!(f, "{}", e),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for GateError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Inner(e) => Some(e),
            Self::RateLimited(_) => None,
        }
    }
}

impl<E> GateError<E> {
    /// Check if this error is a rate-limit denial.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited(_))
    }
    /// Check if this error wraps an inner error.
    pub fn is_inner(&self) -> bool {
        matches!(self, Self::Inner(_))
    }
    /// Denial details, if this is a rate-limit denial.
    pub fn rate_limited(&self) -> Option<&RateLimited> {
        match self {
            Self::RateLimited(denied) => Some(denied),
            Self::Inner(_) => None,
        }
    }
    /// Borrow the inner error if present.
    pub fn as_inner(&self) -> Option<&E> {
        match self {
            Self::Inner(e) => Some(e),
            Self::RateLimited(_) => None,
        }
    }
    /// Get the inner error if this is an Inner variant.
    pub fn into_inner(self) -> Option<E> {
        match self {
            Self::Inner(e) => Some(e),
            Self::RateLimited(_) => None,
        }
    }
}

impl<E> From<RateLimited> for GateError<E> {
    fn from(denied: RateLimited) -> Self {
        Self::RateLimited(denied)
    }
}
