#![forbid(unsafe_code)]
#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::all))]

//! # roi-estimator
//!
//! Pricing/ROI estimation for restaurant operations: bounded input
//! validation, a deterministic cost and savings calculator, and a keyed
//! sliding-window rate limiter to throttle recomputation or submission.
//!
//! ## Features
//!
//! - **Field validation** against a per-field inclusive bounds table
//! - **Fail-closed estimates**: invalid inputs yield a zeroed, `is_valid == false` result
//! - **Overridable business assumptions** (efficiency gain, platform cost, ...)
//! - **Sliding-window rate limiting** keyed by caller, with single-lock or sharded storage
//! - **Tower middleware** gating any `Service` behind the limiter
//!
//! ## Quick Start
//!
//! ```rust
//! use roi_estimator::{calculate, validate_all, EstimateInputs, FieldName, Payback};
//!
//! let inputs = EstimateInputs::default().with(FieldName::TasksPerWeek, 40.0);
//! let errors = validate_all(&inputs);
//! let estimate = calculate(&inputs, !errors.is_empty());
//!
//! assert!(estimate.is_valid);
//! assert!(estimate.improved_weekly_cost <= estimate.current_weekly_cost);
//! assert!(matches!(estimate.payback, Payback::Months(m) if m >= 1));
//! ```
//!
//! Validation and calculation never touch the limiter; callers compose them:
//!
//! ```rust
//! use roi_estimator::{presets, EstimateSession, FieldName, RateLimiter, SlidingWindow};
//! use roi_estimator::rate_limit::InMemoryTimestampStore;
//!
//! let limiter = SlidingWindow::new(InMemoryTimestampStore::new());
//! let mut session = EstimateSession::default();
//! session.edit(FieldName::Employees, 25.0);
//!
//! if limiter.is_allowed("visitor-42", &presets::recalculation()) {
//!     let estimate = session.result();
//!     assert!(estimate.is_valid);
//! }
//! ```

pub mod calculator;
pub mod clock;
pub mod error;
pub mod fields;
pub mod inputs;
pub mod prelude;
pub mod presets;
pub mod rate_limit;
pub mod session;

// Re-exports
pub use calculator::{
    calculate, AssumptionsError, Calculator, EstimateAssumptions, EstimateResult, Payback,
};
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use error::{FieldError, FieldErrorKind, GateError, RateLimited};
pub use fields::{
    validate_all, validate_field, validate_named, BoundsError, BoundsTable, FieldBounds, FieldName,
    UnknownField,
};
pub use inputs::EstimateInputs;
pub use rate_limit::{
    Decision, RateLimitConfig, RateLimitConfigError, RateLimitLayer, RateLimiter, SlidingWindow,
};
pub use session::EstimateSession;
