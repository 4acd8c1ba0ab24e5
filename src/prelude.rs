//! Convenient re-exports for common estimator types.
pub use crate::{
    calculator::{calculate, Calculator, EstimateAssumptions, EstimateResult, Payback},
    clock::{Clock, ManualClock, MonotonicClock},
    error::{FieldError, GateError, RateLimited},
    fields::{validate_all, validate_field, BoundsTable, FieldBounds, FieldName},
    inputs::EstimateInputs,
    presets,
    rate_limit::{
        Decision, InMemoryTimestampStore, RateLimitConfig, RateLimitLayer, RateLimiter,
        ShardedTimestampStore, SlidingWindow,
    },
    session::EstimateSession,
};
