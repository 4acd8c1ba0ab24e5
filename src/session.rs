//! Field-by-field estimate editing.
//!
//! An [`EstimateSession`] owns the mutable input snapshot a form edits. Each
//! edit re-validates only the changed field and marks the cached estimate
//! stale; the estimate is recomputed the next time it is asked for.

use crate::calculator::{Calculator, EstimateResult};
use crate::error::{FieldError, RateLimited};
use crate::fields::{BoundsTable, FieldName};
use crate::inputs::EstimateInputs;
use crate::rate_limit::{Decision, RateLimitConfig, RateLimiter};
use std::collections::BTreeMap;

/// Mutable estimate state for one form.
#[derive(Debug, Clone)]
pub struct EstimateSession {
    inputs: EstimateInputs,
    errors: BTreeMap<FieldName, FieldError>,
    bounds: BoundsTable,
    calculator: Calculator,
    cached: Option<EstimateResult>,
}

impl Default for EstimateSession {
    fn default() -> Self {
        Self::new(EstimateInputs::default())
    }
}

impl EstimateSession {
    /// Start a session, validating every field once.
    pub fn new(inputs: EstimateInputs) -> Self {
        Self::with_parts(inputs, BoundsTable::default(), Calculator::default())
    }

    /// Start a session with custom bounds and calculator.
    pub fn with_parts(inputs: EstimateInputs, bounds: BoundsTable, calculator: Calculator) -> Self {
        let errors = bounds.validate_all(&inputs);
        Self { inputs, errors, bounds, calculator, cached: None }
    }

    /// Replace the bounds table, re-validating every field.
    pub fn with_bounds(self, bounds: BoundsTable) -> Self {
        Self::with_parts(self.inputs, bounds, self.calculator)
    }

    /// Replace the calculator, discarding any cached estimate.
    pub fn with_calculator(mut self, calculator: Calculator) -> Self {
        self.calculator = calculator;
        self.cached = None;
        self
    }

    /// Current input snapshot.
    pub fn inputs(&self) -> &EstimateInputs {
        &self.inputs
    }

    /// Failing fields, keyed by field.
    pub fn errors(&self) -> &BTreeMap<FieldName, FieldError> {
        &self.errors
    }

    /// Error for one field, if any.
    pub fn error(&self, field: FieldName) -> Option<&FieldError> {
        self.errors.get(&field)
    }

    /// `true` while any field is out of range.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// `true` when the next [`result`](Self::result) call will recompute.
    pub fn is_stale(&self) -> bool {
        self.cached.is_none()
    }

    /// Write one field, re-validate it, and invalidate the cached estimate.
    ///
    /// Returns the field's error if the new value is out of range.
    pub fn edit(&mut self, field: FieldName, value: f64) -> Option<&FieldError> {
        self.inputs.set(field, value);
        self.cached = None;
        match self.bounds.validate_field(field, value) {
            Some(err) => {
                self.errors.insert(field, err);
                self.errors.get(&field)
            }
            None => {
                self.errors.remove(&field);
                None
            }
        }
    }

    /// Current estimate, recomputed first if any field changed since the last call.
    pub fn result(&mut self) -> EstimateResult {
        if let Some(result) = self.cached {
            return result;
        }
        let result = self.calculator.calculate(&self.inputs, self.has_errors());
        self.cached = Some(result);
        result
    }

    /// Recompute through a rate limiter.
    ///
    /// When `limiter` denies `key`, nothing is recomputed and the cached
    /// estimate is left as it was.
    pub fn recalculate_with<L>(
        &mut self,
        limiter: &L,
        key: &str,
        config: &RateLimitConfig,
    ) -> Result<EstimateResult, RateLimited>
    where
        L: RateLimiter + ?Sized,
    {
        match limiter.check(key, config) {
            Decision::Allowed { .. } => Ok(self.result()),
            Decision::Denied { wait, .. } => Err(RateLimited { key: key.to_string(), wait }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::{EstimateAssumptions, Payback};
    use crate::clock::ManualClock;
    use crate::fields::FieldBounds;
    use crate::rate_limit::{InMemoryTimestampStore, SlidingWindow};

    #[test]
    fn edit_revalidates_only_the_changed_field() {
        let mut session = EstimateSession::default();
        assert!(!session.has_errors());

        let err = session.edit(FieldName::Employees, 0.0).cloned().expect("out of range");
        assert_eq!(err.field, FieldName::Employees);
        assert_eq!(session.errors().len(), 1);

        assert!(session.edit(FieldName::Locations, 3.0).is_none());
        assert!(session.error(FieldName::Employees).is_some());

        assert!(session.edit(FieldName::Employees, 12.0).is_none());
        assert!(!session.has_errors());
    }

    #[test]
    fn result_is_cached_until_an_edit() {
        let mut session = EstimateSession::default();
        assert!(session.is_stale());
        let first = session.result();
        assert!(!session.is_stale());
        assert_eq!(session.result(), first);

        session.edit(FieldName::CurrentCostPerHour, 30.0);
        assert!(session.is_stale());
        let second = session.result();
        assert!(second.current_weekly_cost > first.current_weekly_cost);
    }

    #[test]
    fn invalid_field_forces_fail_closed_result() {
        let mut session = EstimateSession::default();
        session.edit(FieldName::TimePerTask, 1_000.0);
        assert_eq!(session.result(), EstimateResult::invalid());
        session.edit(FieldName::TimePerTask, 30.0);
        assert!(session.result().is_valid);
    }

    #[test]
    fn recalculation_is_gated_by_the_limiter() {
        let clock = ManualClock::new();
        let limiter: SlidingWindow =
            SlidingWindow::new(InMemoryTimestampStore::new()).with_clock(clock.clone());
        let cfg = RateLimitConfig::new(1_000, 1).expect("valid config");
        let mut session = EstimateSession::default();

        let result =
            session.recalculate_with(&limiter, "session-1", &cfg).expect("first call allowed");
        assert!(result.is_valid);

        session.edit(FieldName::TasksPerWeek, 40.0);
        let denied = session.recalculate_with(&limiter, "session-1", &cfg).unwrap_err();
        assert_eq!(denied.key, "session-1");
        assert!(session.is_stale(), "denied recalculation leaves the estimate stale");

        clock.advance(1_000);
        let result = session.recalculate_with(&limiter, "session-1", &cfg).expect("window passed");
        assert!(result.current_weekly_cost > 0);
    }

    #[test]
    fn custom_parts_are_used() {
        let bounds = BoundsTable::default()
            .with_bounds(FieldName::Employees, FieldBounds::new(1, 5).expect("valid bounds"));
        let session = EstimateSession::default().with_bounds(bounds);
        assert!(session.error(FieldName::Employees).is_some());

        let assumptions = EstimateAssumptions::builder().efficiency_gain(0.0).build().expect("valid");
        let mut session = EstimateSession::default().with_calculator(Calculator::new(assumptions));
        let result = session.result();
        assert_eq!(result.annual_savings, 0);
        assert_eq!(result.payback, Payback::NotComputable);
    }
}
