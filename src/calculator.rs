//! Deterministic cost, savings and payback estimation.
//!
//! The calculator never computes from a partially invalid input set: callers
//! pass `has_validation_errors` and get a zeroed, `is_valid == false` result
//! back whenever it is set.

use crate::inputs::EstimateInputs;

/// Share of current labor cost removed by the platform.
pub const EFFICIENCY_GAIN: f64 = 0.40;
/// Approximate weeks per month (365.25 / 12 / 7).
pub const WEEKS_PER_MONTH: f64 = 4.33;
/// Assumed hours spent per audit.
pub const HOURS_PER_AUDIT: f64 = 2.0;
/// Yearly platform price in currency units.
pub const ANNUAL_PLATFORM_COST: f64 = 1440.0;
/// Weeks used to annualise weekly savings.
pub const WEEKS_PER_YEAR: f64 = 52.0;
/// Minutes per hour.
pub const MINUTES_PER_HOUR: f64 = 60.0;
/// Payback is never reported below this many months.
pub const MIN_PAYBACK_MONTHS: u64 = 1;

const WEEKS_PER_MONTH_RANGE: std::ops::RangeInclusive<f64> = 1.0..=6.0;
const MAX_HOURS_PER_AUDIT: f64 = 168.0;
const MAX_ANNUAL_PLATFORM_COST: f64 = 1e9;
// 2^53: above this an `f64` no longer holds every whole unit.
const MAX_UNITS: f64 = 9_007_199_254_740_992.0;

/// Errors produced when validating estimate assumptions.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AssumptionsError {
    /// Efficiency gain must be within `[0, 1]`.
    #[error("efficiency_gain must be within [0, 1] (got {0})")]
    InvalidEfficiencyGain(f64),
    /// Weeks per month must be within `[1, 6]`.
    #[error("weeks_per_month must be within [1, 6] (got {0})")]
    InvalidWeeksPerMonth(f64),
    /// Hours per audit must be within `[0, 168]`.
    #[error("hours_per_audit must be within [0, 168] (got {0})")]
    InvalidHoursPerAudit(f64),
    /// Platform cost must be within `[0, 1e9]`.
    #[error("annual_platform_cost must be within [0, 1e9] (got {0})")]
    InvalidPlatformCost(f64),
}

/// Business constants the estimate is derived from.
///
/// `Default` carries the reference configuration; use
/// [`EstimateAssumptions::builder`] to override individual values.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(rename_all = "camelCase", try_from = "AssumptionsRepr")
)]
pub struct EstimateAssumptions {
    efficiency_gain: f64,
    weeks_per_month: f64,
    hours_per_audit: f64,
    annual_platform_cost: f64,
}

impl Default for EstimateAssumptions {
    fn default() -> Self {
        Self {
            efficiency_gain: EFFICIENCY_GAIN,
            weeks_per_month: WEEKS_PER_MONTH,
            hours_per_audit: HOURS_PER_AUDIT,
            annual_platform_cost: ANNUAL_PLATFORM_COST,
        }
    }
}

impl EstimateAssumptions {
    /// Start from the defaults and override what you need.
    pub fn builder() -> EstimateAssumptionsBuilder {
        EstimateAssumptionsBuilder { inner: Self::default() }
    }

    /// Fraction of cost removed, in `[0, 1]`.
    pub fn efficiency_gain(&self) -> f64 {
        self.efficiency_gain
    }

    /// Weeks per month used for audit and payback conversions.
    pub fn weeks_per_month(&self) -> f64 {
        self.weeks_per_month
    }

    /// Hours charged per audit.
    pub fn hours_per_audit(&self) -> f64 {
        self.hours_per_audit
    }

    /// Yearly platform price.
    pub fn annual_platform_cost(&self) -> f64 {
        self.annual_platform_cost
    }

    fn validate(&self) -> Result<(), AssumptionsError> {
        let gain = self.efficiency_gain;
        if !(0.0..=1.0).contains(&gain) {
            return Err(AssumptionsError::InvalidEfficiencyGain(gain));
        }
        if !WEEKS_PER_MONTH_RANGE.contains(&self.weeks_per_month) {
            return Err(AssumptionsError::InvalidWeeksPerMonth(self.weeks_per_month));
        }
        if !(0.0..=MAX_HOURS_PER_AUDIT).contains(&self.hours_per_audit) {
            return Err(AssumptionsError::InvalidHoursPerAudit(self.hours_per_audit));
        }
        if !(0.0..=MAX_ANNUAL_PLATFORM_COST).contains(&self.annual_platform_cost) {
            return Err(AssumptionsError::InvalidPlatformCost(self.annual_platform_cost));
        }
        Ok(())
    }
}

/// Builder for [`EstimateAssumptions`].
#[derive(Debug, Clone)]
pub struct EstimateAssumptionsBuilder {
    inner: EstimateAssumptions,
}

impl EstimateAssumptionsBuilder {
    /// Override the efficiency gain.
    pub fn efficiency_gain(mut self, gain: f64) -> Self {
        self.inner.efficiency_gain = gain;
        self
    }

    /// Override weeks per month.
    pub fn weeks_per_month(mut self, weeks: f64) -> Self {
        self.inner.weeks_per_month = weeks;
        self
    }

    /// Override hours per audit.
    pub fn hours_per_audit(mut self, hours: f64) -> Self {
        self.inner.hours_per_audit = hours;
        self
    }

    /// Override the annual platform cost.
    pub fn annual_platform_cost(mut self, cost: f64) -> Self {
        self.inner.annual_platform_cost = cost;
        self
    }

    /// Validate and build.
    pub fn build(self) -> Result<EstimateAssumptions, AssumptionsError> {
        self.inner.validate()?;
        Ok(self.inner)
    }
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct AssumptionsRepr {
    efficiency_gain: f64,
    weeks_per_month: f64,
    hours_per_audit: f64,
    annual_platform_cost: f64,
}

#[cfg(feature = "serde")]
impl Default for AssumptionsRepr {
    fn default() -> Self {
        let d = EstimateAssumptions::default();
        Self {
            efficiency_gain: d.efficiency_gain,
            weeks_per_month: d.weeks_per_month,
            hours_per_audit: d.hours_per_audit,
            annual_platform_cost: d.annual_platform_cost,
        }
    }
}

#[cfg(feature = "serde")]
impl TryFrom<AssumptionsRepr> for EstimateAssumptions {
    type Error = AssumptionsError;

    fn try_from(repr: AssumptionsRepr) -> Result<Self, Self::Error> {
        EstimateAssumptions::builder()
            .efficiency_gain(repr.efficiency_gain)
            .weeks_per_month(repr.weeks_per_month)
            .hours_per_audit(repr.hours_per_audit)
            .annual_platform_cost(repr.annual_platform_cost)
            .build()
    }
}

/// Months until savings cover the platform cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum Payback {
    /// Whole months, at least [`MIN_PAYBACK_MONTHS`].
    Months(u64),
    /// Weekly savings are zero (or the inputs were invalid), so there is no payback.
    NotComputable,
}

/// Output of one estimate. Derived from an input snapshot and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct EstimateResult {
    /// Current weekly labor cost.
    pub current_weekly_cost: u64,
    /// Weekly cost after the efficiency gain; never above `current_weekly_cost`.
    pub improved_weekly_cost: u64,
    /// `(current - improved) * 52`.
    pub annual_savings: u64,
    /// Payback period.
    pub payback: Payback,
    /// `false` when the inputs failed validation; do not display the numbers.
    pub is_valid: bool,
}

impl EstimateResult {
    /// The fail-closed result: every number zero, `is_valid == false`.
    pub const fn invalid() -> Self {
        Self {
            current_weekly_cost: 0,
            improved_weekly_cost: 0,
            annual_savings: 0,
            payback: Payback::NotComputable,
            is_valid: false,
        }
    }

    /// `current - improved`, or `0` if a hand-built result has them inverted.
    pub fn weekly_savings(&self) -> u64 {
        self.current_weekly_cost.saturating_sub(self.improved_weekly_cost)
    }

    /// Payback in months, or `0` when not computable.
    pub fn payback_months(&self) -> u64 {
        match self.payback {
            Payback::Months(months) => months,
            Payback::NotComputable => 0,
        }
    }
}

/// Estimate calculator bound to a set of assumptions.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Calculator {
    assumptions: EstimateAssumptions,
}

impl Calculator {
    /// Calculator using custom assumptions.
    pub fn new(assumptions: EstimateAssumptions) -> Self {
        Self { assumptions }
    }

    /// Assumptions in use.
    pub fn assumptions(&self) -> &EstimateAssumptions {
        &self.assumptions
    }

    /// Derive an estimate. Returns [`EstimateResult::invalid`] when
    /// `has_validation_errors` is set, without looking at `inputs`, and also
    /// when any amount is negative, non-finite or too large to hold exactly.
    pub fn calculate(&self, inputs: &EstimateInputs, has_validation_errors: bool) -> EstimateResult {
        if has_validation_errors {
            tracing::debug!("inputs failed validation; returning zeroed estimate");
            return EstimateResult::invalid();
        }
        let a = &self.assumptions;

        let hours_per_task = inputs.time_per_task / MINUTES_PER_HOUR;
        let weekly_task_hours = inputs.tasks_per_week * hours_per_task;
        let weekly_audit_hours = (inputs.audit_frequency / a.weeks_per_month) * a.hours_per_audit;
        let weekly_cost = (weekly_task_hours + weekly_audit_hours) * inputs.current_cost_per_hour;
        let Some(current) = to_units(weekly_cost) else {
            tracing::debug!(weekly_cost, "weekly cost out of range; returning zeroed estimate");
            return EstimateResult::invalid();
        };
        let improved = to_units(current as f64 * (1.0 - a.efficiency_gain))
            .map_or(current, |improved| improved.min(current));
        let weekly_savings = current - improved;
        let Some(annual_savings) = to_units(weekly_savings as f64 * WEEKS_PER_YEAR) else {
            tracing::debug!(weekly_savings, "annual savings out of range; returning zeroed estimate");
            return EstimateResult::invalid();
        };

        let payback = if weekly_savings == 0 {
            Payback::NotComputable
        } else {
            let raw = a.annual_platform_cost / (weekly_savings as f64 * a.weeks_per_month);
            to_units(raw).map_or(Payback::NotComputable, |months| {
                Payback::Months(months.max(MIN_PAYBACK_MONTHS))
            })
        };

        let result = EstimateResult {
            current_weekly_cost: current,
            improved_weekly_cost: improved,
            annual_savings,
            payback,
            is_valid: true,
        };
        tracing::trace!(?result, "estimate computed");
        result
    }
}

/// Derive an estimate with the default assumptions.
pub fn calculate(inputs: &EstimateInputs, has_validation_errors: bool) -> EstimateResult {
    Calculator::default().calculate(inputs, has_validation_errors)
}

/// Round half away from zero to whole units; `None` outside `[0, 2^53]` or when not finite.
fn to_units(value: f64) -> Option<u64> {
    let rounded = value.round();
    (0.0..=MAX_UNITS).contains(&rounded).then_some(rounded as u64)
}
