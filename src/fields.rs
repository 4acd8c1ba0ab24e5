//! Field validation against a static bounds table.
//!
//! Every estimate input has an inclusive `[min, max]` interval. Validation is
//! pure: the same field and value always produce an equal result.

use crate::error::FieldError;
use crate::inputs::EstimateInputs;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The six estimate inputs. Ordering follows declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum FieldName {
    /// Headcount.
    Employees,
    /// Site count.
    Locations,
    /// Labor rate in currency units per hour.
    CurrentCostPerHour,
    /// Recurring task volume per week.
    TasksPerWeek,
    /// Minutes spent per task.
    TimePerTask,
    /// Audits per month.
    AuditFrequency,
}

impl FieldName {
    /// All fields, in declaration order.
    pub const ALL: [FieldName; 6] = [
        FieldName::Employees,
        FieldName::Locations,
        FieldName::CurrentCostPerHour,
        FieldName::TasksPerWeek,
        FieldName::TimePerTask,
        FieldName::AuditFrequency,
    ];

    /// Wire name used by form layers (`currentCostPerHour`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            FieldName::Employees => "employees",
            FieldName::Locations => "locations",
            FieldName::CurrentCostPerHour => "currentCostPerHour",
            FieldName::TasksPerWeek => "tasksPerWeek",
            FieldName::TimePerTask => "timePerTask",
            FieldName::AuditFrequency => "auditFrequency",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A field name that is not one of the six estimate inputs.
///
/// This is a programmer error: callers should surface it loudly rather than
/// treat the value as valid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown estimate field '{0}'")]
pub struct UnknownField(pub String);

impl FromStr for FieldName {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldName::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| UnknownField(s.to_string()))
    }
}

/// Errors produced when building a bounds entry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoundsError {
    /// `min` must not exceed `max`.
    #[error("bounds min must be <= max (got min {min}, max {max})")]
    Inverted {
        /// Lower bound provided by caller.
        min: u32,
        /// Upper bound provided by caller.
        max: u32,
    },
}

/// Inclusive bounds for one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldBounds {
    min: u32,
    max: u32,
}

impl FieldBounds {
    /// Create bounds, rejecting `min > max`.
    pub fn new(min: u32, max: u32) -> Result<Self, BoundsError> {
        if min > max {
            return Err(BoundsError::Inverted { min, max });
        }
        Ok(Self { min, max })
    }

    const fn fixed(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    /// Inclusive lower bound.
    pub fn min(&self) -> u32 {
        self.min
    }

    /// Inclusive upper bound.
    pub fn max(&self) -> u32 {
        self.max
    }

    /// `true` iff `value` is finite and within `[min, max]`.
    pub fn contains(&self, value: f64) -> bool {
        value.is_finite() && value >= f64::from(self.min) && value <= f64::from(self.max)
    }
}

/// Default bounds for `employees`.
pub const EMPLOYEES_BOUNDS: FieldBounds = FieldBounds::fixed(1, 100_000);
/// Default bounds for `locations`.
pub const LOCATIONS_BOUNDS: FieldBounds = FieldBounds::fixed(1, 10_000);
/// Default bounds for `currentCostPerHour`.
pub const COST_PER_HOUR_BOUNDS: FieldBounds = FieldBounds::fixed(1, 1_000);
/// Default bounds for `tasksPerWeek`.
pub const TASKS_PER_WEEK_BOUNDS: FieldBounds = FieldBounds::fixed(1, 10_000);
/// Default bounds for `timePerTask` (minutes).
pub const TIME_PER_TASK_BOUNDS: FieldBounds = FieldBounds::fixed(1, 480);
/// Default bounds for `auditFrequency`.
pub const AUDIT_FREQUENCY_BOUNDS: FieldBounds = FieldBounds::fixed(0, 100);

/// Per-field bounds, one entry per [`FieldName`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundsTable {
    entries: [FieldBounds; 6],
}

impl Default for BoundsTable {
    fn default() -> Self {
        Self {
            entries: [
                EMPLOYEES_BOUNDS,
                LOCATIONS_BOUNDS,
                COST_PER_HOUR_BOUNDS,
                TASKS_PER_WEEK_BOUNDS,
                TIME_PER_TASK_BOUNDS,
                AUDIT_FREQUENCY_BOUNDS,
            ],
        }
    }
}

impl BoundsTable {
    /// Replace the bounds for one field.
    pub fn with_bounds(mut self, field: FieldName, bounds: FieldBounds) -> Self {
        self.entries[field.index()] = bounds;
        self
    }

    /// Bounds for `field`.
    pub fn bounds(&self, field: FieldName) -> FieldBounds {
        self.entries[field.index()]
    }

    /// Check one field. `None` means valid.
    pub fn validate_field(&self, field: FieldName, value: f64) -> Option<FieldError> {
        let bounds = self.bounds(field);
        if bounds.contains(value) {
            return None;
        }
        tracing::debug!(field = %field, value, min = bounds.min, max = bounds.max, "field out of range");
        Some(FieldError::out_of_range(field, bounds.min, bounds.max))
    }

    /// Check every field, keeping only the failures.
    pub fn validate_all(&self, inputs: &EstimateInputs) -> BTreeMap<FieldName, FieldError> {
        FieldName::ALL
            .into_iter()
            .filter_map(|field| {
                self.validate_field(field, inputs.get(field)).map(|err| (field, err))
            })
            .collect()
    }
}

/// Check one field against the default bounds. `None` means valid.
pub fn validate_field(field: FieldName, value: f64) -> Option<FieldError> {
    BoundsTable::default().validate_field(field, value)
}

/// Check every field against the default bounds; an empty map means valid.
pub fn validate_all(inputs: &EstimateInputs) -> BTreeMap<FieldName, FieldError> {
    BoundsTable::default().validate_all(inputs)
}

/// Validate by wire name, failing on names that are not estimate fields.
pub fn validate_named(name: &str, value: f64) -> Result<Option<FieldError>, UnknownField> {
    let field: FieldName = name.parse()?;
    Ok(validate_field(field, value))
}
