//! Estimate input snapshot.

use crate::fields::FieldName;

/// The six numeric inputs an estimate is derived from.
///
/// Values are raw `f64`s as typed by a user; nothing here enforces bounds.
/// Run them through [`crate::fields::validate_all`] before trusting them.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct EstimateInputs {
    /// Headcount.
    pub employees: f64,
    /// Site count.
    pub locations: f64,
    /// Labor rate in currency units per hour.
    pub current_cost_per_hour: f64,
    /// Recurring tasks per week.
    pub tasks_per_week: f64,
    /// Minutes per task.
    pub time_per_task: f64,
    /// Audits per month.
    pub audit_frequency: f64,
}

impl Default for EstimateInputs {
    /// A small single-site operation: 10 staff, 20 half-hour tasks a week,
    /// 4 audits a month at 15/hour.
    fn default() -> Self {
        Self {
            employees: 10.0,
            locations: 1.0,
            current_cost_per_hour: 15.0,
            tasks_per_week: 20.0,
            time_per_task: 30.0,
            audit_frequency: 4.0,
        }
    }
}

impl EstimateInputs {
    /// Read one field.
    pub fn get(&self, field: FieldName) -> f64 {
        match field {
            FieldName::Employees => self.employees,
            FieldName::Locations => self.locations,
            FieldName::CurrentCostPerHour => self.current_cost_per_hour,
            FieldName::TasksPerWeek => self.tasks_per_week,
            FieldName::TimePerTask => self.time_per_task,
            FieldName::AuditFrequency => self.audit_frequency,
        }
    }

    /// Overwrite one field in place.
    pub fn set(&mut self, field: FieldName, value: f64) {
        let slot = match field {
            FieldName::Employees => &mut self.employees,
            FieldName::Locations => &mut self.locations,
            FieldName::CurrentCostPerHour => &mut self.current_cost_per_hour,
            FieldName::TasksPerWeek => &mut self.tasks_per_week,
            FieldName::TimePerTask => &mut self.time_per_task,
            FieldName::AuditFrequency => &mut self.audit_frequency,
        };
        *slot = value;
    }

    /// Copy with one field replaced.
    pub fn with(mut self, field: FieldName, value: f64) -> Self {
        self.set(field, value);
        self
    }

    /// `(field, value)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (FieldName, f64)> + '_ {
        FieldName::ALL.into_iter().map(move |field| (field, self.get(field)))
    }
}
