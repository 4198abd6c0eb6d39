//! A single entry in a [`Model`](crate::Model).

use crate::value::{Status, Value};
use serde::{Deserialize, Serialize};

/// Value, bounds and status of one parameter.
///
/// Bounds are inclusive. A metric range marks the sub-range of `[min, max]`
/// that is continuously adjustable (a cutoff sweep); the rest of the range is
/// categorical (discrete choices where neighbouring integers are unrelated).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub value: Value,
    pub min: Option<i32>,
    pub max: Option<i32>,
    pub metric_min: Option<i32>,
    pub metric_max: Option<i32>,
    /// `None` means "never declared"; see [`Parameter::status`].
    pub status: Option<Status>,
}

impl Parameter {
    pub fn new(value: Value) -> Self {
        Self {
            value,
            min: None,
            max: None,
            metric_min: None,
            metric_max: None,
            status: None,
        }
    }

    /// Effective status: the declared one, or the default for the value's kind.
    ///
    /// A string value is always immutable to the mutation engine, whatever was declared.
    #[inline]
    pub fn status(&self) -> Status {
        match (&self.value, self.status) {
            (Value::Str(_), Some(Status::Restricted)) => Status::Restricted,
            (Value::Str(_), _) => Status::Immutable,
            (value, None) => Status::default_for(value),
            (_, Some(status)) => status,
        }
    }

    /// `(min, max)` when both are declared.
    #[inline]
    pub fn bounds(&self) -> Option<(i32, i32)> {
        Some((self.min?, self.max?))
    }

    /// `(metric_min, metric_max)` when both are declared.
    #[inline]
    pub fn metric_bounds(&self) -> Option<(i32, i32)> {
        Some((self.metric_min?, self.metric_max?))
    }

    /// `max - min + 1`, or 0 when unbounded. Saturates at `i32::MAX`.
    #[inline]
    pub fn range(&self) -> i32 {
        match self.bounds() {
            Some((min, max)) => {
                let width = i64::from(max) - i64::from(min) + 1;
                i32::try_from(width.max(0)).unwrap_or(i32::MAX)
            }
            None => 0,
        }
    }

    /// Bounds usable for mutation: integer, free, both bounds declared and `min < max`.
    pub fn mutable_bounds(&self) -> Option<(i32, i32)> {
        if !self.value.is_int() || !self.status().is_free() {
            return None;
        }
        let (min, max) = self.bounds()?;
        (min < max).then_some((min, max))
    }

    /// True when the metric range covers the whole `[min, max]`.
    #[inline]
    pub fn is_fully_metric(&self) -> bool {
        match (self.bounds(), self.metric_bounds()) {
            (Some(bounds), Some(metric)) => bounds == metric,
            _ => false,
        }
    }

    /// True when `value` falls inside the declared metric range.
    #[inline]
    pub fn is_metric_value(&self, value: i32) -> bool {
        self.metric_bounds()
            .is_some_and(|(lo, hi)| value >= lo && value <= hi)
    }

    /// Same bounds and effective status, ignoring the value.
    pub fn same_shape(&self, other: &Parameter) -> bool {
        self.min == other.min
            && self.max == other.max
            && self.metric_min == other.metric_min
            && self.metric_max == other.metric_max
            && self.status() == other.status()
    }
}
