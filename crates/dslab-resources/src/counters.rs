//! Resource consumption counters.

use std::iter::Sum;
use std::ops::AddAssign;

use serde::Serialize;

/// Accumulated resource consumption of a provider.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct ResourceCounters {
    /// Work requested by consumers.
    pub demand: f64,
    /// Work actually performed.
    pub actual: f64,
    /// Requested work which could not be performed before the deadline.
    pub overcommit: f64,
}

impl ResourceCounters {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl AddAssign for ResourceCounters {
    fn add_assign(&mut self, other: Self) {
        self.demand += other.demand;
        self.actual += other.actual;
        self.overcommit += other.overcommit;
    }
}

impl Sum for ResourceCounters {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        let mut total = Self::default();
        for counters in iter {
            total += counters;
        }
        total
    }
}
