use std::cmp::Ordering;

use derive_more::{Add, AddAssign, Display, From};
use serde::{Deserialize, Serialize};

/// Estimated execution cost of a plan or a plan node.
///
/// Costs are only compared with each other, the unit is meaningless.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, PartialOrd, Add, AddAssign, From, Display, Serialize,
    Deserialize,
)]
pub struct Cost(f64);

impl Cost {
    pub fn new(value: f64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Total order over costs, `NaN` sorts after every other value.
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Output of a plan node: how many items it produces and what producing them costs,
/// including everything upstream.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Estimate {
    pub items: f64,
    pub cost: Cost,
}

impl Estimate {
    pub fn new(items: f64, cost: f64) -> Self {
        Self {
            items,
            cost: Cost::from(cost),
        }
    }
}
