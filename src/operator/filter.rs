use smallvec::smallvec;

use crate::cost::{Cost, Estimate};
use crate::expr::VariableList;
use crate::operator::PlanOperator;
use crate::plan::VariableId;

/// Fraction of the rows expected to pass a filter.
pub const FILTER_SELECTIVITY: f64 = 0.5;

/// Keeps the rows for which a variable, usually set by a calculation, is truthy.
#[derive(Clone, Debug, PartialEq)]
pub struct Filter {
    in_variable: VariableId,
}

impl Filter {
    pub fn new(in_variable: VariableId) -> Self {
        Self { in_variable }
    }

    pub fn in_variable(&self) -> VariableId {
        self.in_variable
    }
}

impl PlanOperator for Filter {
    fn estimate(&self, input: Estimate) -> Estimate {
        Estimate {
            items: input.items * FILTER_SELECTIVITY,
            cost: input.cost + Cost::from(input.items),
        }
    }

    fn variables_used(&self) -> VariableList {
        smallvec![self.in_variable]
    }

    fn describe(&self) -> String {
        format!("Filter(${})", self.in_variable)
    }
}
