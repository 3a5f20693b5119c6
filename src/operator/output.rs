use smallvec::smallvec;

use crate::cost::{Cost, Estimate};
use crate::expr::VariableList;
use crate::operator::PlanOperator;
use crate::plan::VariableId;

/// Hands the values of a variable to the caller.
#[derive(Clone, Debug, PartialEq)]
pub struct Return {
    in_variable: VariableId,
}

impl Return {
    pub fn new(in_variable: VariableId) -> Self {
        Self { in_variable }
    }

    pub fn in_variable(&self) -> VariableId {
        self.in_variable
    }
}

impl PlanOperator for Return {
    fn estimate(&self, input: Estimate) -> Estimate {
        Estimate {
            items: input.items,
            cost: input.cost + Cost::from(input.items),
        }
    }

    fn variables_used(&self) -> VariableList {
        smallvec![self.in_variable]
    }

    fn describe(&self) -> String {
        format!("Return(${})", self.in_variable)
    }
}

/// Replaces a part of the plan known to never produce anything.
///
/// Its dependencies are never executed, so its estimate ignores them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NoResults;

impl PlanOperator for NoResults {
    fn estimate(&self, _input: Estimate) -> Estimate {
        Estimate::new(0.0, 0.5)
    }

    fn describe(&self) -> String {
        "NoResults".to_string()
    }
}
