use smallvec::smallvec;

use crate::cost::{Cost, Estimate};
use crate::expr::{Expr, VariableList};
use crate::operator::PlanOperator;
use crate::plan::VariableId;

/// Evaluates an expression for every row and stores the result in a variable.
#[derive(Clone, Debug, PartialEq)]
pub struct Calculation {
    expr: Expr,
    out_variable: VariableId,
}

impl Calculation {
    pub fn new(expr: Expr, out_variable: VariableId) -> Self {
        Self { expr, out_variable }
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    pub fn out_variable(&self) -> VariableId {
        self.out_variable
    }
}

impl PlanOperator for Calculation {
    fn estimate(&self, input: Estimate) -> Estimate {
        Estimate {
            items: input.items,
            cost: input.cost + Cost::from(input.items),
        }
    }

    fn variables_used(&self) -> VariableList {
        self.expr.variables()
    }

    fn variables_set(&self) -> VariableList {
        smallvec![self.out_variable]
    }

    fn describe(&self) -> String {
        format!("Calculation(${} = {})", self.out_variable, self.expr)
    }
}
