use crate::cost::{Cost, Estimate};
use crate::expr::VariableList;
use crate::operator::PlanOperator;
use crate::plan::VariableId;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SortElement {
    pub variable: VariableId,
    pub ascending: bool,
}

impl SortElement {
    pub fn asc(variable: VariableId) -> Self {
        Self {
            variable,
            ascending: true,
        }
    }

    pub fn desc(variable: VariableId) -> Self {
        Self {
            variable,
            ascending: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Sort {
    elements: Vec<SortElement>,
}

impl Sort {
    pub fn new(elements: Vec<SortElement>) -> Self {
        Self { elements }
    }

    pub fn elements(&self) -> &[SortElement] {
        &self.elements
    }

    /// Whether sorting by `self` after sorting by `other` keeps the order unchanged, i.e.
    /// `self` sorts by a prefix of `other`'s criteria.
    pub fn is_covered_by(&self, other: &Sort) -> bool {
        other.elements.starts_with(&self.elements)
    }
}

impl PlanOperator for Sort {
    fn estimate(&self, input: Estimate) -> Estimate {
        Estimate {
            items: input.items,
            cost: input.cost + Cost::from(input.items * input.items.max(2.0).log2()),
        }
    }

    fn variables_used(&self) -> VariableList {
        let mut variables = VariableList::new();
        for element in &self.elements {
            if !variables.contains(&element.variable) {
                variables.push(element.variable);
            }
        }
        variables
    }

    fn describe(&self) -> String {
        let elements: Vec<String> = self
            .elements
            .iter()
            .map(|element| {
                format!(
                    "${} {}",
                    element.variable,
                    if element.ascending { "ASC" } else { "DESC" }
                )
            })
            .collect();
        format!("Sort({})", elements.join(", "))
    }
}
