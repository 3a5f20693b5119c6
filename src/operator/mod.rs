//! Execution plan operators.

use enum_as_inner::EnumAsInner;
use enum_dispatch::enum_dispatch;
use enumset::EnumSetType;
use strum_macros::IntoStaticStr;

use crate::cost::Estimate;
use crate::expr::VariableList;

mod calculation;
pub use calculation::*;
mod enumerate_collection;
pub use enumerate_collection::*;
mod filter;
pub use filter::*;
mod limit;
pub use limit::*;
mod output;
pub use output::*;
mod sort;
pub use sort::*;
mod singleton;
pub use singleton::*;

#[enum_dispatch]
pub trait PlanOperator {
    /// Items produced and accumulated cost, given what the dependency produces.
    fn estimate(&self, input: Estimate) -> Estimate;

    fn variables_used(&self) -> VariableList {
        VariableList::new()
    }

    fn variables_set(&self) -> VariableList {
        VariableList::new()
    }

    /// Short human readable form, used when explaining plans.
    fn describe(&self) -> String;
}

/// Kind of a plan node, usable in [`enumset::EnumSet`]s.
#[derive(EnumSetType, Debug)]
pub enum NodeType {
    Singleton,
    EnumerateCollection,
    Calculation,
    Filter,
    Sort,
    Limit,
    Return,
    NoResults,
}

#[enum_dispatch(PlanOperator)]
#[derive(Clone, Debug, PartialEq, EnumAsInner, IntoStaticStr)]
pub enum Operator {
    Singleton(Singleton),
    EnumerateCollection(EnumerateCollection),
    Calculation(Calculation),
    Filter(Filter),
    Sort(Sort),
    Limit(Limit),
    Return(Return),
    NoResults(NoResults),
}

impl Operator {
    pub fn node_type(&self) -> NodeType {
        match self {
            Operator::Singleton(_) => NodeType::Singleton,
            Operator::EnumerateCollection(_) => NodeType::EnumerateCollection,
            Operator::Calculation(_) => NodeType::Calculation,
            Operator::Filter(_) => NodeType::Filter,
            Operator::Sort(_) => NodeType::Sort,
            Operator::Limit(_) => NodeType::Limit,
            Operator::Return(_) => NodeType::Return,
            Operator::NoResults(_) => NodeType::NoResults,
        }
    }

    pub fn name(&self) -> &'static str {
        self.into()
    }
}
