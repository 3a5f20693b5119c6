use std::fmt::{Display, Formatter};

use prettytable::Table;

use crate::cost::Cost;
use crate::rules::RuleLevel;

/// A surviving plan with its estimated cost.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedPlan<P> {
    pub plan: P,
    pub cost: Cost,
    pub level: RuleLevel,
}

/// Outcome of an optimizer run: every surviving plan, cheapest first.
///
/// The caller owns all plans. An empty ranking means every candidate was eliminated by a
/// rule, which is a valid outcome.
#[derive(Debug)]
pub struct PlanRanking<P> {
    plans: Vec<RankedPlan<P>>,
    passes: usize,
    truncated: bool,
}

impl<P> PlanRanking<P> {
    pub(super) fn new(plans: Vec<RankedPlan<P>>, passes: usize, truncated: bool) -> Self {
        Self {
            plans,
            passes,
            truncated,
        }
    }

    pub fn len(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }

    /// Number of passes the optimizer ran.
    pub fn passes(&self) -> usize {
        self.passes
    }

    /// Whether the search stopped at the plan cap before every rule was applied.
    pub fn truncated(&self) -> bool {
        self.truncated
    }

    pub fn best(&self) -> Option<&RankedPlan<P>> {
        self.plans.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RankedPlan<P>> {
        self.plans.iter()
    }

    pub fn costs(&self) -> Vec<Cost> {
        self.plans.iter().map(|ranked| ranked.cost).collect()
    }

    pub fn into_best(self) -> Option<RankedPlan<P>> {
        self.plans.into_iter().next()
    }

    pub fn into_plans(self) -> Vec<RankedPlan<P>> {
        self.plans
    }

    pub fn to_table(&self) -> Table {
        let mut table = table!(["Rank", "Cost", "Level"]);
        for (idx, ranked) in self.plans.iter().enumerate() {
            table.add_row(row![idx + 1, ranked.cost, ranked.level]);
        }
        table
    }
}

impl<P> Display for PlanRanking<P> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_table())
    }
}
