use std::collections::{HashMap, HashSet};

use crate::operator::PlanOperator;
use crate::plan::{PlanNode, PlanNodeId, VariableId};

/// Which variables exist where in a plan, and who reads them.
///
/// Some rules may only move or drop a node when no later node depends on what it sets, so
/// they need this analysis before they run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VariableUsage {
    setters: HashMap<VariableId, PlanNodeId>,
    valid: HashMap<PlanNodeId, HashSet<VariableId>>,
    used_later: HashMap<PlanNodeId, HashSet<VariableId>>,
}

impl VariableUsage {
    /// Analyzes a node pipeline, ordered from the first node to execute to the last.
    pub fn compute(nodes: &[PlanNode]) -> Self {
        let mut usage = Self::default();

        let mut valid = HashSet::new();
        for node in nodes {
            for variable in node.operator().variables_set() {
                usage.setters.insert(variable, node.id());
                valid.insert(variable);
            }
            usage.valid.insert(node.id(), valid.clone());
        }

        let mut used_later = HashSet::new();
        for node in nodes.iter().rev() {
            usage.used_later.insert(node.id(), used_later.clone());
            used_later.extend(node.operator().variables_used());
        }

        usage
    }

    /// Node setting `variable`.
    pub fn setter(&self, variable: VariableId) -> Option<PlanNodeId> {
        self.setters.get(&variable).copied()
    }

    /// Whether `variable` can be read right after `node` has run.
    pub fn is_valid_after(&self, node: PlanNodeId, variable: VariableId) -> bool {
        self.valid
            .get(&node)
            .map_or(false, |variables| variables.contains(&variable))
    }

    /// Whether any node after `node` reads `variable`.
    pub fn is_used_later(&self, node: PlanNodeId, variable: VariableId) -> bool {
        self.used_later
            .get(&node)
            .map_or(false, |variables| variables.contains(&variable))
    }

    pub fn used_later(&self, node: PlanNodeId) -> Option<&HashSet<VariableId>> {
        self.used_later.get(&node)
    }
}
