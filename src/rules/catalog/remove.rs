use std::collections::HashSet;

use enumset::EnumSet;

use crate::operator::{NoResults, NodeType, Operator, PlanOperator, Sort};
use crate::plan::{ExecutionPlan, PlanNodeId};
use crate::rules::catalog::variable_usage;
use crate::rules::{RuleLevel, RuleResult};

/// Removes filters whose condition is always true, and replaces the ones whose condition is
/// always false with a [`NoResults`] node.
pub fn remove_unnecessary_filters(
    mut plan: ExecutionPlan,
    level: RuleLevel,
    results: &mut RuleResult<ExecutionPlan>,
) -> anyhow::Result<()> {
    let usage = variable_usage(&plan)?;
    let constant_filters: Vec<(PlanNodeId, bool)> = plan
        .find_nodes(EnumSet::only(NodeType::Filter))
        .filter_map(|node| {
            let filter = node.operator().as_filter()?;
            let setter = plan.node(usage.setter(filter.in_variable())?)?;
            let value = setter.operator().as_calculation()?.expr().constant_bool()?;
            Some((node.id(), value))
        })
        .collect();

    for (id, value) in constant_filters {
        if value {
            plan.remove_node(id)?;
        } else {
            plan.replace_operator(id, Operator::from(NoResults))?;
        }
    }
    results.push(plan, level);
    Ok(())
}

/// Removes calculations whose result is never read.
///
/// Nodes are visited from the last to the first, so a calculation only read by removed
/// calculations goes away as well.
pub fn remove_unnecessary_calculations(
    mut plan: ExecutionPlan,
    level: RuleLevel,
    results: &mut RuleResult<ExecutionPlan>,
) -> anyhow::Result<()> {
    let mut used = HashSet::new();
    let mut unused = vec![];
    for node in plan.nodes().iter().rev() {
        if let Some(calculation) = node.operator().as_calculation() {
            if !used.contains(&calculation.out_variable()) {
                unused.push(node.id());
                continue;
            }
        }
        used.extend(node.operator().variables_used());
    }

    for id in unused {
        plan.remove_node(id)?;
    }
    results.push(plan, level);
    Ok(())
}

/// Removes sorts that can not change the order of their input.
///
/// A sort is redundant right after a sort it is covered by. A sort followed by a sort
/// covering it is redundant too, unless a limit sits between the two. Enumerations start
/// a new order.
pub fn remove_redundant_sorts(
    mut plan: ExecutionPlan,
    level: RuleLevel,
    results: &mut RuleResult<ExecutionPlan>,
) -> anyhow::Result<()> {
    let mut redundant = vec![];
    let mut previous: Option<(PlanNodeId, &Sort)> = None;
    let mut limited = false;
    for node in plan.nodes() {
        match node.operator() {
            Operator::Sort(sort) => {
                match previous {
                    Some((_, earlier)) if sort.is_covered_by(earlier) => {
                        redundant.push(node.id());
                        continue;
                    }
                    Some((id, earlier)) if !limited && earlier.is_covered_by(sort) => {
                        redundant.push(id);
                    }
                    _ => {}
                }
                previous = Some((node.id(), sort));
                limited = false;
            }
            Operator::Limit(_) => limited = true,
            Operator::EnumerateCollection(_) | Operator::NoResults(_) => previous = None,
            _ => {}
        }
    }

    for id in redundant {
        plan.remove_node(id)?;
    }
    results.push(plan, level);
    Ok(())
}
