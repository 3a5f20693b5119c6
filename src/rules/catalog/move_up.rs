use anyhow::Context;
use enumset::EnumSet;

use crate::operator::{NodeType, PlanOperator};
use crate::plan::{ExecutionPlan, PlanNodeId};
use crate::rules::catalog::variable_usage;
use crate::rules::{RuleLevel, RuleResult};

/// Moves calculations right behind the nodes setting the variables they read, so they are
/// evaluated outside of loops they do not depend on.
pub fn move_calculations_up(
    mut plan: ExecutionPlan,
    level: RuleLevel,
    results: &mut RuleResult<ExecutionPlan>,
) -> anyhow::Result<()> {
    let candidates = dependencies_of(&plan, EnumSet::only(NodeType::Calculation))?;
    for (id, dependencies) in candidates {
        move_up(&mut plan, id, &dependencies, EnumSet::empty())?;
    }
    results.push(plan, level);
    Ok(())
}

/// Moves filters right behind the calculation producing their condition, so fewer rows
/// flow through the rest of the plan. Filters never pass a limit.
pub fn move_filters_up(
    mut plan: ExecutionPlan,
    level: RuleLevel,
    results: &mut RuleResult<ExecutionPlan>,
) -> anyhow::Result<()> {
    let candidates = dependencies_of(&plan, EnumSet::only(NodeType::Filter))?;
    for (id, dependencies) in candidates {
        move_up(&mut plan, id, &dependencies, EnumSet::only(NodeType::Limit))?;
    }
    results.push(plan, level);
    Ok(())
}

/// For each node of the given types, the nodes setting the variables it uses.
fn dependencies_of(
    plan: &ExecutionPlan,
    types: EnumSet<NodeType>,
) -> anyhow::Result<Vec<(PlanNodeId, Vec<PlanNodeId>)>> {
    let usage = variable_usage(plan)?;
    Ok(plan
        .find_nodes(types)
        .map(|node| {
            let setters = node
                .operator()
                .variables_used()
                .into_iter()
                .filter_map(|variable| usage.setter(variable))
                .collect();
            (node.id(), setters)
        })
        .collect())
}

/// Moves node `id` to the earliest position after all its dependencies and barriers.
fn move_up(
    plan: &mut ExecutionPlan,
    id: PlanNodeId,
    dependencies: &[PlanNodeId],
    barriers: EnumSet<NodeType>,
) -> anyhow::Result<bool> {
    let current = plan
        .position(id)
        .with_context(|| format!("node {} disappeared from the plan", id))?;

    let mut target = 1;
    for (position, node) in plan.nodes()[..current].iter().enumerate() {
        if dependencies.contains(&node.id()) || barriers.contains(node.node_type()) {
            target = position + 1;
        }
    }

    if target < current {
        plan.move_node(id, target)?;
        Ok(true)
    } else {
        Ok(false)
    }
}
