use itertools::Itertools;

use crate::operator::NodeType;
use crate::plan::ExecutionPlan;
use crate::rules::{RuleLevel, RuleResult};

/// Creates one plan for every order of adjacent enumerations.
///
/// Enumerations do not read variables, so adjacent ones can be nested in any order. The
/// number of orders grows with the factorial of the run lengths, so orders are generated
/// lazily and the rule stops once the result holds as many plans as
/// [`RuleResult::remaining`] allows. The original plan is always kept.
pub fn interchange_adjacent_enumerations(
    plan: ExecutionPlan,
    level: RuleLevel,
    results: &mut RuleResult<ExecutionPlan>,
) -> anyhow::Result<()> {
    let runs = enumeration_runs(&plan);
    let budget = results.remaining().unwrap_or(usize::MAX).saturating_sub(1);
    if runs.is_empty() || budget == 0 {
        results.push(plan, level);
        return Ok(());
    }

    let mut alternatives = vec![];
    let orders = runs
        .iter()
        .map(|(_, len)| (0..*len).permutations(*len))
        .multi_cartesian_product()
        .filter(|orders| !orders.iter().all(|order| is_identity(order)))
        .take(budget);
    for orders in orders {
        let mut alternative = plan.clone();
        for ((start, _), order) in runs.iter().zip(&orders) {
            alternative.permute(*start, order)?;
        }
        alternatives.push(alternative);
    }

    results.push(plan, level);
    for alternative in alternatives {
        results.push(alternative, level);
    }
    Ok(())
}

/// Start position and length of every run of at least two adjacent enumerations.
fn enumeration_runs(plan: &ExecutionPlan) -> Vec<(usize, usize)> {
    let groups = plan
        .nodes()
        .iter()
        .enumerate()
        .group_by(|(_, node)| node.node_type() == NodeType::EnumerateCollection);
    let runs = groups
        .into_iter()
        .filter(|(is_enumeration, _)| *is_enumeration)
        .filter_map(|(_, mut run)| {
            let (start, _) = run.next()?;
            let len = 1 + run.count();
            (len > 1).then(|| (start, len))
        })
        .collect();
    runs
}

fn is_identity(order: &[usize]) -> bool {
    order.iter().enumerate().all(|(idx, position)| idx == *position)
}
