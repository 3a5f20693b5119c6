//! Rewrite rules for [`ExecutionPlan`]s and the default registry holding them.
//!
//! Levels are grouped in bands:
//!
//! * `1..=99`: move nodes towards the start of the plan, out of inner loops.
//! * `100`: interchange enumerations in every possible way. Plans created at this level or
//!   above must never go back to a lower level.
//! * `101..=199`: remove redundant or unnecessary nodes.
//! * `200..=299`: use indexes for filters and sorts. These need index metadata and are not
//!   part of the default catalog.

use anyhow::Context;

use crate::error::{OptResult, OptimizerError};
use crate::plan::ExecutionPlan;
use crate::properties::VariableUsage;
use crate::rules::{RuleLevel, RuleRegistry, RuleRegistryBuilder};

mod interchange;
pub use interchange::*;
mod move_up;
pub use move_up::*;
mod remove;
pub use remove::*;

pub const MOVE_CALCULATIONS_UP_LEVEL: RuleLevel = 10;
pub const MOVE_FILTERS_UP_LEVEL: RuleLevel = 20;
pub const INTERCHANGE_ENUMERATIONS_LEVEL: RuleLevel = 100;
pub const REMOVE_UNNECESSARY_FILTERS_LEVEL: RuleLevel = 110;
pub const REMOVE_UNNECESSARY_CALCULATIONS_LEVEL: RuleLevel = 120;
pub const REMOVE_REDUNDANT_SORTS_LEVEL: RuleLevel = 130;

lazy_static! {
    static ref DEFAULT_REGISTRY: Result<RuleRegistry<ExecutionPlan>, String> =
        register_default_rules(RuleRegistry::builder())
            .build()
            .map_err(|e| e.to_string());
}

/// Adds the catalog rules to `builder`, so callers can mix them with their own rules.
pub fn register_default_rules(
    builder: RuleRegistryBuilder<ExecutionPlan>,
) -> RuleRegistryBuilder<ExecutionPlan> {
    builder
        .register(
            "move-calculations-up",
            MOVE_CALCULATIONS_UP_LEVEL,
            move_calculations_up,
        )
        .register("move-filters-up", MOVE_FILTERS_UP_LEVEL, move_filters_up)
        .register(
            "interchange-adjacent-enumerations",
            INTERCHANGE_ENUMERATIONS_LEVEL,
            interchange_adjacent_enumerations,
        )
        .register(
            "remove-unnecessary-filters",
            REMOVE_UNNECESSARY_FILTERS_LEVEL,
            remove_unnecessary_filters,
        )
        .register(
            "remove-unnecessary-calculations",
            REMOVE_UNNECESSARY_CALCULATIONS_LEVEL,
            remove_unnecessary_calculations,
        )
        .register(
            "remove-redundant-sorts",
            REMOVE_REDUNDANT_SORTS_LEVEL,
            remove_redundant_sorts,
        )
}

/// The process wide registry with every catalog rule, built on first use.
pub fn default_registry() -> OptResult<&'static RuleRegistry<ExecutionPlan>> {
    DEFAULT_REGISTRY
        .as_ref()
        .map_err(|e| OptimizerError::Configuration(e.clone()))
}

fn variable_usage(plan: &ExecutionPlan) -> anyhow::Result<&VariableUsage> {
    plan.variable_usage()
        .context("variable usage has not been computed for this plan")
}

#[cfg(test)]
pub(crate) fn run_rule(
    rule: fn(
        ExecutionPlan,
        RuleLevel,
        &mut crate::rules::RuleResult<ExecutionPlan>,
    ) -> anyhow::Result<()>,
    mut plan: ExecutionPlan,
) -> Vec<ExecutionPlan> {
    use crate::optimizer::OptimizerPlan;

    plan.compute_var_usage();
    let mut results = crate::rules::RuleResult::new();
    rule(plan, 1, &mut results).unwrap();
    results
        .into_iter()
        .map(|(plan, level)| {
            assert_eq!(1, level);
            plan
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_order() {
        let registry = default_registry().unwrap();
        let names: Vec<&str> = registry.rules().iter().map(|rule| rule.name()).collect();
        assert_eq!(
            vec![
                "move-calculations-up",
                "move-filters-up",
                "interchange-adjacent-enumerations",
                "remove-unnecessary-filters",
                "remove-unnecessary-calculations",
                "remove-redundant-sorts",
            ],
            names
        );
        assert_eq!(REMOVE_REDUNDANT_SORTS_LEVEL, registry.max_level());
        assert!(std::ptr::eq(registry, default_registry().unwrap()));
    }

    #[test]
    fn test_rules_require_variable_usage() {
        let mut builder = crate::plan::ExecutionPlanBuilder::new();
        let users = builder.enumerate_collection("users", 10);
        builder.return_variable(users);
        let plan = builder.build().unwrap();

        let mut results = crate::rules::RuleResult::new();
        assert!(move_filters_up(plan, MOVE_FILTERS_UP_LEVEL, &mut results).is_err());
        assert!(results.is_empty());
    }
}
