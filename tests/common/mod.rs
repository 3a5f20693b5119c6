//! Test double for the leveled optimizer.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use leveled_opt::cost::Cost;
use leveled_opt::optimizer::OptimizerPlan;
use leveled_opt::rules::{RuleLevel, RuleResult};

/// A plan that only carries a cost, the names of the rules it went through, and counters
/// shared by every plan derived from the same seed.
#[derive(Debug)]
pub struct TrackedPlan {
    pub cost: f64,
    pub history: Vec<String>,
    analyzed: bool,
    live: Arc<AtomicUsize>,
    analyses: Arc<AtomicUsize>,
}

impl TrackedPlan {
    pub fn new(cost: f64) -> Self {
        Self::with_counters(cost, Arc::default(), Arc::default())
    }

    pub fn with_counters(cost: f64, live: Arc<AtomicUsize>, analyses: Arc<AtomicUsize>) -> Self {
        live.fetch_add(1, Ordering::SeqCst);
        Self {
            cost,
            history: vec![],
            analyzed: false,
            live,
            analyses,
        }
    }

    /// Plans derived from this one that are still alive, this one included.
    pub fn live(&self) -> Arc<AtomicUsize> {
        self.live.clone()
    }

    pub fn analyses(&self) -> Arc<AtomicUsize> {
        self.analyses.clone()
    }

    pub fn is_analyzed(&self) -> bool {
        self.analyzed
    }

    /// Records `rule` and drops the cached analysis, like a real rewrite would.
    pub fn rewrite(mut self, rule: &str, cost: f64) -> Self {
        self.history.push(rule.to_string());
        self.cost = cost;
        self.analyzed = false;
        self
    }

    /// Records `rule` without changing the plan.
    pub fn visit(mut self, rule: &str) -> Self {
        self.history.push(rule.to_string());
        self
    }
}

impl Clone for TrackedPlan {
    fn clone(&self) -> Self {
        self.live.fetch_add(1, Ordering::SeqCst);
        Self {
            cost: self.cost,
            history: self.history.clone(),
            analyzed: self.analyzed,
            live: self.live.clone(),
            analyses: self.analyses.clone(),
        }
    }
}

impl Drop for TrackedPlan {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

impl OptimizerPlan for TrackedPlan {
    fn var_usage_computed(&self) -> bool {
        self.analyzed
    }

    fn compute_var_usage(&mut self) {
        if !self.analyzed {
            self.analyses.fetch_add(1, Ordering::SeqCst);
            self.analyzed = true;
        }
    }

    fn estimate_cost(&mut self) -> Cost {
        Cost::from(self.cost)
    }
}

/// A rule passing the plan on unchanged, recording its name.
pub fn visit(
    name: &'static str,
) -> impl Fn(TrackedPlan, RuleLevel, &mut RuleResult<TrackedPlan>) -> anyhow::Result<()>
       + Send
       + Sync
       + 'static {
    move |plan: TrackedPlan, level: RuleLevel, results: &mut RuleResult<TrackedPlan>| {
        anyhow::ensure!(plan.is_analyzed(), "{} got a plan without variable usage", name);
        results.push(plan.visit(name), level);
        Ok(())
    }
}

/// A rule replacing the plan with one rewritten alternative per cost in `costs`.
pub fn fork(
    name: &'static str,
    costs: &'static [f64],
) -> impl Fn(TrackedPlan, RuleLevel, &mut RuleResult<TrackedPlan>) -> anyhow::Result<()>
       + Send
       + Sync
       + 'static {
    move |plan: TrackedPlan, level: RuleLevel, results: &mut RuleResult<TrackedPlan>| {
        for cost in costs {
            results.push(plan.clone().rewrite(name, plan.cost + cost), level);
        }
        Ok(())
    }
}

/// Every plan's rule history, in ranking order.
pub fn histories<'a, I>(plans: I) -> Vec<Vec<String>>
where
    I: IntoIterator<Item = &'a TrackedPlan>,
{
    plans.into_iter().map(|plan| plan.history.clone()).collect()
}
