use std::sync::Arc;

use log::{debug, info, trace};
use rayon::prelude::*;

use crate::error::{OptResult, OptimizerError};
use crate::leveled::{LeveledPlan, PlanList, PlanRanking, RankedPlan};
use crate::listener::OptimizerListener;
use crate::optimizer::{CancellationToken, OptimizerConfig, OptimizerPlan};
use crate::rules::{RuleLevel, RuleRegistry, RuleResult};

/// Optimizer applying the rules of a [`RuleRegistry`] level by level.
///
/// A run works on generations of plans. In each pass every plan below the maximum level is
/// handed to the rules of the next level above its own; whatever those rules emit forms the
/// next generation. Rules sharing a level are applied one after another within the same
/// pass, in registration order. The run ends when the least progressed plan reaches the
/// maximum level, or when a pass leaves `max_plan_count` plans or more behind. Every rule
/// invocation is also told how many plans it may emit, see [`RuleResult::remaining`].
pub struct LeveledOptimizer<'a, P> {
    registry: &'a RuleRegistry<P>,
    config: OptimizerConfig,
    listener: Option<Arc<dyn OptimizerListener>>,
    cancellation: Option<CancellationToken>,
}

impl<'a, P: OptimizerPlan> LeveledOptimizer<'a, P> {
    pub fn new(registry: &'a RuleRegistry<P>, config: OptimizerConfig) -> Self {
        Self {
            registry,
            config,
            listener: None,
            cancellation: None,
        }
    }

    pub fn with_listener(mut self, listener: Arc<dyn OptimizerListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    /// The token is checked before every pass.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Optimizes `plan` starting from level `0` and ranks the resulting plans by cost.
    pub fn create_plans(&self, plan: P) -> OptResult<PlanRanking<P>> {
        self.create_plans_at(plan, 0)
    }

    /// Optimizes `plan` as if it had already passed every rule up to `level`.
    pub fn create_plans_at(&self, plan: P, level: RuleLevel) -> OptResult<PlanRanking<P>> {
        self.config.validate()?;
        if self.registry.is_empty() {
            return Err(OptimizerError::Configuration(
                "rule registry is empty".to_string(),
            ));
        }

        let max_level = self.registry.max_level();
        if level > max_level {
            return Err(OptimizerError::Configuration(format!(
                "seed level {} is above the maximum rule level {}",
                level, max_level
            )));
        }

        let mut plans = PlanList::seed_at(plan, level);
        let mut least_done_level = level;
        let mut pass = 0;
        let mut truncated = false;

        while least_done_level < max_level {
            pass += 1;
            self.check_cancelled(pass)?;

            debug!(
                "Entering pass {} of query optimization with {} plans",
                pass,
                plans.len()
            );
            self.notify(|listener| listener.pass_started(pass, plans.len()));

            plans = if self.config.parallel {
                self.run_pass_parallel(plans, pass)?
            } else {
                self.run_pass(plans, pass)?
            };

            least_done_level = plans.minimum_level().unwrap_or(max_level);
            debug!(
                "Pass {} left {} plans, least done level is {}",
                pass,
                plans.len(),
                least_done_level
            );
            self.notify(|listener| listener.pass_finished(pass, plans.len(), least_done_level));

            if least_done_level < max_level && plans.len() >= self.config.max_plan_count {
                info!(
                    "Stopping query optimization after pass {}: {} plans reached the maximum of {}",
                    pass,
                    plans.len(),
                    self.config.max_plan_count
                );
                self.notify(|listener| {
                    listener.plan_cap_reached(plans.len(), self.config.max_plan_count)
                });
                truncated = true;
                break;
            }
        }

        Ok(self.rank(plans, pass, truncated))
    }

    fn run_pass(&self, mut plans: PlanList<P>, pass: usize) -> OptResult<PlanList<P>> {
        let mut next = PlanList::new();
        let mut plan_index = 0;
        while let Some(entry) = plans.pop_front() {
            self.advance(entry, pass, plan_index, &mut next)?;
            plan_index += 1;
        }
        Ok(next)
    }

    /// Same as [`Self::run_pass`], but every plan is advanced on the rayon pool. The outputs
    /// are concatenated in input order, so the next generation is identical.
    fn run_pass_parallel(&self, plans: PlanList<P>, pass: usize) -> OptResult<PlanList<P>> {
        let entries: Vec<LeveledPlan<P>> = plans.into_iter().collect();
        let outputs = entries
            .into_par_iter()
            .enumerate()
            .map(|(plan_index, entry)| {
                let mut output = PlanList::new();
                self.advance(entry, pass, plan_index, &mut output)
                    .map(|_| output)
            })
            .collect::<OptResult<Vec<PlanList<P>>>>()?;

        let mut next = PlanList::new();
        for mut output in outputs {
            next.append(&mut output);
        }
        Ok(next)
    }

    /// Moves one plan through the rules of its next level, pushing the survivors to `next`.
    fn advance(
        &self,
        entry: LeveledPlan<P>,
        pass: usize,
        plan_index: usize,
        next: &mut PlanList<P>,
    ) -> OptResult<()> {
        let max_level = self.registry.max_level();
        if entry.level >= max_level {
            next.push(entry.plan, entry.level);
            return Ok(());
        }

        let rules = self.registry.next_rules(entry.level);
        let mut pending = vec![entry.plan];
        for (idx, rule) in rules.iter().enumerate() {
            let is_last = idx + 1 == rules.len();
            let mut carried = Vec::with_capacity(pending.len());

            for mut plan in pending {
                if !plan.var_usage_computed() {
                    plan.compute_var_usage();
                }

                trace!(
                    "Trying rule {} with level {} on plan {} in pass {}",
                    rule.name(),
                    rule.level(),
                    plan_index,
                    pass
                );
                self.notify(|listener| {
                    listener.rule_applied(pass, rule.name(), rule.level(), plan_index)
                });

                let mut results = RuleResult::with_limit(self.config.max_plan_count);
                rule.apply(plan, &mut results)
                    .map_err(|source| OptimizerError::RuleExecution {
                        rule: rule.name().to_string(),
                        level: rule.level(),
                        pass,
                        source: source.into(),
                    })?;

                for (plan, level) in results {
                    if level < rule.level() || level > max_level {
                        return Err(OptimizerError::InvalidLevel {
                            rule: rule.name().to_string(),
                            level: rule.level(),
                            emitted: level,
                            max_level,
                        });
                    }

                    if level == rule.level() && !is_last {
                        carried.push(plan);
                    } else {
                        next.push(plan, level);
                    }
                }
            }

            pending = carried;
        }

        Ok(())
    }

    fn rank(&self, plans: PlanList<P>, passes: usize, truncated: bool) -> PlanRanking<P> {
        let mut ranked: Vec<RankedPlan<P>> = plans
            .into_iter()
            .map(|LeveledPlan { mut plan, level }| {
                let cost = plan.estimate_cost();
                RankedPlan { plan, cost, level }
            })
            .collect();
        ranked.sort_by(|left, right| left.cost.total_cmp(&right.cost));

        let ranking = PlanRanking::new(ranked, passes, truncated);
        debug!(
            "Query optimization ends with {} plans after {} passes:\n{}",
            ranking.len(),
            passes,
            ranking
        );
        self.notify(|listener| listener.optimization_finished(&ranking.costs()));
        ranking
    }

    fn check_cancelled(&self, pass: usize) -> OptResult<()> {
        match &self.cancellation {
            Some(token) if token.is_cancelled() => {
                info!("Query optimization cancelled before pass {}", pass);
                Err(OptimizerError::Cancelled { pass })
            }
            _ => Ok(()),
        }
    }

    fn notify<F>(&self, f: F)
    where
        F: FnOnce(&dyn OptimizerListener),
    {
        if let Some(listener) = &self.listener {
            f(listener.as_ref());
        }
    }
}
