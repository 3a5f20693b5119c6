//! Diagnostics hooks of an optimizer run.
//!
//! Listeners observe a run, they cannot influence it. The optimizer also reports the same
//! milestones through the `log` facade, so a listener is only needed to capture them
//! programmatically.

use parking_lot::Mutex;

use crate::cost::Cost;
use crate::rules::RuleLevel;

pub trait OptimizerListener: Send + Sync {
    fn pass_started(&self, _pass: usize, _plans: usize) {}

    fn rule_applied(&self, _pass: usize, _rule: &str, _level: RuleLevel, _plan_index: usize) {}

    fn pass_finished(&self, _pass: usize, _plans: usize, _least_level: RuleLevel) {}

    /// The search stopped early because the plan count reached the configured maximum.
    fn plan_cap_reached(&self, _plans: usize, _max_plan_count: usize) {}

    /// Costs of the ranked plans, cheapest first.
    fn optimization_finished(&self, _costs: &[Cost]) {}
}

#[derive(Debug, Clone, PartialEq)]
pub enum OptimizerEvent {
    PassStarted {
        pass: usize,
        plans: usize,
    },
    RuleApplied {
        pass: usize,
        rule: String,
        level: RuleLevel,
        plan_index: usize,
    },
    PassFinished {
        pass: usize,
        plans: usize,
        least_level: RuleLevel,
    },
    PlanCapReached {
        plans: usize,
        max_plan_count: usize,
    },
    Finished {
        costs: Vec<Cost>,
    },
}

/// Keeps every event in memory, in the order they were reported.
#[derive(Debug, Default)]
pub struct RecordingListener {
    events: Mutex<Vec<OptimizerEvent>>,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<OptimizerEvent> {
        self.events.lock().clone()
    }

    /// Names of the applied rules, in invocation order.
    pub fn applied_rules(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                OptimizerEvent::RuleApplied { rule, .. } => Some(rule.clone()),
                _ => None,
            })
            .collect()
    }

    fn record(&self, event: OptimizerEvent) {
        self.events.lock().push(event);
    }
}

impl OptimizerListener for RecordingListener {
    fn pass_started(&self, pass: usize, plans: usize) {
        self.record(OptimizerEvent::PassStarted { pass, plans });
    }

    fn rule_applied(&self, pass: usize, rule: &str, level: RuleLevel, plan_index: usize) {
        self.record(OptimizerEvent::RuleApplied {
            pass,
            rule: rule.to_string(),
            level,
            plan_index,
        });
    }

    fn pass_finished(&self, pass: usize, plans: usize, least_level: RuleLevel) {
        self.record(OptimizerEvent::PassFinished {
            pass,
            plans,
            least_level,
        });
    }

    fn plan_cap_reached(&self, plans: usize, max_plan_count: usize) {
        self.record(OptimizerEvent::PlanCapReached {
            plans,
            max_plan_count,
        });
    }

    fn optimization_finished(&self, costs: &[Cost]) {
        self.record(OptimizerEvent::Finished {
            costs: costs.to_vec(),
        });
    }
}
