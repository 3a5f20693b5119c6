use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::cost::Cost;
use crate::error::{OptResult, OptimizerError};

/// Capabilities the optimizer needs from a plan.
///
/// The optimizer never looks inside a plan. It only makes sure the variable usage
/// analysis exists before a rule sees the plan, and asks for a cost estimate when ranking.
/// Both are expected to be memoized by the implementation and invalidated whenever a rule
/// changes the plan.
pub trait OptimizerPlan: Send {
    fn var_usage_computed(&self) -> bool;

    /// Computes the variable usage analysis. Calling it again without changes in between
    /// must be a no-op.
    fn compute_var_usage(&mut self);

    /// Estimated cost of the plan, computed at most once until the plan changes.
    fn estimate_cost(&mut self) -> Cost;
}

/// Tunables of an optimizer run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Once a pass leaves at least this many plans, the search stops and the plans found so
    /// far are ranked.
    pub max_plan_count: usize,
    /// Dispatch the plans of one pass on the rayon thread pool.
    pub parallel: bool,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            max_plan_count: 192,
            parallel: false,
        }
    }
}

impl OptimizerConfig {
    pub fn with_max_plan_count(mut self, max_plan_count: usize) -> Self {
        self.max_plan_count = max_plan_count;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn validate(&self) -> OptResult<()> {
        if self.max_plan_count == 0 {
            return Err(OptimizerError::Configuration(
                "max_plan_count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Cooperative cancellation flag, checked by the optimizer between passes.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}
