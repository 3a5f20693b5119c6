use thiserror::Error;

use crate::rules::RuleLevel;

/// Boxed error returned by a failing rule.
pub type RuleError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum OptimizerError {
    /// A rule failed while transforming a plan. The run is aborted.
    #[error("rule '{rule}' (level {level}) failed in pass {pass}: {source}")]
    RuleExecution {
        rule: String,
        level: RuleLevel,
        pass: usize,
        #[source]
        source: RuleError,
    },

    /// A rule emitted a plan at a level it is not allowed to reach.
    #[error(
        "rule '{rule}' (level {level}) emitted a plan at level {emitted}, \
         allowed range is [{level}, {max_level}]"
    )]
    InvalidLevel {
        rule: String,
        level: RuleLevel,
        emitted: RuleLevel,
        max_level: RuleLevel,
    },

    #[error("invalid optimizer configuration: {0}")]
    Configuration(String),

    #[error("optimization cancelled before pass {pass}")]
    Cancelled { pass: usize },

    #[error("invalid plan: {0}")]
    InvalidPlan(String),
}

pub type OptResult<T> = Result<T, OptimizerError>;
