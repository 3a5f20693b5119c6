//! Optimization rules and the registry that orders them.
//!
//! A rule receives a plan by value and hands every plan it wants to keep to a
//! [`RuleResult`], each tagged with the level the plan has reached. Handing back nothing
//! drops the plan, handing back several plans explores alternatives.

use std::fmt::{Debug, Formatter};
use std::sync::Arc;

mod registry;
pub use registry::*;
pub mod catalog;

/// Priority of a rule. Rules with lower levels run earlier, plans are seeded at level `0`.
pub type RuleLevel = u32;

/// The transformation a rule performs.
///
/// Implemented for every `Fn(P, RuleLevel, &mut RuleResult<P>) -> anyhow::Result<()>`, so
/// plain functions and closures can be registered directly.
pub trait Transform<P>: Send + Sync {
    fn apply(&self, plan: P, level: RuleLevel, results: &mut RuleResult<P>) -> anyhow::Result<()>;
}

impl<P, F> Transform<P> for F
where
    F: Fn(P, RuleLevel, &mut RuleResult<P>) -> anyhow::Result<()> + Send + Sync,
{
    fn apply(&self, plan: P, level: RuleLevel, results: &mut RuleResult<P>) -> anyhow::Result<()> {
        self(plan, level, results)
    }
}

pub struct Rule<P> {
    name: String,
    level: RuleLevel,
    transform: Arc<dyn Transform<P>>,
}

impl<P> Rule<P> {
    pub fn new<S, T>(name: S, level: RuleLevel, transform: T) -> Self
    where
        S: Into<String>,
        T: Transform<P> + 'static,
    {
        Self {
            name: name.into(),
            level,
            transform: Arc::new(transform),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn level(&self) -> RuleLevel {
        self.level
    }

    /// Runs the rule against `plan`, passing the rule's own level.
    pub fn apply(&self, plan: P, results: &mut RuleResult<P>) -> anyhow::Result<()> {
        self.transform.apply(plan, self.level, results)
    }
}

impl<P> Clone for Rule<P> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            level: self.level,
            transform: self.transform.clone(),
        }
    }
}

impl<P> Debug for Rule<P> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("level", &self.level)
            .finish()
    }
}

/// Output sink of one rule invocation.
///
/// The optimizer sets a limit on the number of plans one invocation should emit. It is
/// advisory: rules creating many alternatives stop at [`RuleResult::remaining`], other rules
/// may ignore it.
pub struct RuleResult<P> {
    results: Vec<(P, RuleLevel)>,
    limit: Option<usize>,
}

impl<P> RuleResult<P> {
    pub fn new() -> Self {
        Self {
            results: vec![],
            limit: None,
        }
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            results: vec![],
            limit: Some(limit),
        }
    }

    /// Plans that can still be emitted before reaching the limit, `None` without a limit.
    pub fn remaining(&self) -> Option<usize> {
        self.limit
            .map(|limit| limit.saturating_sub(self.results.len()))
    }

    /// Keeps `plan`, marking it as having passed every rule up to `level`.
    pub fn push(&mut self, plan: P, level: RuleLevel) {
        self.results.push((plan, level));
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn results(&self) -> impl Iterator<Item = &(P, RuleLevel)> {
        self.results.iter()
    }
}

impl<P> Default for RuleResult<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> IntoIterator for RuleResult<P> {
    type Item = (P, RuleLevel);
    type IntoIter = std::vec::IntoIter<(P, RuleLevel)>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}
