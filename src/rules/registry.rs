use std::collections::HashSet;

use crate::error::{OptResult, OptimizerError};
use crate::rules::{Rule, RuleLevel, Transform};

/// Immutable table of rules, ordered by `(level, registration order)`.
///
/// Build one with [`RuleRegistry::builder`] before optimizing and share it by reference
/// between optimizer runs.
#[derive(Debug)]
pub struct RuleRegistry<P> {
    rules: Vec<Rule<P>>,
}

impl<P> RuleRegistry<P> {
    pub fn builder() -> RuleRegistryBuilder<P> {
        RuleRegistryBuilder::new()
    }

    /// All rules in application order.
    pub fn rules(&self) -> &[Rule<P>] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Level of the last rule. A plan at this level is done.
    pub fn max_level(&self) -> RuleLevel {
        self.rules.last().map(Rule::level).unwrap_or_default()
    }

    pub fn rule(&self, name: &str) -> Option<&Rule<P>> {
        self.rules.iter().find(|rule| rule.name() == name)
    }

    /// Rules of the lowest level strictly above `level`, in registration order.
    ///
    /// Empty when `level` is at or above the maximum level.
    pub fn next_rules(&self, level: RuleLevel) -> &[Rule<P>] {
        let start = self.rules.partition_point(|rule| rule.level() <= level);
        match self.rules.get(start) {
            Some(first) => {
                let next_level = first.level();
                let end = start
                    + self.rules[start..].partition_point(|rule| rule.level() <= next_level);
                &self.rules[start..end]
            }
            None => &[],
        }
    }

    /// The first rule a plan at `level` has to pass next.
    pub fn next_rule(&self, level: RuleLevel) -> Option<&Rule<P>> {
        self.next_rules(level).first()
    }

    /// Distinct levels in ascending order.
    pub fn levels(&self) -> Vec<RuleLevel> {
        let mut levels: Vec<RuleLevel> = self.rules.iter().map(Rule::level).collect();
        levels.dedup();
        levels
    }
}

pub struct RuleRegistryBuilder<P> {
    rules: Vec<Rule<P>>,
}

impl<P> RuleRegistryBuilder<P> {
    pub fn new() -> Self {
        Self { rules: vec![] }
    }

    /// Adds a rule. Rules sharing a level run in the order they are registered.
    pub fn register<S, T>(mut self, name: S, level: RuleLevel, transform: T) -> Self
    where
        S: Into<String>,
        T: Transform<P> + 'static,
    {
        self.rules.push(Rule::new(name, level, transform));
        self
    }

    pub fn add_rule(mut self, rule: Rule<P>) -> Self {
        self.rules.push(rule);
        self
    }

    /// Validates the rules and sorts them by level.
    pub fn build(self) -> OptResult<RuleRegistry<P>> {
        let mut rules = self.rules;
        if rules.is_empty() {
            return Err(OptimizerError::Configuration(
                "rule registry is empty".to_string(),
            ));
        }

        let mut names = HashSet::with_capacity(rules.len());
        for rule in &rules {
            if rule.level() == 0 {
                return Err(OptimizerError::Configuration(format!(
                    "rule '{}' uses level 0, which is reserved for seeded plans",
                    rule.name()
                )));
            }
            if !names.insert(rule.name().to_string()) {
                return Err(OptimizerError::Configuration(format!(
                    "rule '{}' registered twice",
                    rule.name()
                )));
            }
        }

        // Stable, keeps registration order within a level.
        rules.sort_by_key(Rule::level);
        Ok(RuleRegistry { rules })
    }
}

impl<P> Default for RuleRegistryBuilder<P> {
    fn default() -> Self {
        Self::new()
    }
}
