use std::collections::VecDeque;

use crate::rules::RuleLevel;

/// A plan together with the level of the last rule it has passed.
#[derive(Debug, Clone, PartialEq)]
pub struct LeveledPlan<P> {
    pub plan: P,
    pub level: RuleLevel,
}

impl<P> LeveledPlan<P> {
    pub fn new(plan: P, level: RuleLevel) -> Self {
        Self { plan, level }
    }
}

/// One generation of candidate plans.
///
/// Plans are owned by exactly one list at a time and leave it in insertion order.
#[derive(Debug)]
pub struct PlanList<P> {
    entries: VecDeque<LeveledPlan<P>>,
}

impl<P> PlanList<P> {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
        }
    }

    /// A list holding only `plan`, at level `0`.
    pub fn seed(plan: P) -> Self {
        Self::seed_at(plan, 0)
    }

    pub fn seed_at(plan: P, level: RuleLevel) -> Self {
        let mut list = Self::new();
        list.push(plan, level);
        list
    }

    pub fn push(&mut self, plan: P, level: RuleLevel) {
        self.entries.push_back(LeveledPlan::new(plan, level));
    }

    pub fn pop_front(&mut self) -> Option<LeveledPlan<P>> {
        self.entries.pop_front()
    }

    /// Moves every entry of `other` to the end of this list.
    pub fn append(&mut self, other: &mut PlanList<P>) {
        self.entries.append(&mut other.entries);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Level of the least progressed plan, `None` for an empty list.
    pub fn minimum_level(&self) -> Option<RuleLevel> {
        self.entries.iter().map(|entry| entry.level).min()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LeveledPlan<P>> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut LeveledPlan<P>> {
        self.entries.iter_mut()
    }
}

impl<P> Default for PlanList<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> IntoIterator for PlanList<P> {
    type Item = LeveledPlan<P>;
    type IntoIter = std::collections::vec_deque::IntoIter<LeveledPlan<P>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<P> FromIterator<LeveledPlan<P>> for PlanList<P> {
    fn from_iter<I: IntoIterator<Item = LeveledPlan<P>>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
