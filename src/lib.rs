//! ## Background
//!
//! A query optimizer accepts an unoptimized execution plan and outputs a plan that is cheaper
//! to execute. Pure rewrite systems apply rules until a fix point is reached, which works well
//! for rules that always improve a plan but can not explore alternatives. Cost based search
//! explores alternatives, but usually needs a memo structure and a representation of plan
//! groups.
//!
//! This crate implements a middle ground, in the style of the AQL optimizer of ArangoDB [1]:
//! every rule has a level, rules may emit several alternative plans, and the optimizer keeps a
//! list of whole plans, each tagged with the level of the last rule it went through. Once every
//! plan has passed the highest level, the plans are ranked by estimated cost.
//!
//! ## Design
//!
//! ### Rules and levels
//!
//! A [`rules::RuleRegistry`] holds rules sorted by level. A plan at level `l` is handed to the
//! rules of the smallest level above `l`, and every plan a rule emits carries a level no lower
//! than the rule's own. Plans therefore only move forward, and the number of passes is bounded
//! by the number of distinct levels.
//!
//! ### Leveled optimizer
//!
//! [`leveled::LeveledOptimizer`] drives the passes, caps the number of plans alive at once,
//! optionally advances plans on the rayon pool, and reports its progress through the `log`
//! facade and an optional [`listener::OptimizerListener`].
//!
//! ### Execution plans
//!
//! The optimizer is generic over [`optimizer::OptimizerPlan`]. [`plan::ExecutionPlan`] is a
//! pipeline of [`operator::Operator`]s with a simple cost model, and
//! [`rules::catalog`] contains rewrite rules for it.
//!
//! ## Reference
//!
//! 1. ArangoDB documentation, "The AQL query optimizer".

#[macro_use]
extern crate prettytable;
#[macro_use]
extern crate lazy_static;

pub mod cost;
pub mod error;
pub mod expr;
pub mod leveled;
pub mod listener;
pub mod operator;
pub mod optimizer;
pub mod plan;
pub mod properties;
pub mod rules;
