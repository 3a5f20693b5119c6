//! Implementation of the leveled optimizer.
//!
//! The leveled optimizer runs a registry of rules in passes. Every plan remembers the level
//! of the last rule it went through, each pass moves the least progressed plans to the next
//! level, and rules may fork a plan into alternatives. When every plan has reached the
//! highest level, or the number of plans reaches a configured cap, the plans are ranked by
//! their estimated cost.

mod optimizer;
pub use optimizer::*;
mod plan_list;
pub use plan_list::*;
mod ranking;
pub use ranking::*;
