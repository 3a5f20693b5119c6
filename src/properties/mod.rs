//! Properties derived from a whole plan.

mod variables;
pub use variables::*;
