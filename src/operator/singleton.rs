use crate::cost::Estimate;
use crate::operator::PlanOperator;

/// Root of every plan, produces exactly one empty row.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Singleton;

impl PlanOperator for Singleton {
    fn estimate(&self, _input: Estimate) -> Estimate {
        Estimate::new(1.0, 1.0)
    }

    fn describe(&self) -> String {
        "Singleton".to_string()
    }
}
