use crate::cost::{Cost, Estimate};
use crate::operator::PlanOperator;

#[derive(Clone, Debug, PartialEq)]
pub struct Limit {
    offset: u64,
    count: u64,
}

impl Limit {
    pub fn new(offset: u64, count: u64) -> Self {
        Self { offset, count }
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn count(&self) -> u64 {
        self.count
    }
}

impl PlanOperator for Limit {
    fn estimate(&self, input: Estimate) -> Estimate {
        let items = (input.items - self.offset as f64)
            .max(0.0)
            .min(self.count as f64);
        Estimate {
            items,
            cost: input.cost + Cost::from(items),
        }
    }

    fn describe(&self) -> String {
        format!("Limit({}, {})", self.offset, self.count)
    }
}
