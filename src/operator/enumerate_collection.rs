use smallvec::smallvec;

use crate::cost::{Cost, Estimate};
use crate::expr::VariableList;
use crate::operator::PlanOperator;
use crate::plan::VariableId;

/// Iterates over every document of a collection, once per incoming row.
#[derive(Clone, Debug, PartialEq)]
pub struct EnumerateCollection {
    collection: String,
    out_variable: VariableId,
    /// Number of documents in the collection, as known when planning.
    documents: u64,
}

impl EnumerateCollection {
    pub fn new<S: Into<String>>(collection: S, out_variable: VariableId, documents: u64) -> Self {
        Self {
            collection: collection.into(),
            out_variable,
            documents,
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn out_variable(&self) -> VariableId {
        self.out_variable
    }

    pub fn documents(&self) -> u64 {
        self.documents
    }
}

impl PlanOperator for EnumerateCollection {
    fn estimate(&self, input: Estimate) -> Estimate {
        let items = input.items * self.documents as f64;
        Estimate {
            items,
            cost: input.cost + Cost::from(items),
        }
    }

    fn variables_set(&self) -> VariableList {
        smallvec![self.out_variable]
    }

    fn describe(&self) -> String {
        format!("EnumerateCollection({} -> ${})", self.collection, self.out_variable)
    }
}
