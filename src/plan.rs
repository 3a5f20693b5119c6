use std::collections::HashSet;

use enumset::EnumSet;
use itertools::Itertools;

use crate::cost::{Cost, Estimate};
use crate::error::{OptResult, OptimizerError};
use crate::expr::Expr;
use crate::operator::{
    Calculation, EnumerateCollection, Filter, Limit, NodeType, Operator, PlanOperator, Return,
    Singleton, Sort, SortElement,
};
use crate::optimizer::OptimizerPlan;
use crate::properties::VariableUsage;

pub type PlanNodeId = u32;

pub type VariableId = u32;

/// One node in a plan.
#[derive(Clone, Debug, PartialEq)]
pub struct PlanNode {
    id: PlanNodeId,
    operator: Operator,
}

impl PlanNode {
    pub fn new(id: PlanNodeId, operator: Operator) -> Self {
        Self { id, operator }
    }

    pub fn id(&self) -> PlanNodeId {
        self.id
    }

    pub fn operator(&self) -> &Operator {
        &self.operator
    }

    pub fn node_type(&self) -> NodeType {
        self.operator.node_type()
    }
}

/// An execution plan.
///
/// The plan is a pipeline: every node consumes the rows produced by the node before it, and
/// the first node is always a [`Singleton`]. Node ids are stable while rules move nodes
/// around, positions are not.
///
/// The variable usage analysis and the cost estimate are cached, every mutation drops both.
#[derive(Clone, Debug)]
pub struct ExecutionPlan {
    nodes: Vec<PlanNode>,
    variables: Vec<String>,
    next_node_id: PlanNodeId,
    var_usage: Option<VariableUsage>,
    estimate: Option<Estimate>,
}

/// Cached analysis results are ignored.
impl PartialEq for ExecutionPlan {
    fn eq(&self, other: &Self) -> bool {
        self.nodes == other.nodes && self.variables == other.variables
    }
}

impl ExecutionPlan {
    fn new() -> Self {
        Self {
            nodes: vec![PlanNode::new(0, Operator::from(Singleton))],
            variables: vec![],
            next_node_id: 1,
            var_usage: None,
            estimate: None,
        }
    }

    pub fn nodes(&self) -> &[PlanNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: PlanNodeId) -> Option<&PlanNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn position(&self, id: PlanNodeId) -> Option<usize> {
        self.nodes.iter().position(|node| node.id == id)
    }

    pub fn variable_name(&self, variable: VariableId) -> Option<&str> {
        self.variables.get(variable as usize).map(String::as_str)
    }

    /// Nodes of the given types, in execution order.
    pub fn find_nodes(&self, types: EnumSet<NodeType>) -> impl Iterator<Item = &PlanNode> {
        self.nodes
            .iter()
            .filter(move |node| types.contains(node.node_type()))
    }

    /// The cached variable usage analysis, if computed since the last change.
    pub fn variable_usage(&self) -> Option<&VariableUsage> {
        self.var_usage.as_ref()
    }

    /// Estimate of the last node, computed once until the plan changes.
    pub fn estimate(&mut self) -> Estimate {
        if let Some(estimate) = self.estimate {
            return estimate;
        }
        let estimate = self
            .nodes
            .iter()
            .fold(Estimate::default(), |input, node| node.operator.estimate(input));
        self.estimate = Some(estimate);
        estimate
    }

    /// Inserts a node at `position`, which must be after the singleton.
    pub fn insert_node(&mut self, position: usize, operator: Operator) -> OptResult<PlanNodeId> {
        if position == 0 || position > self.nodes.len() {
            return Err(OptimizerError::InvalidPlan(format!(
                "can not insert node at position {} of a plan with {} nodes",
                position,
                self.nodes.len()
            )));
        }
        let id = self.next_node_id;
        self.next_node_id += 1;
        self.nodes.insert(position, PlanNode::new(id, operator));
        self.invalidate();
        Ok(id)
    }

    pub fn remove_node(&mut self, id: PlanNodeId) -> OptResult<PlanNode> {
        let position = self.checked_position(id)?;
        self.invalidate();
        Ok(self.nodes.remove(position))
    }

    /// Moves node `id` so that it ends up at `position`.
    pub fn move_node(&mut self, id: PlanNodeId, position: usize) -> OptResult<()> {
        let from = self.checked_position(id)?;
        if position == 0 || position >= self.nodes.len() {
            return Err(OptimizerError::InvalidPlan(format!(
                "can not move node {} to position {}",
                id, position
            )));
        }
        if from != position {
            let node = self.nodes.remove(from);
            self.nodes.insert(position, node);
            self.invalidate();
        }
        Ok(())
    }

    pub fn replace_operator(&mut self, id: PlanNodeId, operator: Operator) -> OptResult<()> {
        let position = self.checked_position(id)?;
        self.nodes[position].operator = operator;
        self.invalidate();
        Ok(())
    }

    /// Reorders the nodes starting at `start`: the node at `start + order[i]` moves to
    /// `start + i`.
    pub fn permute(&mut self, start: usize, order: &[usize]) -> OptResult<()> {
        let end = start + order.len();
        let is_permutation = order.iter().all(|idx| *idx < order.len())
            && order.iter().collect::<HashSet<_>>().len() == order.len();
        if start == 0 || end > self.nodes.len() || !is_permutation {
            return Err(OptimizerError::InvalidPlan(format!(
                "invalid permutation {:?} at position {}",
                order, start
            )));
        }
        let reordered: Vec<PlanNode> = order
            .iter()
            .map(|idx| self.nodes[start + idx].clone())
            .collect();
        self.nodes.splice(start..end, reordered);
        self.invalidate();
        Ok(())
    }

    /// Checks that every variable is set by an earlier node than the ones reading it.
    pub fn validate(&self) -> OptResult<()> {
        match self.nodes.first().map(PlanNode::node_type) {
            Some(NodeType::Singleton) => {}
            _ => {
                return Err(OptimizerError::InvalidPlan(
                    "plan must start with a singleton node".to_string(),
                ))
            }
        }

        let mut valid = HashSet::new();
        for node in &self.nodes[1..] {
            if node.node_type() == NodeType::Singleton {
                return Err(OptimizerError::InvalidPlan(format!(
                    "singleton node {} is not the first node",
                    node.id
                )));
            }
            if let Some(variable) = node
                .operator
                .variables_used()
                .into_iter()
                .find(|variable| !valid.contains(variable))
            {
                return Err(OptimizerError::InvalidPlan(format!(
                    "node {} ({}) uses variable ${} before it is set",
                    node.id,
                    node.operator.name(),
                    variable
                )));
            }
            valid.extend(node.operator.variables_set());
        }
        Ok(())
    }

    /// One line description of the plan, in execution order.
    pub fn explain(&self) -> String {
        self.nodes
            .iter()
            .map(|node| node.operator.describe())
            .join(" -> ")
    }

    fn checked_position(&self, id: PlanNodeId) -> OptResult<usize> {
        match self.position(id) {
            Some(0) => Err(OptimizerError::InvalidPlan(
                "the singleton node can not be changed".to_string(),
            )),
            Some(position) => Ok(position),
            None => Err(OptimizerError::InvalidPlan(format!(
                "plan has no node {}",
                id
            ))),
        }
    }

    fn invalidate(&mut self) {
        self.var_usage = None;
        self.estimate = None;
    }
}

impl OptimizerPlan for ExecutionPlan {
    fn var_usage_computed(&self) -> bool {
        self.var_usage.is_some()
    }

    fn compute_var_usage(&mut self) {
        if self.var_usage.is_none() {
            self.var_usage = Some(VariableUsage::compute(&self.nodes));
        }
    }

    fn estimate_cost(&mut self) -> Cost {
        self.estimate().cost
    }
}

/// Builds an [`ExecutionPlan`] node by node, in execution order.
pub struct ExecutionPlanBuilder {
    plan: ExecutionPlan,
}

impl ExecutionPlanBuilder {
    pub fn new() -> Self {
        Self {
            plan: ExecutionPlan::new(),
        }
    }

    fn add(&mut self, operator: Operator) -> &mut Self {
        let id = self.plan.next_node_id;
        self.plan.next_node_id += 1;
        self.plan.nodes.push(PlanNode::new(id, operator));
        self
    }

    fn create_variable<S: Into<String>>(&mut self, name: S) -> VariableId {
        self.plan.variables.push(name.into());
        (self.plan.variables.len() - 1) as VariableId
    }

    /// Adds a loop over `collection` and returns the variable holding its documents.
    pub fn enumerate_collection<S: Into<String>>(
        &mut self,
        collection: S,
        documents: u64,
    ) -> VariableId {
        let collection = collection.into();
        let variable = self.create_variable(collection.clone());
        self.add(Operator::from(EnumerateCollection::new(
            collection, variable, documents,
        )));
        variable
    }

    /// Adds a calculation and returns the variable holding its result.
    pub fn calculation(&mut self, expr: Expr) -> VariableId {
        let variable = self.create_variable(format!("#{}", self.plan.variables.len()));
        self.add(Operator::from(Calculation::new(expr, variable)));
        variable
    }

    pub fn filter(&mut self, variable: VariableId) -> &mut Self {
        self.add(Operator::from(Filter::new(variable)))
    }

    pub fn sort(&mut self, elements: Vec<SortElement>) -> &mut Self {
        self.add(Operator::from(Sort::new(elements)))
    }

    pub fn limit(&mut self, offset: u64, count: u64) -> &mut Self {
        self.add(Operator::from(Limit::new(offset, count)))
    }

    pub fn return_variable(&mut self, variable: VariableId) -> &mut Self {
        self.add(Operator::from(Return::new(variable)))
    }

    pub fn build(self) -> OptResult<ExecutionPlan> {
        self.plan.validate()?;
        Ok(self.plan)
    }
}

impl Default for ExecutionPlanBuilder {
    fn default() -> Self {
        Self::new()
    }
}
