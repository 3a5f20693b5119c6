//! Expressions evaluated by calculation nodes.

use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

use smallvec::SmallVec;
use strum_macros::{Display as StrumDisplay, EnumIter};

use crate::plan::VariableId;

pub type VariableList = SmallVec<[VariableId; 4]>;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    String(String),
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::String(s) => write!(f, "{:?}", s),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, StrumDisplay, EnumIter)]
pub enum CompareOp {
    #[strum(serialize = "==")]
    Eq,
    #[strum(serialize = "!=")]
    NotEq,
    #[strum(serialize = "<")]
    Lt,
    #[strum(serialize = "<=")]
    LtEq,
    #[strum(serialize = ">")]
    Gt,
    #[strum(serialize = ">=")]
    GtEq,
}

impl CompareOp {
    fn matches(&self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::NotEq => ordering != Ordering::Equal,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::LtEq => ordering != Ordering::Greater,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::GtEq => ordering != Ordering::Less,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Literal(Value),
    Variable(VariableId),
    Attribute(Box<Expr>, String),
    Compare(CompareOp, Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
}

impl Expr {
    pub fn bool(value: bool) -> Self {
        Expr::Literal(Value::Bool(value))
    }

    pub fn int(value: i64) -> Self {
        Expr::Literal(Value::Int(value))
    }

    pub fn string<S: Into<String>>(value: S) -> Self {
        Expr::Literal(Value::String(value.into()))
    }

    pub fn var(variable: VariableId) -> Self {
        Expr::Variable(variable)
    }

    pub fn attr<S: Into<String>>(self, name: S) -> Self {
        Expr::Attribute(Box::new(self), name.into())
    }

    pub fn compare(self, op: CompareOp, other: Expr) -> Self {
        Expr::Compare(op, Box::new(self), Box::new(other))
    }

    pub fn eq_to(self, other: Expr) -> Self {
        self.compare(CompareOp::Eq, other)
    }

    pub fn gt(self, other: Expr) -> Self {
        self.compare(CompareOp::Gt, other)
    }

    pub fn lt(self, other: Expr) -> Self {
        self.compare(CompareOp::Lt, other)
    }

    pub fn and(self, other: Expr) -> Self {
        Expr::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Expr) -> Self {
        Expr::Or(Box::new(self), Box::new(other))
    }

    pub fn negate(self) -> Self {
        Expr::Not(Box::new(self))
    }

    /// Variables referenced anywhere in the expression, without duplicates.
    pub fn variables(&self) -> VariableList {
        let mut variables = VariableList::new();
        self.collect_variables(&mut variables);
        variables
    }

    fn collect_variables(&self, variables: &mut VariableList) {
        match self {
            Expr::Literal(_) => {}
            Expr::Variable(variable) => {
                if !variables.contains(variable) {
                    variables.push(*variable);
                }
            }
            Expr::Attribute(expr, _) | Expr::Not(expr) => expr.collect_variables(variables),
            Expr::Compare(_, left, right) | Expr::And(left, right) | Expr::Or(left, right) => {
                left.collect_variables(variables);
                right.collect_variables(variables);
            }
        }
    }

    /// Folds an expression that does not depend on any variable.
    pub fn constant_value(&self) -> Option<Value> {
        match self {
            Expr::Literal(value) => Some(value.clone()),
            Expr::Variable(_) | Expr::Attribute(_, _) => None,
            Expr::Compare(op, left, right) => {
                let left = left.constant_value()?;
                let right = right.constant_value()?;
                Some(Value::Bool(op.matches(left.cmp(&right))))
            }
            Expr::And(left, right) => {
                match (left.constant_bool(), right.constant_bool()) {
                    (Some(false), _) | (_, Some(false)) => Some(Value::Bool(false)),
                    (Some(true), Some(true)) => Some(Value::Bool(true)),
                    _ => None,
                }
            }
            Expr::Or(left, right) => match (left.constant_bool(), right.constant_bool()) {
                (Some(true), _) | (_, Some(true)) => Some(Value::Bool(true)),
                (Some(false), Some(false)) => Some(Value::Bool(false)),
                _ => None,
            },
            Expr::Not(expr) => expr.constant_bool().map(|b| Value::Bool(!b)),
        }
    }

    /// Truthiness of a constant expression: `null`, `false`, `0` and `""` are false.
    pub fn constant_bool(&self) -> Option<bool> {
        self.constant_value().map(|value| match value {
            Value::Null => false,
            Value::Bool(b) => b,
            Value::Int(i) => i != 0,
            Value::String(s) => !s.is_empty(),
        })
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::Literal(value) => write!(f, "{}", value),
            Expr::Variable(variable) => write!(f, "${}", variable),
            Expr::Attribute(expr, name) => write!(f, "{}.{}", expr, name),
            Expr::Compare(op, left, right) => write!(f, "{} {} {}", left, op, right),
            Expr::And(left, right) => write!(f, "({} && {})", left, right),
            Expr::Or(left, right) => write!(f, "({} || {})", left, right),
            Expr::Not(expr) => write!(f, "!{}", expr),
        }
    }
}
