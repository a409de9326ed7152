//! Filter condition types
//!
//! A condition is one tagged comparison, grouping or predicate unit.
//! Values may be literals or functions of the row under test.

use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use serde_json::{Map, Value};

use crate::index::{canonical_json, FieldSpec};
use crate::query::Row;

/// Value computed from the row under test
pub type ValueFn = Rc<dyn Fn(&Row) -> Value>;

/// Boolean test of the row under test
pub type PredicateFn = Rc<dyn Fn(&Row) -> bool>;

/// How a condition combines with the running result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conjunction {
    And,
    Or,
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "<>",
            Operator::Lt => "<",
            Operator::Gt => ">",
            Operator::Le => "<=",
            Operator::Ge => ">=",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown operator text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownOperator(pub String);

impl fmt::Display for UnknownOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown operator: {}", self.0)
    }
}

impl std::error::Error for UnknownOperator {}

impl FromStr for Operator {
    type Err = UnknownOperator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "=" => Ok(Operator::Eq),
            "<>" | "!=" => Ok(Operator::Ne),
            "<" => Ok(Operator::Lt),
            ">" => Ok(Operator::Gt),
            "<=" => Ok(Operator::Le),
            ">=" => Ok(Operator::Ge),
            other => Err(UnknownOperator(other.to_string())),
        }
    }
}

/// Literal value or a function of the row under test
#[derive(Clone)]
pub enum Operand {
    Literal(Value),
    Computed(ValueFn),
}

impl Operand {
    /// Operand computed from each row at evaluation time
    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(&Row) -> Value + 'static,
    {
        Operand::Computed(Rc::new(f))
    }

    pub fn is_computed(&self) -> bool {
        matches!(self, Operand::Computed(_))
    }

    pub fn as_literal(&self) -> Option<&Value> {
        match self {
            Operand::Literal(value) => Some(value),
            Operand::Computed(_) => None,
        }
    }

    /// The value for one row
    pub fn resolve(&self, row: &Row) -> Cow<'_, Value> {
        match self {
            Operand::Literal(value) => Cow::Borrowed(value),
            Operand::Computed(f) => Cow::Owned(f(row)),
        }
    }
}

impl fmt::Debug for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Operand::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

impl From<Value> for Operand {
    fn from(value: Value) -> Self {
        Operand::Literal(value)
    }
}

impl From<&Value> for Operand {
    fn from(value: &Value) -> Self {
        Operand::Literal(value.clone())
    }
}

impl From<&str> for Operand {
    fn from(value: &str) -> Self {
        Operand::Literal(Value::from(value))
    }
}

impl From<String> for Operand {
    fn from(value: String) -> Self {
        Operand::Literal(Value::from(value))
    }
}

macro_rules! literal_operand {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Operand {
                fn from(value: $ty) -> Self {
                    Operand::Literal(Value::from(value))
                }
            }
        )*
    };
}

literal_operand!(i32, i64, u32, u64, f64, bool);

impl<T: Into<Value>> From<Vec<T>> for Operand {
    fn from(values: Vec<T>) -> Self {
        Operand::Literal(Value::Array(values.into_iter().map(Into::into).collect()))
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Operand {
    fn from(values: [T; N]) -> Self {
        Operand::Literal(Value::Array(values.into_iter().map(Into::into).collect()))
    }
}

/// Immutable membership set over literal values.
///
/// Members are compared by canonical JSON, so `1` and `1.0` are the same
/// member while `1` and `"1"` are not.
#[derive(Debug, Clone, Default)]
pub struct ValueSet {
    members: Vec<Value>,
    keys: HashSet<String>,
}

impl ValueSet {
    pub fn from_values<I: IntoIterator<Item = Value>>(values: I) -> Self {
        let mut set = ValueSet::default();
        for value in values {
            if set.keys.insert(canonical_json(&value)) {
                set.members.push(value);
            }
        }
        set
    }

    pub fn contains(&self, value: &Value) -> bool {
        self.keys.contains(&canonical_json(value))
    }

    /// Distinct members in first-seen order
    pub fn members(&self) -> &[Value] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Candidate values of an `in` condition
#[derive(Debug, Clone)]
pub enum InValues {
    /// Static literals against a single field
    Set(ValueSet),
    /// Array value, possibly computed, possibly of tuples
    Operand(Operand),
}

/// Operator-specific part of a condition
#[derive(Clone)]
pub enum ConditionKind {
    Compare {
        property: FieldSpec,
        operator: Operator,
        value: Operand,
    },
    Between {
        property: FieldSpec,
        value: Operand,
    },
    In {
        property: FieldSpec,
        value: InValues,
    },
    Object(Map<String, Value>),
    Predicate(PredicateFn),
    Group(Vec<Condition>),
}

impl fmt::Debug for ConditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionKind::Compare {
                property,
                operator,
                value,
            } => write!(f, "{} {} {:?}", property, operator, value),
            ConditionKind::Between { property, value } => {
                write!(f, "{} between {:?}", property, value)
            }
            ConditionKind::In { property, value } => write!(f, "{} in {:?}", property, value),
            ConditionKind::Object(map) => write!(f, "matches {:?}", map),
            ConditionKind::Predicate(_) => f.write_str("predicate(..)"),
            ConditionKind::Group(conditions) => f.debug_list().entries(conditions).finish(),
        }
    }
}

impl ConditionKind {
    /// `in` condition; static literal arrays against a single field become
    /// a `ValueSet`.
    pub fn in_values(property: FieldSpec, value: Operand) -> ConditionKind {
        let value = match (&property, value) {
            (FieldSpec::Single(_), Operand::Literal(Value::Array(items))) => {
                InValues::Set(ValueSet::from_values(items))
            }
            (_, value) => InValues::Operand(value),
        };
        ConditionKind::In { property, value }
    }
}

/// One filter condition
#[derive(Debug, Clone)]
pub struct Condition {
    pub not: bool,
    pub conjunction: Conjunction,
    pub kind: ConditionKind,
}

impl Condition {
    /// Non-negated AND condition
    pub fn new(kind: ConditionKind) -> Self {
        Self {
            not: false,
            conjunction: Conjunction::And,
            kind,
        }
    }

    pub fn with_conjunction(mut self, conjunction: Conjunction) -> Self {
        self.conjunction = conjunction;
        self
    }

    pub fn negated(mut self, not: bool) -> Self {
        self.not = not;
        self
    }
}
