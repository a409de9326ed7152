//! Filter evaluation
//!
//! Evaluates accumulated conditions against one row:
//! - Comparison, range, membership, object-match, predicate and group
//!   conditions
//! - AND/OR accumulation in input order, NOT applied per condition
//! - No type coercion beyond numeric equality

mod compare;
mod condition;
mod evaluator;

pub use compare::{compare_values, values_equal};
pub use condition::{
    Condition, ConditionKind, Conjunction, InValues, Operand, Operator, PredicateFn,
    UnknownOperator, ValueFn, ValueSet,
};
pub use evaluator::matches;
