//! Result ordering
//!
//! Multi-key, stable sort. Keys are fields or functions of the row; each key
//! is resolved once per row before sorting.

use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::row::Row;
use crate::filter::ValueFn;

/// Field name or computed sort key
#[derive(Clone)]
pub enum SortKey {
    Field(String),
    Computed(ValueFn),
}

impl SortKey {
    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(&Row) -> Value + 'static,
    {
        SortKey::Computed(Rc::new(f))
    }

    /// Sort value of a row; `None` when the field is absent
    fn resolve(&self, row: &Row) -> Option<Value> {
        match self {
            SortKey::Field(field) => row.get(field).cloned(),
            SortKey::Computed(f) => Some(f(row)),
        }
    }
}

impl fmt::Debug for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortKey::Field(field) => f.debug_tuple("Field").field(field).finish(),
            SortKey::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

impl From<&str> for SortKey {
    fn from(field: &str) -> Self {
        SortKey::Field(field.to_string())
    }
}

impl From<String> for SortKey {
    fn from(field: String) -> Self {
        SortKey::Field(field)
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown sort direction: {0}")]
pub struct UnknownSortDirection(pub String);

impl FromStr for SortDirection {
    type Err = UnknownSortDirection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            _ => Err(UnknownSortDirection(s.to_string())),
        }
    }
}

/// One ordering key with its direction
#[derive(Debug, Clone)]
pub struct OrderSpec {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl OrderSpec {
    pub fn new(key: impl Into<SortKey>, direction: SortDirection) -> Self {
        Self {
            key: key.into(),
            direction,
        }
    }
}

/// Sorts rows by `order`; equal rows keep their relative order.
pub fn sort_rows(rows: Vec<Row>, order: &[OrderSpec]) -> Vec<Row> {
    if order.is_empty() || rows.len() < 2 {
        return rows;
    }

    let mut keyed: Vec<(Vec<Option<Value>>, Row)> = rows
        .into_iter()
        .map(|row| {
            let keys = order.iter().map(|spec| spec.key.resolve(&row)).collect();
            (keys, row)
        })
        .collect();

    keyed.sort_by(|(a, _), (b, _)| {
        order
            .iter()
            .zip(a.iter().zip(b.iter()))
            .map(|(spec, (a, b))| {
                let ordering = compare_sort_values(a.as_ref(), b.as_ref());
                match spec.direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            })
            .find(|ordering| *ordering != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    });

    keyed.into_iter().map(|(_, row)| row).collect()
}

/// Total order over sort values.
///
/// - absent < null < bool < number < string < array < object
/// - natural ordering within bool, number and string
/// - arrays and objects compare equal among themselves
pub fn compare_sort_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => {
            let rank = |v: &Value| -> u8 {
                match v {
                    Value::Null => 0,
                    Value::Bool(_) => 1,
                    Value::Number(_) => 2,
                    Value::String(_) => 3,
                    Value::Array(_) => 4,
                    Value::Object(_) => 5,
                }
            };

            match rank(a).cmp(&rank(b)) {
                Ordering::Equal => {}
                other => return other,
            }

            match (a, b) {
                (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
                (Value::Number(a), Value::Number(b)) => {
                    let a = a.as_f64().unwrap_or(0.0);
                    let b = b.as_f64().unwrap_or(0.0);
                    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
                }
                (Value::String(a), Value::String(b)) => a.cmp(b),
                _ => Ordering::Equal,
            }
        }
    }
}
