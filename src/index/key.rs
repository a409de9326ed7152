//! Key derivation
//!
//! Keys are opaque strings derived from one field (simple key) or an
//! ordered list of fields (composite key). Equal field tuples always
//! produce equal keys.

use std::collections::BTreeMap;

use serde_json::{Map, Number, Value};

/// Converts a key value (scalar or composite tuple) into a string key.
pub type KeyFunction = fn(&Value) -> String;

/// One field name or an ordered list of field names.
///
/// Used for primary keys, foreign keys and condition properties.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldSpec {
    Single(String),
    Composite(Vec<String>),
}

impl FieldSpec {
    pub fn is_composite(&self) -> bool {
        matches!(self, FieldSpec::Composite(_))
    }

    /// Field names in declaration order
    pub fn names(&self) -> Vec<&str> {
        match self {
            FieldSpec::Single(name) => vec![name.as_str()],
            FieldSpec::Composite(names) => names.iter().map(String::as_str).collect(),
        }
    }

    /// Appends a field, turning a simple key into a composite one.
    pub fn push(self, field: impl Into<String>) -> Self {
        match self {
            FieldSpec::Single(first) => FieldSpec::Composite(vec![first, field.into()]),
            FieldSpec::Composite(mut names) => {
                names.push(field.into());
                FieldSpec::Composite(names)
            }
        }
    }

    /// Reads the field(s) from a record. Composite specs produce an array
    /// tuple; missing fields read as null.
    pub fn read(&self, record: &Value) -> Value {
        match self {
            FieldSpec::Single(name) => field_value(record, name).cloned().unwrap_or(Value::Null),
            FieldSpec::Composite(names) => Value::Array(
                names
                    .iter()
                    .map(|name| field_value(record, name).cloned().unwrap_or(Value::Null))
                    .collect(),
            ),
        }
    }
}

impl std::fmt::Display for FieldSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldSpec::Single(name) => write!(f, "{}", name),
            FieldSpec::Composite(names) => write!(f, "[{}]", names.join(", ")),
        }
    }
}

impl From<&str> for FieldSpec {
    fn from(name: &str) -> Self {
        FieldSpec::Single(name.to_string())
    }
}

impl From<String> for FieldSpec {
    fn from(name: String) -> Self {
        FieldSpec::Single(name)
    }
}

impl From<&String> for FieldSpec {
    fn from(name: &String) -> Self {
        FieldSpec::Single(name.clone())
    }
}

impl From<Vec<&str>> for FieldSpec {
    fn from(names: Vec<&str>) -> Self {
        FieldSpec::Composite(names.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<String>> for FieldSpec {
    fn from(names: Vec<String>) -> Self {
        FieldSpec::Composite(names)
    }
}

impl<const N: usize> From<[&str; N]> for FieldSpec {
    fn from(names: [&str; N]) -> Self {
        FieldSpec::Composite(names.iter().map(|name| name.to_string()).collect())
    }
}

/// Field lookup on a record-shaped value
pub fn field_value<'a>(record: &'a Value, field: &str) -> Option<&'a Value> {
    match record {
        Value::Object(map) => map.get(field),
        _ => None,
    }
}

/// Whether a value is record shaped (an object, not a key or key tuple)
pub fn is_record(value: &Value) -> bool {
    value.is_object()
}

/// Whether a value is a non-empty array whose every element is an array
pub fn is_array_of_arrays(value: &Value) -> bool {
    match value {
        Value::Array(items) => !items.is_empty() && items.iter().all(Value::is_array),
        _ => false,
    }
}

/// Default key function.
///
/// Scalars are stringified directly (null becomes the empty string),
/// arrays and objects are written as canonical JSON.
pub fn default_key_function(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => number_key(n),
        Value::String(s) => s.clone(),
        Value::Array(_) | Value::Object(_) => canonical_json(value),
    }
}

/// Canonical JSON text: integral floats are written as integers so that
/// `1` and `1.0` produce the same text, and object keys are sorted.
pub fn canonical_json(value: &Value) -> String {
    normalize(value).to_string()
}

fn normalize(value: &Value) -> Value {
    match value {
        Value::Number(n) => match integral(n) {
            Some(i) => Value::from(i),
            None => Value::Number(n.clone()),
        },
        Value::Array(items) => Value::Array(items.iter().map(normalize).collect()),
        Value::Object(map) => {
            let sorted: BTreeMap<&String, &Value> = map.iter().collect();
            let normalized: Map<String, Value> = sorted
                .into_iter()
                .map(|(key, item)| (key.clone(), normalize(item)))
                .collect();
            Value::Object(normalized)
        }
        other => other.clone(),
    }
}

fn integral(n: &Number) -> Option<i64> {
    if let Some(i) = n.as_i64() {
        return Some(i);
    }
    let f = n.as_f64()?;
    if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

fn number_key(n: &Number) -> String {
    match (n.as_u64(), integral(n)) {
        (Some(u), _) => u.to_string(),
        (None, Some(i)) => i.to_string(),
        _ => n.to_string(),
    }
}

/// Computes the key of a record or raw key value.
///
/// Simple keys read the field from a record (or take a raw value as the
/// key itself) and stringify it. Composite keys always go through
/// `key_function`, reading the tuple from the record when given one.
pub fn compute_key(key_field: &FieldSpec, key_function: KeyFunction, value: &Value) -> String {
    match key_field {
        FieldSpec::Single(field) => {
            if is_record(value) {
                default_key_function(field_value(value, field).unwrap_or(&Value::Null))
            } else {
                default_key_function(value)
            }
        }
        FieldSpec::Composite(_) => {
            if is_record(value) {
                key_function(&key_field.read(value))
            } else {
                key_function(value)
            }
        }
    }
}

/// One foreign key, or several when the value holds a batch of keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForeignKey {
    One(String),
    Many(Vec<String>),
}

impl ForeignKey {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            ForeignKey::One(key) => vec![key],
            ForeignKey::Many(keys) => keys,
        }
    }
}

/// Computes the foreign key(s) held by a record or raw value that
/// reference a model keyed by `pk_field`.
///
/// - raw scalar value: one key
/// - raw array: a batch for simple keys, one tuple for composite keys
///   unless it is an array of arrays
/// - record with `fk_field`: the same rules applied to the field value,
///   where a composite `fk_field` always forms a single tuple
pub fn compute_foreign_key(
    value: &Value,
    pk_field: &FieldSpec,
    key_function: KeyFunction,
    fk_field: Option<&FieldSpec>,
) -> ForeignKey {
    let composite_pk = pk_field.is_composite();

    let (fk_value, batch) = match fk_field {
        Some(fk_field) if is_record(value) => {
            let fk_value = fk_field.read(value);
            let batch = match fk_field {
                FieldSpec::Composite(_) => false,
                FieldSpec::Single(_) if composite_pk => is_array_of_arrays(&fk_value),
                FieldSpec::Single(_) => fk_value.is_array(),
            };
            (fk_value, batch)
        }
        _ => {
            let batch = if composite_pk {
                is_array_of_arrays(value)
            } else {
                value.is_array()
            };
            (value.clone(), batch)
        }
    };

    match fk_value {
        Value::Array(values) if batch => ForeignKey::Many(values.iter().map(key_function).collect()),
        other => ForeignKey::One(key_function(&other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_key_function() {
        assert_eq!(default_key_function(&json!(7)), "7");
        assert_eq!(default_key_function(&json!(7.0)), "7");
        assert_eq!(default_key_function(&json!(0)), "0");
        assert_eq!(default_key_function(&json!("abc")), "abc");
        assert_eq!(default_key_function(&Value::Null), "");
        assert_eq!(default_key_function(&json!([101, 1])), "[101,1]");
        assert_eq!(default_key_function(&json!([101.0, "a"])), "[101,\"a\"]");
        assert_eq!(default_key_function(&json!({"b": 2, "a": 1.0})), "{\"a\":1,\"b\":2}");
    }

    #[test]
    fn test_compute_key_single() {
        let field = FieldSpec::from("id");
        assert_eq!(compute_key(&field, default_key_function, &json!({"id": 3})), "3");
        assert_eq!(compute_key(&field, default_key_function, &json!(3)), "3");
        assert_eq!(compute_key(&field, default_key_function, &json!({"name": "x"})), "");
    }

    #[test]
    fn test_compute_key_composite() {
        let field = FieldSpec::from(["orderId", "itemId"]);
        let record = json!({"orderId": 101, "itemId": 2, "quantity": 5});
        assert_eq!(compute_key(&field, default_key_function, &record), "[101,2]");
        assert_eq!(compute_key(&field, default_key_function, &json!([101, 2])), "[101,2]");
    }

    #[test]
    fn test_field_spec_push() {
        let spec = FieldSpec::from("orderId").push("itemId");
        assert_eq!(spec, FieldSpec::from(vec!["orderId", "itemId"]));
        let spec = spec.push("lineNo");
        assert_eq!(spec.names(), vec!["orderId", "itemId", "lineNo"]);
    }

    #[test]
    fn test_foreign_key_raw_values() {
        let simple = FieldSpec::from("id");
        assert_eq!(
            compute_foreign_key(&json!(4), &simple, default_key_function, None),
            ForeignKey::One("4".into())
        );
        assert_eq!(
            compute_foreign_key(&json!([1, 2]), &simple, default_key_function, None),
            ForeignKey::Many(vec!["1".into(), "2".into()])
        );

        let composite = FieldSpec::from(["orderId", "itemId"]);
        assert_eq!(
            compute_foreign_key(&json!([101, 1]), &composite, default_key_function, None),
            ForeignKey::One("[101,1]".into())
        );
        assert_eq!(
            compute_foreign_key(&json!([[101, 1], [102, 1]]), &composite, default_key_function, None),
            ForeignKey::Many(vec!["[101,1]".into(), "[102,1]".into()])
        );
    }

    #[test]
    fn test_foreign_key_from_record() {
        let simple = FieldSpec::from("id");
        let order = json!({"id": 101, "userId": 1});
        assert_eq!(
            compute_foreign_key(&order, &simple, default_key_function, Some(&"userId".into())),
            ForeignKey::One("1".into())
        );

        let user = json!({"id": 1, "favoriteItemIds": [1, 2]});
        assert_eq!(
            compute_foreign_key(&user, &simple, default_key_function, Some(&"favoriteItemIds".into())),
            ForeignKey::Many(vec!["1".into(), "2".into()])
        );

        let composite = FieldSpec::from(["orderId", "itemId"]);
        let shipment = json!({"orderId": 101, "itemId": 2, "lines": [[101, 1], [101, 2]]});
        assert_eq!(
            compute_foreign_key(
                &shipment,
                &composite,
                default_key_function,
                Some(&FieldSpec::from(["orderId", "itemId"]))
            ),
            ForeignKey::One("[101,2]".into())
        );
        assert_eq!(
            compute_foreign_key(&shipment, &composite, default_key_function, Some(&"lines".into())),
            ForeignKey::Many(vec!["[101,1]".into(), "[101,2]".into()])
        );
    }
}
