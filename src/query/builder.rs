//! Query builder
//!
//! A query accumulates conditions, ordering and relation sub-queries for
//! one model type. Builder methods consume and return the query so calls
//! chain; they never fail. An error found while building (an unknown
//! relation path, for instance) is kept and returned by the first
//! execution.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use super::aggregate;
use super::executor;
use super::row::{Row, RowSet};
use super::sorter::{OrderSpec, SortDirection, SortKey};
use crate::database::Database;
use crate::error::{Error, Result};
use crate::filter::{Condition, ConditionKind, Conjunction, Operand, Operator, PredicateFn};
use crate::index::FieldSpec;
use crate::model::ModelError;
use crate::observability::Logger;
use crate::record::Model;

/// Relation field to the sub-query applied when that field is read
pub type RelationQueries = IndexMap<String, Query>;

/// Argument of `where_` and its variants
#[derive(Clone)]
pub enum Clause {
    /// `(field, value)` or `(field, operator, value)`
    Compare {
        property: FieldSpec,
        operator: Operator,
        value: Operand,
    },
    /// Every listed field must equal the given value
    Object(Map<String, Value>),
    Predicate(PredicateFn),
    /// Non-object value; recorded as a build error
    Invalid(Value),
}

impl Clause {
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&Row) -> bool + 'static,
    {
        Clause::Predicate(Rc::new(f))
    }

    fn into_kind(self) -> std::result::Result<ConditionKind, Value> {
        match self {
            Clause::Compare {
                property,
                operator,
                value,
            } => Ok(ConditionKind::Compare {
                property,
                operator,
                value,
            }),
            Clause::Object(map) => Ok(ConditionKind::Object(map)),
            Clause::Predicate(predicate) => Ok(ConditionKind::Predicate(predicate)),
            Clause::Invalid(value) => Err(value),
        }
    }
}

impl<F: Into<FieldSpec>, V: Into<Operand>> From<(F, V)> for Clause {
    fn from((property, value): (F, V)) -> Self {
        Clause::Compare {
            property: property.into(),
            operator: Operator::Eq,
            value: value.into(),
        }
    }
}

impl<F: Into<FieldSpec>, V: Into<Operand>> From<(F, Operator, V)> for Clause {
    fn from((property, operator, value): (F, Operator, V)) -> Self {
        Clause::Compare {
            property: property.into(),
            operator,
            value: value.into(),
        }
    }
}

impl From<Map<String, Value>> for Clause {
    fn from(map: Map<String, Value>) -> Self {
        Clause::Object(map)
    }
}

/// Object values match field by field; any other value is a build error.
impl From<Value> for Clause {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Clause::Object(map),
            other => Clause::Invalid(other),
        }
    }
}

/// Relation path: dot-separated string or list of relation fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationPath(Vec<String>);

impl RelationPath {
    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl From<&str> for RelationPath {
    fn from(path: &str) -> Self {
        RelationPath(
            path.split('.')
                .filter(|segment| !segment.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }
}

impl From<String> for RelationPath {
    fn from(path: String) -> Self {
        RelationPath::from(path.as_str())
    }
}

impl From<Vec<&str>> for RelationPath {
    fn from(segments: Vec<&str>) -> Self {
        RelationPath(segments.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<String>> for RelationPath {
    fn from(segments: Vec<String>) -> Self {
        RelationPath(segments)
    }
}

impl<const N: usize> From<[&str; N]> for RelationPath {
    fn from(segments: [&str; N]) -> Self {
        RelationPath(segments.iter().map(|segment| segment.to_string()).collect())
    }
}

#[derive(Clone)]
struct Memo {
    revision: u64,
    models: Vec<Model>,
}

/// Query over one model type
#[derive(Clone)]
pub struct Query {
    db: Rc<Database>,
    model: String,
    conditions: Vec<Condition>,
    order: Vec<OrderSpec>,
    relation_queries: Rc<RelationQueries>,
    error: Option<Error>,
    memo: RefCell<Option<Memo>>,
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("model", &self.model)
            .field("conditions", &self.conditions)
            .field("order", &self.order)
            .field("relation_queries", &self.relation_queries)
            .field("error", &self.error)
            .finish()
    }
}

impl Query {
    pub fn new(db: Rc<Database>, model: impl Into<String>) -> Self {
        Self {
            db,
            model: model.into(),
            conditions: Vec::new(),
            order: Vec::new(),
            relation_queries: Rc::new(IndexMap::new()),
            error: None,
            memo: RefCell::new(None),
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model
    }

    pub fn database(&self) -> &Rc<Database> {
        &self.db
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn order(&self) -> &[OrderSpec] {
        &self.order
    }

    pub fn relation_queries(&self) -> &RelationQueries {
        &self.relation_queries
    }

    /// Shared handle to the relation queries, attached to wrapped results
    pub fn relation_queries_rc(&self) -> Rc<RelationQueries> {
        Rc::clone(&self.relation_queries)
    }

    /// First error recorded while building
    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    fn record_error(&mut self, error: Error) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    fn push(mut self, kind: ConditionKind, conjunction: Conjunction, not: bool) -> Self {
        self.conditions.push(
            Condition::new(kind)
                .with_conjunction(conjunction)
                .negated(not),
        );
        self.memo.get_mut().take();
        self
    }

    fn clause(mut self, clause: Clause, conjunction: Conjunction, not: bool) -> Self {
        match clause.into_kind() {
            Ok(kind) => self.push(kind, conjunction, not),
            Err(value) => {
                let error = ModelError::InvalidClause {
                    model: self.model.clone(),
                    value: value.to_string(),
                };
                self.record_error(error.into());
                self.memo.get_mut().take();
                self
            }
        }
    }

    // =========================================================================
    // Comparison, object match, predicate
    // =========================================================================

    pub fn where_(self, clause: impl Into<Clause>) -> Self {
        self.clause(clause.into(), Conjunction::And, false)
    }

    pub fn or_where(self, clause: impl Into<Clause>) -> Self {
        self.clause(clause.into(), Conjunction::Or, false)
    }

    pub fn where_not(self, clause: impl Into<Clause>) -> Self {
        self.clause(clause.into(), Conjunction::And, true)
    }

    pub fn or_where_not(self, clause: impl Into<Clause>) -> Self {
        self.clause(clause.into(), Conjunction::Or, true)
    }

    // =========================================================================
    // Ranges (inclusive)
    // =========================================================================

    fn between(
        self,
        property: impl Into<FieldSpec>,
        bounds: impl Into<Operand>,
        conjunction: Conjunction,
        not: bool,
    ) -> Self {
        let kind = ConditionKind::Between {
            property: property.into(),
            value: bounds.into(),
        };
        self.push(kind, conjunction, not)
    }

    /// `bounds` is `[low, high]`, or one pair per field of a composite property
    pub fn where_between(self, property: impl Into<FieldSpec>, bounds: impl Into<Operand>) -> Self {
        self.between(property, bounds, Conjunction::And, false)
    }

    pub fn or_where_between(self, property: impl Into<FieldSpec>, bounds: impl Into<Operand>) -> Self {
        self.between(property, bounds, Conjunction::Or, false)
    }

    pub fn where_not_between(self, property: impl Into<FieldSpec>, bounds: impl Into<Operand>) -> Self {
        self.between(property, bounds, Conjunction::And, true)
    }

    pub fn or_where_not_between(
        self,
        property: impl Into<FieldSpec>,
        bounds: impl Into<Operand>,
    ) -> Self {
        self.between(property, bounds, Conjunction::Or, true)
    }

    // =========================================================================
    // Membership
    // =========================================================================

    fn in_values(
        self,
        property: impl Into<FieldSpec>,
        values: impl Into<Operand>,
        conjunction: Conjunction,
        not: bool,
    ) -> Self {
        let kind = ConditionKind::in_values(property.into(), values.into());
        self.push(kind, conjunction, not)
    }

    /// Literal arrays against a single field are matched through a set;
    /// composite properties take an array of tuples.
    pub fn where_in(self, property: impl Into<FieldSpec>, values: impl Into<Operand>) -> Self {
        self.in_values(property, values, Conjunction::And, false)
    }

    pub fn or_where_in(self, property: impl Into<FieldSpec>, values: impl Into<Operand>) -> Self {
        self.in_values(property, values, Conjunction::Or, false)
    }

    pub fn where_not_in(self, property: impl Into<FieldSpec>, values: impl Into<Operand>) -> Self {
        self.in_values(property, values, Conjunction::And, true)
    }

    pub fn or_where_not_in(self, property: impl Into<FieldSpec>, values: impl Into<Operand>) -> Self {
        self.in_values(property, values, Conjunction::Or, true)
    }

    // =========================================================================
    // Null checks (absent fields read as null)
    // =========================================================================

    fn null(self, property: impl Into<FieldSpec>, conjunction: Conjunction, not: bool) -> Self {
        let kind = ConditionKind::Compare {
            property: property.into(),
            operator: Operator::Eq,
            value: Operand::Literal(Value::Null),
        };
        self.push(kind, conjunction, not)
    }

    pub fn where_null(self, property: impl Into<FieldSpec>) -> Self {
        self.null(property, Conjunction::And, false)
    }

    pub fn or_where_null(self, property: impl Into<FieldSpec>) -> Self {
        self.null(property, Conjunction::Or, false)
    }

    pub fn where_not_null(self, property: impl Into<FieldSpec>) -> Self {
        self.null(property, Conjunction::And, true)
    }

    pub fn or_where_not_null(self, property: impl Into<FieldSpec>) -> Self {
        self.null(property, Conjunction::Or, true)
    }

    // =========================================================================
    // Groups
    // =========================================================================

    fn group<F>(mut self, build: F, conjunction: Conjunction, not: bool) -> Self
    where
        F: FnOnce(Query) -> Query,
    {
        let sub = build(Query::new(Rc::clone(&self.db), self.model.clone()));
        if let Some(error) = sub.error {
            self.record_error(error);
        }
        self.push(ConditionKind::Group(sub.conditions), conjunction, not)
    }

    /// Conditions built by `build` as one parenthesized group
    pub fn where_query<F>(self, build: F) -> Self
    where
        F: FnOnce(Query) -> Query,
    {
        self.group(build, Conjunction::And, false)
    }

    pub fn or_where_query<F>(self, build: F) -> Self
    where
        F: FnOnce(Query) -> Query,
    {
        self.group(build, Conjunction::Or, false)
    }

    pub fn where_not_query<F>(self, build: F) -> Self
    where
        F: FnOnce(Query) -> Query,
    {
        self.group(build, Conjunction::And, true)
    }

    pub fn or_where_not_query<F>(self, build: F) -> Self
    where
        F: FnOnce(Query) -> Query,
    {
        self.group(build, Conjunction::Or, true)
    }

    // =========================================================================
    // Ordering
    // =========================================================================

    pub fn order_by(mut self, key: impl Into<SortKey>, direction: SortDirection) -> Self {
        self.order.push(OrderSpec::new(key, direction));
        self.memo.get_mut().take();
        self
    }

    /// Several keys at once; missing directions default to ascending.
    pub fn order_by_many<K>(mut self, keys: Vec<K>, directions: &[SortDirection]) -> Self
    where
        K: Into<SortKey>,
    {
        for (i, key) in keys.into_iter().enumerate() {
            let direction = directions.get(i).copied().unwrap_or_default();
            self.order.push(OrderSpec::new(key, direction));
        }
        self.memo.get_mut().take();
        self
    }

    // =========================================================================
    // Relation sub-queries
    // =========================================================================

    /// Restricts a relation of every result, applied whenever the relation
    /// is read from a result (and further down for multi-segment paths).
    ///
    /// Repeated calls on the same first segment refine the same sub-query.
    pub fn query_related<F>(mut self, path: impl Into<RelationPath>, build: F) -> Self
    where
        F: FnOnce(Query) -> Query,
    {
        let path = path.into();
        if let Err(error) = self.attach_related(path.segments(), build) {
            Logger::warn(
                "QUERY_RELATED_UNRESOLVED",
                &[
                    ("model", &self.model),
                    ("path", &path.segments().join(".")),
                    ("error", &error.to_string()),
                ],
            );
            self.record_error(error);
        }
        self.memo.get_mut().take();
        self
    }

    fn attach_related<F>(&mut self, segments: &[String], build: F) -> Result<()>
    where
        F: FnOnce(Query) -> Query,
    {
        let (first, rest) = segments
            .split_first()
            .ok_or(ModelError::EmptyRelationPath)?;
        let model = self.db.model(&self.model)?;
        let relation = model.relation(first)?;

        let mut nested = match self.relation_queries.get(first) {
            Some(existing) => existing.clone(),
            None => self.db.query(&relation.target),
        };
        if rest.is_empty() {
            nested = build(nested);
        } else {
            nested.attach_related(rest, build)?;
            nested.memo.get_mut().take();
        }

        Rc::make_mut(&mut self.relation_queries).insert(first.clone(), nested);
        Ok(())
    }

    // =========================================================================
    // Execution
    // =========================================================================

    /// Results from storage; cached until the store changes
    pub fn get(&self) -> Result<Vec<Model>> {
        let revision = self.db.revision();
        if let Some(memo) = self.memo.borrow().as_ref() {
            if memo.revision == revision {
                return Ok(memo.models.clone());
            }
        }

        let models = executor::execute(self, None)?;
        *self.memo.borrow_mut() = Some(Memo {
            revision,
            models: models.clone(),
        });
        Ok(models)
    }

    /// Results over caller-supplied rows instead of storage
    pub fn get_from(&self, rows: impl Into<RowSet>) -> Result<Vec<Model>> {
        executor::execute(self, Some(rows.into()))
    }

    /// Filtered rows before sorting and final wrapping; keyed input stays
    /// keyed.
    pub fn filtered(&self, rows: Option<RowSet>) -> Result<RowSet> {
        executor::filter(self, rows)
    }

    /// `row`, wrapped, if it satisfies the query
    pub fn get_one(&self, row: impl Into<Row>) -> Result<Option<Model>> {
        Ok(executor::execute(self, Some(RowSet::List(vec![row.into()])))?
            .into_iter()
            .next())
    }

    pub fn first(&self) -> Result<Option<Model>> {
        Ok(self.get()?.into_iter().next())
    }

    // =========================================================================
    // Aggregates
    // =========================================================================

    /// Sum of a numeric field; other values count as zero
    pub fn sum(&self, field: &str) -> Result<f64> {
        Ok(aggregate::sum(&self.get()?, field))
    }

    /// Number of results
    pub fn count(&self) -> Result<usize> {
        Ok(self.get()?.len())
    }

    /// Number of results whose field is present and not null
    pub fn count_field(&self, field: &str) -> Result<usize> {
        Ok(aggregate::count_defined(&self.get()?, field))
    }

    /// `sum / count()`; `None` without results
    pub fn average(&self, field: &str) -> Result<Option<f64>> {
        Ok(aggregate::average(&self.get()?, field))
    }

    pub fn max(&self, field: &str) -> Result<Option<Value>> {
        Ok(aggregate::max(&self.get()?, field))
    }

    pub fn min(&self, field: &str) -> Result<Option<Value>> {
        Ok(aggregate::min(&self.get()?, field))
    }
}
