//! Query execution pipeline
//!
//! 1. Primary-key shortcut narrows storage fetches; every condition is
//!    still evaluated
//! 2. Fetch candidates, raw when relation queries must be attached
//! 3. Wrap before filtering, unless disabled for the model type
//! 4. Filter, keeping list or keyed shape
//! 5. Sort, then wrap every result

use std::rc::Rc;

use super::builder::{Query, RelationQueries};
use super::planner::plan;
use super::row::{Row, RowSet};
use super::sorter::sort_rows;
use crate::database::Database;
use crate::error::Result;
use crate::filter::matches;
use crate::model::ModelType;
use crate::observability::{Logger, Severity};
use crate::record::Model;

fn wrap(
    db: &Rc<Database>,
    model: &Rc<ModelType>,
    relation_queries: &Rc<RelationQueries>,
    row: Row,
) -> Model {
    match row {
        Row::Model(wrapped)
            if relation_queries.is_empty()
                || Rc::ptr_eq(wrapped.relation_queries_rc(), relation_queries) =>
        {
            wrapped
        }
        row => Model::with_relation_queries(
            Rc::clone(db),
            Rc::clone(model),
            row.record(),
            Rc::clone(relation_queries),
        ),
    }
}

/// Steps 1 to 4
pub(super) fn filter(query: &Query, input: Option<RowSet>) -> Result<RowSet> {
    if let Some(error) = query.error() {
        return Err(error.clone());
    }
    let db = query.database();
    let model = db.model(query.model_name())?;
    let relation_queries = query.relation_queries_rc();
    let wrap_before = model
        .model_before_filter()
        .unwrap_or(db.config().model_before_filter);

    let (rows, pk_shortcut) = match input {
        Some(rows) => (rows, false),
        None => {
            let plan = plan(&model, query.conditions());
            let keys = plan.primary_keys.as_deref();
            let rows: Vec<Row> = if wrap_before && relation_queries.is_empty() {
                db.fetch_models(&model, keys)?
                    .into_iter()
                    .map(Row::Model)
                    .collect()
            } else {
                db.fetch_items(&model, keys)?
                    .into_iter()
                    .map(Row::Item)
                    .collect()
            };
            let shortcut = plan.primary_keys.is_some();
            (RowSet::List(rows), shortcut)
        }
    };

    let rows = if wrap_before {
        rows.map(|row| Row::Model(wrap(db, &model, &relation_queries, row)))
    } else {
        rows
    };

    let scanned = rows.len();
    let conditions = query.conditions();
    let rows = if conditions.is_empty() {
        rows
    } else {
        rows.retain(|row| matches(row, conditions))
    };

    db.metrics().record_query(pk_shortcut, scanned, rows.len());
    if Logger::enabled(Severity::Trace) {
        Logger::trace(
            "QUERY_EXECUTED",
            &[
                ("model", model.name()),
                ("pk_shortcut", &pk_shortcut.to_string()),
                ("scanned", &scanned.to_string()),
                ("returned", &rows.len().to_string()),
            ],
        );
    }

    Ok(rows)
}

/// Full pipeline: filtered, sorted and wrapped
pub(super) fn execute(query: &Query, input: Option<RowSet>) -> Result<Vec<Model>> {
    let rows = filter(query, input)?.into_rows();
    let rows = sort_rows(rows, query.order());

    let db = query.database();
    let model = db.model(query.model_name())?;
    let relation_queries = query.relation_queries_rc();
    Ok(rows
        .into_iter()
        .map(|row| wrap(db, &model, &relation_queries, row))
        .collect())
}
