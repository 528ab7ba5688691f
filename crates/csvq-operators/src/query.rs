//! Query pipeline: index check, range narrowing, predicate scan, materialize.
//!
//! ```text
//! Start -> IndexCheck -> RangeNarrow  -> PredicateScan -> Materialize -> Done
//!                     \-> FullScanSetup -/
//! ```
//!
//! The caller's `Query` is never modified. Operators proven by the range
//! are tracked in a local list and skipped during the scan.

use std::borrow::Cow;

use csvq_core::condition::Query;
use csvq_core::diagnostics::Warning;
use csvq_core::table::{Row, Table};
use serde_json::Value;

use crate::predicate::{resolve_comparator, row_matches, ResolvedFilter};
use crate::range::{resolve_range, RangeResolution};
use crate::traits::{OpContext, OpError, Operator};

/// All rows of `table` matching `query`, in table order.
///
/// The result has the same schema, freshly copied rows and no index state.
pub fn run_query(table: &Table, query: &Query, ctx: &mut OpContext) -> Result<Table, OpError> {
    execute(table, query, None, ctx)
}

/// At most `limit` matching rows, in table order.
pub fn run_query_limit(
    table: &Table,
    query: &Query,
    limit: usize,
    ctx: &mut OpContext,
) -> Result<Table, OpError> {
    execute(table, query, Some(limit), ctx)
}

/// The first matching row, as a zero- or one-row table.
pub fn query_one(table: &Table, query: &Query, ctx: &mut OpContext) -> Result<Table, OpError> {
    execute(table, query, Some(1), ctx)
}

/// Query with an optional tree. `None` hands back the input itself.
pub fn query<'t>(
    table: &'t Table,
    query: Option<&Query>,
    ctx: &mut OpContext,
) -> Result<Cow<'t, Table>, OpError> {
    match query {
        None => Ok(Cow::Borrowed(table)),
        Some(q) => run_query(table, q, ctx).map(Cow::Owned),
    }
}

/// Query with a raw JSON condition tree.
///
/// A tree that does not parse is a `MalformedQuery` diagnostic and, when
/// the policy lets it through, an empty result.
pub fn query_json(table: &Table, tree: &Value, ctx: &mut OpContext) -> Result<Table, OpError> {
    match Query::from_json(tree) {
        Ok(q) => run_query(table, &q, ctx),
        Err(e) => {
            ctx.warn(Warning::MalformedQuery(e.to_string()))?;
            Ok(Table::new(table.schema().clone()))
        }
    }
}

fn execute(
    table: &Table,
    query: &Query,
    limit: Option<usize>,
    ctx: &mut OpContext,
) -> Result<Table, OpError> {
    let indexed_field = table.index_state().map(|s| s.field.as_str());

    // Resolve each known field once: column, comparator, and whether the
    // field can drive range narrowing.
    let mut filters: Vec<ResolvedFilter<'_>> = Vec::with_capacity(query.len());
    let mut narrowing: Option<(usize, RangeResolution)> = None;
    for (field, filter) in query.iter() {
        let Some(col) = table.schema().index_of(field) else {
            ctx.warn(Warning::UnknownField {
                field: field.to_string(),
                context: "its conditions".to_string(),
            })?;
            continue;
        };
        for op in &filter.unknown_operators {
            ctx.warn(Warning::UnknownOperator {
                field: field.to_string(),
                operator: op.clone(),
            })?;
        }
        let comparator = resolve_comparator(field, filter, table, ctx)?;

        let is_index_field = indexed_field == Some(field)
            && table
                .index_state()
                .is_some_and(|s| s.comparator == comparator);
        if is_index_field {
            match resolve_range(table, filter, ctx)? {
                Some(range) => narrowing = Some((filters.len(), range)),
                None => {
                    tracing::debug!(field, "range empty, no candidates");
                    return Ok(Table::new(table.schema().clone()));
                }
            }
        }

        filters.push(ResolvedFilter {
            field,
            col,
            conditions: filter.conditions.iter().collect(),
            comparator,
        });
    }

    let (low, high) = match &narrowing {
        Some((slot, range)) => {
            let f = &mut filters[*slot];
            f.conditions = f
                .conditions
                .iter()
                .enumerate()
                .filter(|(i, _)| !range.is_consumed(*i))
                .map(|(_, c)| *c)
                .collect();
            tracing::debug!(
                field = f.field,
                low = range.low,
                high = range.high,
                rows = table.len(),
                "range narrowed"
            );
            (range.low, range.high)
        }
        None => {
            tracing::debug!(rows = table.len(), "full scan");
            (0, table.len())
        }
    };
    filters.retain(|f| !f.conditions.is_empty());

    let cap = limit.unwrap_or(usize::MAX);
    let kept: Vec<Row> = table.rows()[low..high]
        .iter()
        .filter(|row| row_matches(&filters, row))
        .take(cap)
        .cloned()
        .collect();

    tracing::trace!(scanned = high - low, kept = kept.len(), "predicate scan done");
    Ok(Table::from_parts(table.schema().clone(), kept)?)
}

/// Query as a pipeline step. `limit_one` makes it `query_one`.
pub struct QueryOp {
    pub query: Option<Query>,
    pub limit_one: bool,
}

impl Operator for QueryOp {
    fn name(&self) -> &'static str {
        if self.limit_one {
            "query_one"
        } else {
            "query"
        }
    }

    fn eval(&self, input: Table, ctx: &mut OpContext) -> Result<Table, OpError> {
        match (&self.query, self.limit_one) {
            (None, _) => Ok(input),
            (Some(q), false) => run_query(&input, q, ctx),
            (Some(q), true) => query_one(&input, q, ctx),
        }
    }
}
