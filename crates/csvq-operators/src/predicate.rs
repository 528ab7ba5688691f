//! Predicate evaluator: decide whether one cell satisfies a condition.

use csvq_core::compare::Comparator;
use csvq_core::condition::{Condition, FieldFilter};
use csvq_core::diagnostics::Warning;
use csvq_core::table::{Row, Table};

use crate::traits::{OpContext, OpError};

/// Evaluate `condition` against the cell text `value`.
///
/// Equality is textual; only the ordering operators consult `comparator`.
pub fn evaluate(value: &str, condition: &Condition, comparator: &Comparator) -> bool {
    match condition {
        Condition::Eq(v) => value == v,
        Condition::Neq(v) => value != v,
        Condition::Lt(v) => comparator.is_before(value, v),
        Condition::Gt(v) => comparator.is_before(v, value),
        Condition::Lte(v) => !comparator.is_before(v, value),
        Condition::Gte(v) => !comparator.is_before(value, v),
        Condition::In(vs) => vs.iter().any(|v| v == value),
        Condition::Not(inner) => !evaluate(value, inner, comparator),
        Condition::And(items) => items.iter().all(|c| evaluate(value, c, comparator)),
        Condition::Or(items) => items.iter().any(|c| evaluate(value, c, comparator)),
    }
}

/// Pick the comparator a field's filter is evaluated with.
///
/// Explicit `comparison` first, then the index comparator when `field` is
/// the indexed field, then the context default. Falling back to the default
/// is only worth a notice when some condition actually orders values.
pub fn resolve_comparator(
    field: &str,
    filter: &FieldFilter,
    table: &Table,
    ctx: &mut OpContext,
) -> Result<Comparator, OpError> {
    if let Some(c) = &filter.comparison {
        return Ok(c.clone());
    }
    if let Some(name) = &filter.invalid_comparison {
        ctx.warn(Warning::UnknownComparator {
            field: field.to_string(),
            name: name.clone(),
        })?;
        return Ok(ctx.default_comparator.clone());
    }
    if let Some(state) = table.index_state() {
        if state.field == field {
            return Ok(state.comparator.clone());
        }
    }
    if filter.needs_comparator() {
        ctx.warn(Warning::DefaultComparator {
            field: field.to_string(),
        })?;
    }
    Ok(ctx.default_comparator.clone())
}

/// One field's remaining conditions, bound to a column and a comparator.
#[derive(Debug, Clone)]
pub struct ResolvedFilter<'q> {
    pub field: &'q str,
    pub col: usize,
    pub conditions: Vec<&'q Condition>,
    pub comparator: Comparator,
}

impl ResolvedFilter<'_> {
    pub fn matches(&self, row: &Row) -> bool {
        let value = row[self.col].as_str();
        self.conditions
            .iter()
            .all(|c| evaluate(value, c, &self.comparator))
    }
}

/// True iff every filter holds for `row`. Stops at the first failure.
pub fn row_matches(filters: &[ResolvedFilter<'_>], row: &Row) -> bool {
    filters.iter().all(|f| f.matches(row))
}
