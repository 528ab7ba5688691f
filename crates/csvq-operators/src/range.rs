//! Range resolver: narrow an indexed table to the rows a filter can match.
//!
//! Given the ordering conditions on the indexed field, two edge searches
//! find a half-open window `[low, high)` of candidate rows in O(log n).
//!
//! Edge priority (first match wins, one operator per edge):
//!
//! | edge | priority        | first row where              |
//! |------|-----------------|------------------------------|
//! | low  | `eq`            | `!(t < v)`                   |
//! |      | `gt`            | `v < t`                      |
//! |      | `gte`           | `!(t < v)`                   |
//! | high | `eq`            | `v < t`                      |
//! |      | `lt`            | `!(t < v)`                   |
//! |      | `lte`           | `v < t`                      |
//!
//! Within one operator kind the first occurrence in the filter wins. The
//! ordering operators that picked an edge are "consumed": the window proves
//! them, so the predicate scan skips them. `eq` narrows but is never
//! consumed, since rows the comparator ranks equal (`1` and `1.0` under
//! `float`) are not necessarily the same text. Everything else on the field
//! (a second bound, `neq`, `in`, boolean combinators) is still checked row
//! by row.

use csvq_core::compare::Comparator;
use csvq_core::condition::{Condition, FieldFilter};
use csvq_core::diagnostics::Warning;
use csvq_core::table::{Row, Table};

use crate::traits::{OpContext, OpError};

/// Candidate window over the sorted rows plus the conditions it proves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeResolution {
    /// Inclusive.
    pub low: usize,
    /// Exclusive.
    pub high: usize,
    /// Positions in `FieldFilter::conditions` proven by the window.
    pub consumed: Vec<usize>,
}

impl RangeResolution {
    pub fn len(&self) -> usize {
        self.high.saturating_sub(self.low)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_consumed(&self, position: usize) -> bool {
        self.consumed.contains(&position)
    }
}

/// Edge search: first position in `rows` whose value in column `col`
/// satisfies `pred`, or `rows.len()` if none does.
///
/// `pred` must be monotone over the sorted column: false for a prefix,
/// true for the remaining suffix.
pub fn edge_search<F>(rows: &[Row], col: usize, pred: F) -> usize
where
    F: Fn(&str) -> bool,
{
    rows.partition_point(|r| !pred(&r[col]))
}

/// Resolve the candidate window for `filter` on the table's indexed field.
///
/// Returns `None` when the bounds contradict each other (after reporting
/// `InvalidBounds`), meaning no row can match. A table without a usable
/// index resolves to the full table with nothing consumed.
pub fn resolve_range(
    table: &Table,
    filter: &FieldFilter,
    ctx: &mut OpContext,
) -> Result<Option<RangeResolution>, OpError> {
    let rows = table.rows();
    let n = rows.len();
    let full = RangeResolution {
        low: 0,
        high: n,
        consumed: Vec::new(),
    };

    let (Some(state), Some(col)) = (table.index_state(), table.indexed_position()) else {
        return Ok(Some(full));
    };
    if n == 0 {
        return Ok(Some(full));
    }
    let cmp = &state.comparator;

    let mut consumed = Vec::new();
    let low = match low_edge(filter) {
        Some((pos, bound)) => {
            consumed.push(pos);
            bound.search(rows, col, cmp)
        }
        None => 0,
    };
    let high = match high_edge(filter) {
        Some((pos, bound)) => {
            if !consumed.contains(&pos) {
                consumed.push(pos);
            }
            bound.search(rows, col, cmp)
        }
        None => n,
    };

    consumed.retain(|&p| !matches!(filter.conditions[p], Condition::Eq(_)));

    if high < low || high > n {
        ctx.warn(Warning::InvalidBounds { low, high, rows: n })?;
        return Ok(None);
    }

    tracing::trace!(low, high, rows = n, consumed = consumed.len(), "resolved index range");
    Ok(Some(RangeResolution {
        low,
        high,
        consumed,
    }))
}

/// Which boundary predicate an operator turns into.
enum Bound<'q> {
    /// First row with `!(t < v)`.
    NotBefore(&'q str),
    /// First row with `v < t`.
    After(&'q str),
}

impl Bound<'_> {
    fn search(&self, rows: &[Row], col: usize, cmp: &Comparator) -> usize {
        match *self {
            Bound::NotBefore(v) => edge_search(rows, col, |t| !cmp.is_before(t, v)),
            Bound::After(v) => edge_search(rows, col, |t| cmp.is_before(v, t)),
        }
    }
}

fn first_position<'q, F>(filter: &'q FieldFilter, pick: F) -> Option<(usize, Bound<'q>)>
where
    F: Fn(&'q Condition) -> Option<Bound<'q>>,
{
    filter
        .conditions
        .iter()
        .enumerate()
        .find_map(|(i, c)| pick(c).map(|b| (i, b)))
}

fn low_edge(filter: &FieldFilter) -> Option<(usize, Bound<'_>)> {
    first_position(filter, |c| match c {
        Condition::Eq(v) => Some(Bound::NotBefore(v)),
        _ => None,
    })
    .or_else(|| {
        first_position(filter, |c| match c {
            Condition::Gt(v) => Some(Bound::After(v)),
            _ => None,
        })
    })
    .or_else(|| {
        first_position(filter, |c| match c {
            Condition::Gte(v) => Some(Bound::NotBefore(v)),
            _ => None,
        })
    })
}

fn high_edge(filter: &FieldFilter) -> Option<(usize, Bound<'_>)> {
    first_position(filter, |c| match c {
        Condition::Eq(v) => Some(Bound::After(v)),
        _ => None,
    })
    .or_else(|| {
        first_position(filter, |c| match c {
            Condition::Lt(v) => Some(Bound::NotBefore(v)),
            _ => None,
        })
    })
    .or_else(|| {
        first_position(filter, |c| match c {
            Condition::Lte(v) => Some(Bound::After(v)),
            _ => None,
        })
    })
}
