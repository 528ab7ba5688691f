//! Indexer: sort a table in place by one field and record the index state.
//!
//! The sort is an unstable, in-place quicksort driven by an explicit work
//! stack, so its depth does not depend on the call stack. Each pass puts
//! the median of three at the end of the range, then splits around that
//! last element into `< pivot`, `== pivot`, `> pivot`. Sorted columns and
//! columns full of duplicates both stay O(n log n). The larger side is
//! pushed first so the stack holds O(log n) ranges.

use csvq_core::compare::Comparator;
use csvq_core::diagnostics::Warning;
use csvq_core::table::{IndexState, Row, Table};

use crate::traits::{OpContext, OpError, Operator};

/// Sort `table` by `field` under `comparator` and record the index state.
///
/// Unknown field: diagnostic, table untouched.
pub fn index<'t>(
    table: &'t mut Table,
    field: &str,
    comparator: Comparator,
    ctx: &mut OpContext,
) -> Result<&'t mut Table, OpError> {
    let Some(col) = table.schema().index_of(field) else {
        ctx.warn(Warning::UnknownField {
            field: field.to_string(),
            context: "index".to_string(),
        })?;
        return Ok(table);
    };

    tracing::debug!(field, rows = table.len(), comparator = %comparator.name(), "indexing");
    sort_rows(table.rows_mut(), col, &comparator);
    table.set_index_state(Some(IndexState::new(field, comparator)));
    Ok(table)
}

/// Declare that `table` is already sorted by `field`. Trusted, not checked.
pub fn already_indexed<'t>(
    table: &'t mut Table,
    field: &str,
    comparator: Comparator,
    ctx: &mut OpContext,
) -> Result<&'t mut Table, OpError> {
    if !table.schema().contains(field) {
        ctx.warn(Warning::UnknownField {
            field: field.to_string(),
            context: "already_indexed".to_string(),
        })?;
        return Ok(table);
    }
    table.set_index_state(Some(IndexState::new(field, comparator)));
    Ok(table)
}

/// Sort rows ascending by column `col`.
pub fn sort_rows(rows: &mut [Row], col: usize, comparator: &Comparator) {
    let mut stack: Vec<(usize, usize)> = vec![(0, rows.len())];

    while let Some((start, end)) = stack.pop() {
        if end - start < 2 {
            continue;
        }
        median_to_last(rows, start, end, col, comparator);
        let (eq_start, eq_end) = partition(rows, start, end, col, comparator);

        let left = (start, eq_start);
        let right = (eq_end, end);
        if left.1 - left.0 > right.1 - right.0 {
            stack.push(left);
            stack.push(right);
        } else {
            stack.push(right);
            stack.push(left);
        }
    }
}

/// Order `start`, `mid` and `end - 1` so the median of the three sits at
/// `end - 1`, where the partition takes its pivot.
fn median_to_last(rows: &mut [Row], start: usize, end: usize, col: usize, cmp: &Comparator) {
    let mid = start + (end - start) / 2;
    let last = end - 1;
    if cmp.is_before(&rows[mid][col], &rows[start][col]) {
        rows.swap(mid, start);
    }
    if cmp.is_before(&rows[last][col], &rows[start][col]) {
        rows.swap(last, start);
    }
    // `start` now holds the minimum; the median is the smaller of the other two.
    if cmp.is_before(&rows[mid][col], &rows[last][col]) {
        rows.swap(mid, last);
    }
}

/// Three-way partition of `[start, end)` around the element at `end - 1`.
///
/// Returns the half-open range holding the pivot and its equals. The range
/// is never empty, so both remaining sides shrink.
fn partition(
    rows: &mut [Row],
    start: usize,
    end: usize,
    col: usize,
    cmp: &Comparator,
) -> (usize, usize) {
    let last = end - 1;
    let pivot = rows[last][col].clone();

    // [start, lt) < pivot, [lt, i) == pivot, [gt, last) > pivot
    let (mut lt, mut i, mut gt) = (start, start, last);
    while i < gt {
        if cmp.is_before(&rows[i][col], &pivot) {
            rows.swap(lt, i);
            lt += 1;
            i += 1;
        } else if cmp.is_before(&pivot, &rows[i][col]) {
            gt -= 1;
            rows.swap(i, gt);
        } else {
            i += 1;
        }
    }
    rows.swap(gt, last);
    (lt, gt + 1)
}

/// `index` as a pipeline step.
pub struct Index {
    pub field: String,
    pub comparator: Comparator,
}

impl Operator for Index {
    fn name(&self) -> &'static str {
        "index"
    }

    fn eval(&self, mut input: Table, ctx: &mut OpContext) -> Result<Table, OpError> {
        index(&mut input, &self.field, self.comparator.clone(), ctx)?;
        Ok(input)
    }
}

/// `already_indexed` as a pipeline step.
pub struct AlreadyIndexed {
    pub field: String,
    pub comparator: Comparator,
}

impl Operator for AlreadyIndexed {
    fn name(&self) -> &'static str {
        "already_indexed"
    }

    fn eval(&self, mut input: Table, ctx: &mut OpContext) -> Result<Table, OpError> {
        already_indexed(&mut input, &self.field, self.comparator.clone(), ctx)?;
        Ok(input)
    }
}
