//! In-memory text table with an optional single-field sort index.
//!
//! A `Table` exclusively owns its rows. Operations that narrow, filter or
//! project a table build a new one with freshly copied rows; nothing shares
//! mutable row storage.
//!
//! Index state `(field, comparator)` is a promise that rows are sorted
//! ascending by `field` under `comparator`. Any mutable access to rows other
//! than index construction drops the promise.
//!
//! `Table` does no internal synchronization. Sorting needs `&mut Table`,
//! querying needs `&Table`; callers sharing a table across threads must lock
//! it externally.

use crate::compare::Comparator;
use crate::error::{Error, Result};
use crate::schema::{Field, Schema};

/// One record, positionally aligned with the table's fields.
pub type Row = Vec<String>;

#[derive(Debug, Clone, PartialEq)]
pub struct IndexState {
    pub field: String,
    pub comparator: Comparator,
}

impl IndexState {
    pub fn new(field: impl Into<String>, comparator: Comparator) -> Self {
        Self {
            field: field.into(),
            comparator,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    schema: Schema,
    rows: Vec<Row>,
    index: Option<IndexState>,
}

impl Table {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            rows: Vec::new(),
            index: None,
        }
    }

    /// Build a table from field names and rows, checking row alignment.
    pub fn from_rows<I, S>(fields: I, rows: Vec<Row>) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_parts(Schema::from_names(fields)?, rows)
    }

    pub fn from_parts(schema: Schema, rows: Vec<Row>) -> Result<Self> {
        if let Some((i, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, r)| r.len() != schema.len())
        {
            return Err(Error::Schema(format!(
                "row {} has {} values, expected {}",
                i,
                row.len(),
                schema.len()
            )));
        }
        Ok(Self {
            schema,
            rows,
            index: None,
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn field_names(&self) -> Vec<String> {
        self.schema.names().map(str::to_string).collect()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Mutable access to rows for in-place edits and reordering. Clears the
    /// index state.
    ///
    /// The row count is fixed here; grow the table with [`Table::push_row`].
    /// Edits must keep every row as wide as the schema.
    pub fn rows_mut(&mut self) -> &mut [Row] {
        self.index = None;
        &mut self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    pub fn push_row(&mut self, row: Row) -> Result<()> {
        if row.len() != self.schema.len() {
            return Err(Error::Schema(format!(
                "row has {} values, expected {}",
                row.len(),
                self.schema.len()
            )));
        }
        self.index = None;
        self.rows.push(row);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn index_state(&self) -> Option<&IndexState> {
        self.index.as_ref()
    }

    /// Record (or clear) the index state without touching row order.
    ///
    /// The claim is trusted. Use the indexer in `csvq-operators` to sort and
    /// record in one step.
    pub fn set_index_state(&mut self, state: Option<IndexState>) {
        self.index = state;
    }

    pub fn with_index_state(mut self, state: Option<IndexState>) -> Self {
        self.index = state;
        self
    }

    /// Position of the indexed field, if the index state is usable.
    pub fn indexed_position(&self) -> Option<usize> {
        self.index
            .as_ref()
            .and_then(|s| self.schema.index_of(&s.field))
    }

    pub fn value(&self, row: usize, field: &str) -> Option<&str> {
        let col = self.schema.index_of(field)?;
        self.rows.get(row).map(|r| r[col].as_str())
    }

    pub fn row_view(&self, row: usize) -> Option<RowView<'_>> {
        self.rows.get(row).map(|r| RowView::new(&self.schema, r))
    }

    pub fn column(&self, field: &str) -> Option<Vec<&str>> {
        let col = self.schema.index_of(field)?;
        Some(self.rows.iter().map(|r| r[col].as_str()).collect())
    }

    /// Rename one field. The index state follows the rename.
    pub fn rename_field(&mut self, old: &str, new: impl Into<String>) -> Result<()> {
        let new = new.into();
        let col = self
            .schema
            .index_of(old)
            .ok_or_else(|| Error::Schema(format!("field '{}' does not exist", old)))?;
        if old != new && self.schema.contains(&new) {
            return Err(Error::Schema(format!("field '{}' already exists", new)));
        }
        if let Some(state) = self.index.as_mut() {
            if state.field == old {
                state.field = new.clone();
            }
        }
        self.schema.fields[col].name = new;
        Ok(())
    }

    /// Append a column. Row order is untouched, so the index state is kept.
    pub fn push_column(&mut self, name: impl Into<String>, values: Vec<String>) -> Result<()> {
        let name = name.into();
        if self.schema.contains(&name) {
            return Err(Error::Schema(format!("field '{}' already exists", name)));
        }
        if values.len() != self.rows.len() {
            return Err(Error::Schema(format!(
                "column '{}' has {} values, table has {} rows",
                name,
                values.len(),
                self.rows.len()
            )));
        }
        self.schema.fields.push(Field::new(name));
        for (row, v) in self.rows.iter_mut().zip(values) {
            row.push(v);
        }
        Ok(())
    }

    /// Overwrite the values of one column. Clears the index state only when
    /// the indexed field is the one overwritten.
    pub fn set_column(&mut self, field: &str, values: Vec<String>) -> Result<()> {
        let col = self
            .schema
            .index_of(field)
            .ok_or_else(|| Error::Schema(format!("field '{}' does not exist", field)))?;
        if values.len() != self.rows.len() {
            return Err(Error::Schema(format!(
                "column '{}' has {} values, table has {} rows",
                field,
                values.len(),
                self.rows.len()
            )));
        }
        if self.index.as_ref().is_some_and(|s| s.field == field) {
            self.index = None;
        }
        for (row, v) in self.rows.iter_mut().zip(values) {
            row[col] = v;
        }
        Ok(())
    }
}

/// Borrowed row paired with its schema, for name-based access.
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    schema: &'a Schema,
    row: &'a [String],
}

impl<'a> RowView<'a> {
    pub fn new(schema: &'a Schema, row: &'a [String]) -> Self {
        Self { schema, row }
    }

    pub fn get(&self, field: &str) -> Option<&'a str> {
        self.schema
            .index_of(field)
            .and_then(|i| self.row.get(i))
            .map(String::as_str)
    }

    pub fn values(&self) -> &'a [String] {
        self.row
    }
}
