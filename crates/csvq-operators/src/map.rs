//! Column edits: rename, add and rewrite fields in place.
//!
//! Edits that leave the indexed column's values alone keep the index state;
//! rewriting the indexed column drops it.

use csvq_core::diagnostics::Warning;
use csvq_core::table::{RowView, Table};

use crate::traits::{OpContext, OpError, Operator};

/// Rename fields per `(old, new)` pairs. The index state follows the rename.
pub fn rename_fields<K, V>(
    table: &mut Table,
    mapping: &[(K, V)],
    ctx: &mut OpContext,
) -> Result<(), OpError>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    for (old, new) in mapping {
        let (old, new) = (old.as_ref(), new.as_ref());
        if !table.schema().contains(old) {
            ctx.warn(Warning::UnknownField {
                field: old.to_string(),
                context: "rename".to_string(),
            })?;
            continue;
        }
        if let Err(e) = table.rename_field(old, new) {
            ctx.warn(Warning::Shape(e.to_string()))?;
        }
    }
    Ok(())
}

/// Append a field holding `value` in every row.
pub fn add_field(
    table: &mut Table,
    name: &str,
    value: &str,
    ctx: &mut OpContext,
) -> Result<(), OpError> {
    add_field_with(table, name, |_| value.to_string(), ctx)
}

/// Append a field computed from each row.
pub fn add_field_with<F>(
    table: &mut Table,
    name: &str,
    derive: F,
    ctx: &mut OpContext,
) -> Result<(), OpError>
where
    F: Fn(&RowView<'_>) -> String,
{
    if table.schema().contains(name) {
        ctx.warn(Warning::Shape(format!("field '{}' already exists", name)))?;
        return Ok(());
    }
    let values = derived_values(table, derive);
    table.push_column(name, values)?;
    Ok(())
}

/// Rewrite every value of `field` through `f`.
pub fn replace<F>(table: &mut Table, field: &str, f: F, ctx: &mut OpContext) -> Result<(), OpError>
where
    F: Fn(&str) -> String,
{
    replace_derived(
        table,
        field,
        |row| f(row.get(field).unwrap_or_default()),
        ctx,
    )
}

/// Rewrite every value of `field` from the whole row.
pub fn replace_derived<F>(
    table: &mut Table,
    field: &str,
    derive: F,
    ctx: &mut OpContext,
) -> Result<(), OpError>
where
    F: Fn(&RowView<'_>) -> String,
{
    if !table.schema().contains(field) {
        ctx.warn(Warning::UnknownField {
            field: field.to_string(),
            context: "replace".to_string(),
        })?;
        return Ok(());
    }
    let values = derived_values(table, derive);
    table.set_column(field, values)?;
    Ok(())
}

fn derived_values<F>(table: &Table, derive: F) -> Vec<String>
where
    F: Fn(&RowView<'_>) -> String,
{
    table
        .rows()
        .iter()
        .map(|r| derive(&RowView::new(table.schema(), r)))
        .collect()
}

/// `rename_fields` as a pipeline step.
pub struct Rename {
    pub mapping: Vec<(String, String)>,
}

impl Operator for Rename {
    fn name(&self) -> &'static str {
        "rename"
    }

    fn eval(&self, mut input: Table, ctx: &mut OpContext) -> Result<Table, OpError> {
        rename_fields(&mut input, self.mapping.as_slice(), ctx)?;
        Ok(input)
    }
}

/// `add_field` with a constant value as a pipeline step.
pub struct AddField {
    pub field: String,
    pub value: String,
}

impl Operator for AddField {
    fn name(&self) -> &'static str {
        "add_field"
    }

    fn eval(&self, mut input: Table, ctx: &mut OpContext) -> Result<Table, OpError> {
        add_field(&mut input, &self.field, &self.value, ctx)?;
        Ok(input)
    }
}
