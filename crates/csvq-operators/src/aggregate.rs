//! Aggregates and conversions out of the table model.
//!
//! Numeric aggregates read cells as `f64`. Cells that do not parse are
//! skipped and reported once per call.

use csvq_core::diagnostics::Warning;
use csvq_core::table::Table;
use serde_json::{Map, Value};

use crate::traits::{OpContext, OpError};

pub fn count(table: &Table) -> usize {
    table.len()
}

/// Sum of `field`, or of the first column when `field` is `None`.
pub fn sum(table: &Table, field: Option<&str>, ctx: &mut OpContext) -> Result<f64, OpError> {
    Ok(numeric_values(table, field, "sum", ctx)?.iter().sum())
}

/// Mean of `field` (first column when `None`). `None` when no value parses.
pub fn average(
    table: &Table,
    field: Option<&str>,
    ctx: &mut OpContext,
) -> Result<Option<f64>, OpError> {
    let values = numeric_values(table, field, "average", ctx)?;
    if values.is_empty() {
        return Ok(None);
    }
    Ok(Some(values.iter().sum::<f64>() / values.len() as f64))
}

/// Values of a single-column table.
///
/// With several columns the first one is used, after a warning.
pub fn to_list(table: &Table, ctx: &mut OpContext) -> Result<Vec<String>, OpError> {
    match table.schema().len() {
        0 => {
            ctx.warn(Warning::Shape(
                "cannot convert table to list, table has no fields".into(),
            ))?;
            return Ok(Vec::new());
        }
        1 => {}
        n => ctx.warn(Warning::Shape(format!(
            "table has {} fields, using the first for the list",
            n
        )))?,
    }
    Ok(table.rows().iter().map(|r| r[0].clone()).collect())
}

/// Field → value mapping of a single-row table, in field order.
///
/// With several rows the first one is used, after a warning.
pub fn to_dictionary(table: &Table, ctx: &mut OpContext) -> Result<Map<String, Value>, OpError> {
    let Some(row) = table.rows().first() else {
        ctx.warn(Warning::Shape(
            "cannot convert table to dictionary, table is empty".into(),
        ))?;
        return Ok(Map::new());
    };
    if table.len() > 1 {
        ctx.warn(Warning::Shape(format!(
            "table has {} rows, using the first for the dictionary",
            table.len()
        )))?;
    }
    Ok(table
        .schema()
        .names()
        .zip(row)
        .map(|(f, v)| (f.to_string(), Value::String(v.clone())))
        .collect())
}

fn numeric_values(
    table: &Table,
    field: Option<&str>,
    op: &str,
    ctx: &mut OpContext,
) -> Result<Vec<f64>, OpError> {
    let col = match field {
        Some(name) => match table.schema().index_of(name) {
            Some(i) => i,
            None => {
                ctx.warn(Warning::UnknownField {
                    field: name.to_string(),
                    context: op.to_string(),
                })?;
                return Ok(Vec::new());
            }
        },
        None if table.schema().is_empty() => {
            ctx.warn(Warning::Shape(format!("cannot {} a table with no fields", op)))?;
            return Ok(Vec::new());
        }
        None => 0,
    };

    let mut skipped = 0usize;
    let values: Vec<f64> = table
        .rows()
        .iter()
        .filter_map(|r| match r[col].trim().parse::<f64>() {
            Ok(v) if !v.is_nan() => Some(v),
            _ => {
                skipped += 1;
                None
            }
        })
        .collect();
    if skipped > 0 {
        ctx.warn(Warning::Shape(format!(
            "{}: skipped {} non-numeric values",
            op, skipped
        )))?;
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sales() -> Table {
        Table::from_rows(
            ["amount", "region"],
            vec![
                vec!["10".into(), "north".into()],
                vec!["2.5".into(), "south".into()],
                vec!["n/a".into(), "east".into()],
                vec!["7.5".into(), "west".into()],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_count() {
        assert_eq!(count(&sales()), 4);
        assert_eq!(count(&Table::default()), 0);
    }

    #[test]
    fn test_sum_and_average_skip_non_numeric() {
        let t = sales();
        let mut ctx = OpContext::lenient();
        assert_eq!(sum(&t, Some("amount"), &mut ctx).unwrap(), 20.0);
        assert_eq!(average(&t, None, &mut ctx).unwrap(), Some(20.0 / 3.0));
        assert_eq!(ctx.warnings().len(), 2);

        assert!(sum(&t, None, &mut OpContext::strict()).is_err());
    }

    #[test]
    fn test_average_of_nothing() {
        let t = Table::from_rows(["x"], vec![]).unwrap();
        assert_eq!(average(&t, None, &mut OpContext::lenient()).unwrap(), None);
        let mut ctx = OpContext::lenient();
        assert_eq!(sum(&t, Some("y"), &mut ctx).unwrap(), 0.0);
        assert_eq!(ctx.warnings().len(), 1);
    }

    #[test]
    fn test_to_list() {
        let t = sales();
        let mut ctx = OpContext::lenient();
        assert_eq!(to_list(&t, &mut ctx).unwrap(), vec!["10", "2.5", "n/a", "7.5"]);
        assert_eq!(ctx.warnings().len(), 1);
        assert!(to_list(&Table::default(), &mut ctx).unwrap().is_empty());
    }

    #[test]
    fn test_to_dictionary() {
        let mut ctx = OpContext::lenient();
        let one = Table::from_rows(
            ["name", "title"],
            vec![vec!["Ann".into(), "Director".into()]],
        )
        .unwrap();
        let dict = to_dictionary(&one, &mut ctx).unwrap();
        assert_eq!(dict.keys().collect::<Vec<_>>(), vec!["name", "title"]);
        assert_eq!(dict["title"], "Director");
        assert!(ctx.warnings().is_empty());

        let many = to_dictionary(&sales(), &mut ctx).unwrap();
        assert_eq!(many["region"], "north");
        assert_eq!(ctx.warnings().len(), 1);

        assert!(to_dictionary(&Table::default(), &mut ctx).unwrap().is_empty());
        assert!(to_dictionary(&sales(), &mut OpContext::strict()).is_err());
    }
}
