//! Projection operators.

use std::collections::HashSet;

use csvq_core::diagnostics::Warning;
use csvq_core::schema::{Field, Schema};
use csvq_core::table::{Row, Table};

use crate::map::rename_fields;
use crate::traits::{OpContext, OpError, Operator};

/// Keep the named columns, in the table's own column order.
///
/// Unknown names are reported and skipped. The index state survives when
/// its field is among the kept columns.
pub fn select<S: AsRef<str>>(
    table: &Table,
    fields: &[S],
    ctx: &mut OpContext,
) -> Result<Table, OpError> {
    let mut cols = Vec::with_capacity(fields.len());
    for name in fields {
        let name = name.as_ref();
        match table.schema().index_of(name) {
            Some(i) => cols.push(i),
            None => ctx.warn(Warning::UnknownField {
                field: name.to_string(),
                context: "select".to_string(),
            })?,
        }
    }
    cols.sort_unstable();
    cols.dedup();

    let schema = Schema::new(
        cols.iter()
            .filter_map(|&i| table.schema().field(i).cloned())
            .collect(),
    );
    let rows: Vec<Row> = table
        .rows()
        .iter()
        .map(|r| cols.iter().map(|&i| r[i].clone()).collect())
        .collect();

    let index = table
        .index_state()
        .filter(|s| schema.contains(&s.field))
        .cloned();
    Ok(Table::from_parts(schema, rows)?.with_index_state(index))
}

/// `select` on the mapping's keys, then rename them to its values.
pub fn select_as<K, V>(
    table: &Table,
    mapping: &[(K, V)],
    ctx: &mut OpContext,
) -> Result<Table, OpError>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let keys: Vec<&str> = mapping.iter().map(|(k, _)| k.as_ref()).collect();
    let mut out = select(table, keys.as_slice(), ctx)?;
    rename_fields(&mut out, mapping, ctx)?;
    Ok(out)
}

/// One-column table of the distinct values of `field`, first-seen order.
pub fn select_unique(table: &Table, field: &str, ctx: &mut OpContext) -> Result<Table, OpError> {
    let Some(col) = table.schema().index_of(field) else {
        ctx.warn(Warning::UnknownField {
            field: field.to_string(),
            context: "select_unique".to_string(),
        })?;
        return Ok(Table::default());
    };

    let mut seen = HashSet::new();
    let rows: Vec<Row> = table
        .rows()
        .iter()
        .filter(|r| seen.insert(r[col].as_str()))
        .map(|r| vec![r[col].clone()])
        .collect();
    Ok(Table::from_parts(
        Schema::new(vec![Field::new(field)]),
        rows,
    )?)
}

/// `select` as a pipeline step.
pub struct Select {
    pub fields: Vec<String>,
}

impl Operator for Select {
    fn name(&self) -> &'static str {
        "select"
    }

    fn eval(&self, input: Table, ctx: &mut OpContext) -> Result<Table, OpError> {
        select(&input, self.fields.as_slice(), ctx)
    }
}

/// `select_as` as a pipeline step.
pub struct SelectAs {
    pub mapping: Vec<(String, String)>,
}

impl Operator for SelectAs {
    fn name(&self) -> &'static str {
        "select_as"
    }

    fn eval(&self, input: Table, ctx: &mut OpContext) -> Result<Table, OpError> {
        select_as(&input, self.mapping.as_slice(), ctx)
    }
}

/// `select_unique` as a pipeline step.
pub struct SelectUnique {
    pub field: String,
}

impl Operator for SelectUnique {
    fn name(&self) -> &'static str {
        "select_unique"
    }

    fn eval(&self, input: Table, ctx: &mut OpContext) -> Result<Table, OpError> {
        select_unique(&input, &self.field, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::index;
    use csvq_core::compare::Comparator;

    fn people() -> Table {
        Table::from_rows(
            ["name", "title", "age"],
            vec![
                vec!["Ann".into(), "Director".into(), "52".into()],
                vec!["Bo".into(), "Clerk".into(), "23".into()],
                vec!["Cy".into(), "Clerk".into(), "31".into()],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_select_keeps_positional_order() {
        let t = people();
        let out = select(&t, &["age", "name"], &mut OpContext::lenient()).unwrap();
        assert_eq!(out.field_names(), vec!["name", "age"]);
        assert_eq!(out.rows()[1], vec!["Bo", "23"]);
    }

    #[test]
    fn test_select_unknown_field() {
        let t = people();
        let mut ctx = OpContext::lenient();
        let out = select(&t, &["name", "salary"], &mut ctx).unwrap();
        assert_eq!(out.field_names(), vec!["name"]);
        assert_eq!(ctx.warnings().len(), 1);
        assert!(select(&t, &["salary"], &mut OpContext::strict()).is_err());
    }

    #[test]
    fn test_select_index_state() {
        let mut t = people();
        index(&mut t, "age", Comparator::Integer, &mut OpContext::lenient()).unwrap();
        let kept = select(&t, &["age", "name"], &mut OpContext::lenient()).unwrap();
        assert_eq!(kept.index_state().unwrap().field, "age");
        let dropped = select(&t, &["name"], &mut OpContext::lenient()).unwrap();
        assert!(dropped.index_state().is_none());
    }

    #[test]
    fn test_select_as() {
        let t = people();
        let out = select_as(
            &t,
            &[("title", "role"), ("name", "who")],
            &mut OpContext::lenient(),
        )
        .unwrap();
        assert_eq!(out.field_names(), vec!["who", "role"]);
        assert_eq!(out.value(0, "role"), Some("Director"));
    }

    #[test]
    fn test_select_unique() {
        let t = people();
        let out = select_unique(&t, "title", &mut OpContext::lenient()).unwrap();
        assert_eq!(out.field_names(), vec!["title"]);
        assert_eq!(out.column("title").unwrap(), vec!["Director", "Clerk"]);
    }

    #[test]
    fn test_select_copy_isolation() {
        let t = people();
        let mut out = select(&t, &["name"], &mut OpContext::lenient()).unwrap();
        out.rows_mut()[0][0] = "Zed".into();
        assert_eq!(t.value(0, "name"), Some("Ann"));
    }
}
