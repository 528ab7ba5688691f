//! Left lookup join on one key field.
//!
//! Output fields: all left fields, then every right field except the key.
//! A right field whose name is already taken gets `RIGHT_SUFFIX` appended
//! until it is free.
//! Left rows without a match get empty strings. Left row order and the
//! left index state are kept.

use csvq_core::condition::Query;
use csvq_core::diagnostics::Warning;
use csvq_core::schema::{Field, Schema};
use csvq_core::table::{Row, Table};

use crate::query::query_one;
use crate::traits::{OpContext, OpError, Operator};

pub const RIGHT_SUFFIX: &str = "_right";

pub fn lookup_join(
    left: &Table,
    right: &Table,
    key: &str,
    ctx: &mut OpContext,
) -> Result<Table, OpError> {
    let (Some(left_key), Some(right_key)) = (
        left.schema().index_of(key),
        right.schema().index_of(key),
    ) else {
        ctx.warn(Warning::UnknownField {
            field: key.to_string(),
            context: "join".to_string(),
        })?;
        return Ok(left.clone());
    };

    let right_cols: Vec<usize> = (0..right.schema().len()).filter(|&i| i != right_key).collect();
    let mut fields = left.schema().fields.clone();
    for &i in &right_cols {
        let mut name = right.schema().fields[i].name.clone();
        while fields.iter().any(|f| f.name == name) {
            name.push_str(RIGHT_SUFFIX);
        }
        fields.push(Field::new(name));
    }
    let schema = Schema::from_names(fields.into_iter().map(|f| f.name))?;

    let narrowed = right.index_state().is_some_and(|s| s.field == key);
    tracing::debug!(
        key,
        left = left.len(),
        right = right.len(),
        narrowed,
        "lookup join"
    );

    let mut rows: Vec<Row> = Vec::with_capacity(left.len());
    let mut matched = 0usize;
    for l in left.rows() {
        let lookup = Query::new().eq(key, l[left_key].as_str());
        let hit = query_one(right, &lookup, ctx)?;
        let mut row = l.clone();
        match hit.rows().first() {
            Some(r) => {
                matched += 1;
                row.extend(right_cols.iter().map(|&i| r[i].clone()));
            }
            None => row.extend(right_cols.iter().map(|_| String::new())),
        }
        rows.push(row);
    }

    tracing::trace!(matched, unmatched = left.len() - matched, "lookup join done");
    Ok(Table::from_parts(schema, rows)?.with_index_state(left.index_state().cloned()))
}

/// Lookup join against a table loaded up front.
pub struct LookupJoin {
    pub right: Table,
    pub key: String,
}

impl Operator for LookupJoin {
    fn name(&self) -> &'static str {
        "join"
    }

    fn eval(&self, input: Table, ctx: &mut OpContext) -> Result<Table, OpError> {
        lookup_join(&input, &self.right, &self.key, ctx)
    }
}
