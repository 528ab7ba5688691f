//! NDJSON writer: one JSON object per row, keys in field order.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use csvq_core::table::Table;
use serde_json::{Map, Value};

use crate::error::Result;
use crate::writers::csv::column_positions;

pub struct JsonlWriter<W: Write> {
    writer: BufWriter<W>,
}

impl JsonlWriter<File> {
    pub fn to_path(path: impl AsRef<Path>) -> Result<Self> {
        let f = File::create(path.as_ref())?;
        Ok(Self::to_writer(f))
    }
}

impl<W: Write> JsonlWriter<W> {
    pub fn to_writer(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
        }
    }

    /// Write every row of `table` (or only `fields` of it) as one line.
    pub fn write_table(&mut self, table: &Table, fields: Option<&[String]>) -> Result<()> {
        let cols = column_positions(table, fields)?;
        let names = table.field_names();
        for row in table.rows() {
            let obj: Map<String, Value> = cols
                .iter()
                .map(|&i| (names[i].clone(), Value::String(row[i].clone())))
                .collect();
            let line = serde_json::to_string(&obj)?;
            writeln!(self.writer, "{}", line)?;
        }
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| e.into_error().into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_as_objects_in_field_order() {
        let t = Table::from_rows(
            ["zeta", "alpha"],
            vec![
                vec!["1".into(), "a \"q\"".into()],
                vec!["2".into(), "".into()],
            ],
        )
        .unwrap();
        let mut w = JsonlWriter::to_writer(Vec::new());
        w.write_table(&t, None).unwrap();
        let out = String::from_utf8(w.into_inner().unwrap()).unwrap();
        assert_eq!(
            out,
            "{\"zeta\":\"1\",\"alpha\":\"a \\\"q\\\"\"}\n{\"zeta\":\"2\",\"alpha\":\"\"}\n"
        );
    }

    #[test]
    fn test_empty_table_writes_nothing() {
        let t = Table::from_rows(["a"], vec![]).unwrap();
        let mut w = JsonlWriter::to_writer(Vec::new());
        w.write_table(&t, None).unwrap();
        assert!(w.into_inner().unwrap().is_empty());
    }
}
