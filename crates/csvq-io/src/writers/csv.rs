//! CSV writer: header record, then one record per row.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use csv::WriterBuilder;
use csvq_core::table::Table;

use crate::error::{Error, Result};

pub struct CsvWriter<W: Write> {
    wtr: csv::Writer<W>,
}

impl CsvWriter<File> {
    pub fn to_path(path: impl AsRef<Path>, delimiter: u8) -> Result<Self> {
        let f = File::create(path.as_ref())?;
        Ok(Self::to_writer(f, delimiter))
    }
}

impl<W: Write> CsvWriter<W> {
    pub fn to_writer(writer: W, delimiter: u8) -> Self {
        let wtr = WriterBuilder::new()
            .has_headers(false)
            .delimiter(delimiter)
            .from_writer(writer);
        Self { wtr }
    }

    /// Write `table`, or only the named `fields` of it.
    ///
    /// Selected fields come out in the table's own column order.
    pub fn write_table(&mut self, table: &Table, fields: Option<&[String]>) -> Result<()> {
        let cols = column_positions(table, fields)?;
        let names = table.field_names();
        self.wtr.write_record(cols.iter().map(|&i| names[i].as_str()))?;
        for row in table.rows() {
            self.wtr.write_record(cols.iter().map(|&i| row[i].as_str()))?;
        }
        self.wtr.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> Result<W> {
        self.wtr
            .into_inner()
            .map_err(|e| Error::Io(e.into_error()))
    }
}

pub(crate) fn column_positions(table: &Table, fields: Option<&[String]>) -> Result<Vec<usize>> {
    let Some(fields) = fields else {
        return Ok((0..table.schema().len()).collect());
    };
    let mut cols = fields
        .iter()
        .map(|f| {
            table
                .schema()
                .index_of(f)
                .ok_or_else(|| Error::Format(format!("field '{}' does not exist", f)))
        })
        .collect::<Result<Vec<_>>>()?;
    cols.sort_unstable();
    cols.dedup();
    Ok(cols)
}
