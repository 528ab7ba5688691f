//! CSV reader producing one fully materialized `Table`.
//!
//! The first record names the fields; every later record is a row. Cells
//! are kept as raw text. Records whose width differs from the header are
//! ragged: an error under the strict policy, skipped with a warning under
//! the lenient one.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use csvq_core::diagnostics::{Diagnostics, Warning};
use csvq_core::schema::Schema;
use csvq_core::table::{Row, Table};

use crate::error::Result;

pub struct CsvReader<R: Read> {
    rdr: csv::Reader<R>,
}

impl CsvReader<File> {
    pub fn from_path(path: impl AsRef<Path>, delimiter: u8) -> Result<Self> {
        let f = File::open(path.as_ref())?;
        Ok(Self::from_reader(f, delimiter))
    }
}

impl<'a> CsvReader<&'a [u8]> {
    pub fn from_text(text: &'a str, delimiter: u8) -> Self {
        Self::from_reader(text.as_bytes(), delimiter)
    }
}

impl<R: Read> CsvReader<R> {
    pub fn from_reader(reader: R, delimiter: u8) -> Self {
        let rdr = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(delimiter)
            .from_reader(reader);
        Self { rdr }
    }

    /// Read everything. Empty input gives a table with no fields.
    pub fn read_table(mut self, diag: &mut Diagnostics) -> Result<Table> {
        let mut records = self.rdr.records();
        let header = match records.next() {
            Some(rec) => rec?,
            None => return Ok(Table::default()),
        };
        let schema = Schema::from_names(header.iter())?;

        let mut rows: Vec<Row> = Vec::new();
        let mut skipped = 0usize;
        for (i, rec) in records.enumerate() {
            let rec = rec?;
            if rec.len() != schema.len() {
                diag.report(Warning::RaggedRow {
                    // header is record 1
                    record: i + 2,
                    found: rec.len(),
                    expected: schema.len(),
                })?;
                skipped += 1;
                continue;
            }
            rows.push(to_row(&rec));
        }

        tracing::debug!(fields = schema.len(), rows = rows.len(), skipped, "csv loaded");
        Ok(Table::from_parts(schema, rows)?)
    }
}

fn to_row(rec: &StringRecord) -> Row {
    rec.iter().map(str::to_string).collect()
}

/// Parse CSV text into a table.
pub fn parse_csv(text: &str, delimiter: u8, diag: &mut Diagnostics) -> Result<Table> {
    CsvReader::from_text(text, delimiter).read_table(diag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_basic() {
        let mut diag = Diagnostics::lenient();
        let t = parse_csv("name,title\nAnn,Director\nBo,\"Clerk, junior\"\n", b',', &mut diag)
            .unwrap();
        assert_eq!(t.field_names(), vec!["name", "title"]);
        assert_eq!(t.len(), 2);
        assert_eq!(t.value(1, "title"), Some("Clerk, junior"));
        assert!(t.index_state().is_none());
        assert!(diag.is_empty());
    }

    #[test]
    fn test_values_stay_raw_text() {
        let t = parse_csv("n\n007\n 1.50\n", b',', &mut Diagnostics::lenient()).unwrap();
        assert_eq!(t.column("n").unwrap(), vec!["007", " 1.50"]);
    }

    #[test]
    fn test_custom_delimiter() {
        let t = parse_csv("a;b\n1;2\n", b';', &mut Diagnostics::lenient()).unwrap();
        assert_eq!(t.rows()[0], vec!["1", "2"]);
    }

    #[test]
    fn test_ragged_rows() {
        let text = "a,b\n1,2\n3\n4,5,6\n7,8\n";
        let mut diag = Diagnostics::lenient();
        let t = parse_csv(text, b',', &mut diag).unwrap();
        assert_eq!(t.column("a").unwrap(), vec!["1", "7"]);
        assert_eq!(diag.warnings().len(), 2);
        assert!(matches!(
            diag.warnings()[0],
            Warning::RaggedRow { record: 3, found: 1, expected: 2 }
        ));

        assert!(parse_csv(text, b',', &mut Diagnostics::strict()).is_err());
    }

    #[test]
    fn test_empty_and_header_only() {
        let t = parse_csv("", b',', &mut Diagnostics::lenient()).unwrap();
        assert!(t.schema().is_empty());
        let t = parse_csv("a,b\n", b',', &mut Diagnostics::lenient()).unwrap();
        assert_eq!(t.schema().len(), 2);
        assert!(t.is_empty());
    }

    #[test]
    fn test_duplicate_header_is_an_error() {
        assert!(parse_csv("a,a\n1,2\n", b',', &mut Diagnostics::lenient()).is_err());
    }

    #[test]
    fn test_from_path() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "x,y\n1,2\n").unwrap();
        let t = CsvReader::from_path(f.path(), b',')
            .unwrap()
            .read_table(&mut Diagnostics::lenient())
            .unwrap();
        assert_eq!(t.value(0, "y"), Some("2"));
        assert!(CsvReader::from_path("/definitely/not/here.csv", b',').is_err());
    }
}
