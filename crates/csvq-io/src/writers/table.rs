//! Fixed-width console grid.
//!
//! ```text
//! +======+==========+
//! | name |  title   |
//! +======+==========+
//! | Ann  | Director |
//! +------+----------+
//! ```
//!
//! Column width is the widest of the field name and its values, counted in
//! chars. Header cells are centered, row cells left-justified.

use std::io::Write;

use csvq_core::table::Table;

use crate::error::Result;

#[derive(Debug, Clone, Default)]
pub struct GridPrinter {
    /// Render at most this many rows; a trailing note counts the rest.
    pub max_rows: Option<usize>,
}

impl GridPrinter {
    pub fn new(max_rows: Option<usize>) -> Self {
        Self { max_rows }
    }

    pub fn render(&self, table: &Table) -> String {
        let names = table.field_names();
        let shown = self.max_rows.unwrap_or(usize::MAX).min(table.len());
        let rows = &table.rows()[..shown];

        let widths: Vec<usize> = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                rows.iter()
                    .map(|r| r[i].chars().count())
                    .chain(std::iter::once(name.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let bar = |c: char| {
            let mut s = String::from("+");
            for w in &widths {
                s.extend(std::iter::repeat(c).take(w + 2));
                s.push('+');
            }
            s.push('\n');
            s
        };

        let mut out = String::new();
        out.push_str(&bar('='));
        out.push('|');
        for (name, w) in names.iter().zip(&widths) {
            out.push_str(&format!(" {:^w$} |", name, w = w));
        }
        out.push('\n');
        out.push_str(&bar('='));

        for row in rows {
            out.push('|');
            for (cell, w) in row.iter().zip(&widths) {
                out.push_str(&format!(" {:<w$} |", cell, w = w));
            }
            out.push('\n');
            out.push_str(&bar('-'));
        }

        if shown < table.len() {
            out.push_str(&format!("... {} more rows\n", table.len() - shown));
        }
        out
    }

    pub fn print_to<W: Write>(&self, table: &Table, mut w: W) -> Result<()> {
        w.write_all(self.render(table).as_bytes())?;
        w.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn people() -> Table {
        Table::from_rows(
            ["name", "title"],
            vec![
                vec!["Ann".into(), "Director".into()],
                vec!["Bo".into(), "Clerk".into()],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_grid_layout() {
        let out = GridPrinter::default().render(&people());
        let expected = "\
+======+==========+
| name |  title   |
+======+==========+
| Ann  | Director |
+------+----------+
| Bo   | Clerk    |
+------+----------+
";
        assert_eq!(out, expected);
    }

    #[test]
    fn test_max_rows() {
        let out = GridPrinter::new(Some(1)).render(&people());
        assert!(out.contains("Ann"));
        assert!(!out.contains("Bo"));
        assert!(out.ends_with("... 1 more rows\n"));
    }

    #[test]
    fn test_empty_table_prints_header() {
        let t = Table::from_rows(["a"], vec![]).unwrap();
        assert_eq!(GridPrinter::default().render(&t), "+===+\n| a |\n+===+\n");
    }
}
