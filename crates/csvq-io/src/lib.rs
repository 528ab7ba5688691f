#![forbid(unsafe_code)]
//! csvq-io: getting tables in and out.
//!
//! - `readers::csv` turns delimited text into a `Table` (first record is
//!   the header, every cell stays raw text).
//! - `writers` serialize a `Table` as CSV, NDJSON or a console grid.

pub mod error;
pub mod readers;
pub mod writers;

pub use error::{Error, Result};
pub use readers::csv::{parse_csv, CsvReader};
pub use writers::csv::CsvWriter;
pub use writers::jsonl::JsonlWriter;
pub use writers::table::GridPrinter;
