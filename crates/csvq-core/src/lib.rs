#![forbid(unsafe_code)]
//! csvq-core: tables, comparators, condition trees, diagnostics and config.
//!
//! Pure data plus the small amount of logic that belongs to the data itself
//! (comparator ordering, condition parsing, index-state bookkeeping). The
//! query engine lives in `csvq-operators`; file formats live in `csvq-io`.

pub mod compare;
pub mod condition;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod prelude;
pub mod schema;
pub mod table;
