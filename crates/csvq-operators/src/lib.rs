#![forbid(unsafe_code)]
//! csvq-operators: the query engine and the table operators built on it.
//!
//! Design intent:
//! - Pure and synchronous; one fully materialized `Table` at a time.
//! - The engine proper is `index` (sort + record index state), `range`
//!   (edge search over the indexed column), `predicate` (condition
//!   evaluation) and `query` (narrow, scan, materialize).
//! - Everything else (`project`, `map`, `join`, `aggregate`) is glue that
//!   reuses the engine where it can, e.g. the join looks rows up with
//!   `query_one`.
//! - Each operation reports recoverable problems through the
//!   `OpContext` diagnostics instead of printing or panicking.

pub mod aggregate;
pub mod ext;
pub mod index;
pub mod join;
pub mod map;
pub mod predicate;
pub mod project;
pub mod query;
pub mod range;
pub mod traits;

pub use ext::TableExt;
pub use range::RangeResolution;
pub use traits::{OpContext, OpError, Operator};
