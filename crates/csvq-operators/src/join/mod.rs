//! Joins.
//!
//! Only the lookup join exists: every left row looks up its first match in
//! the right table through `query_one`, so an index on the right key turns
//! each lookup into an edge search.

pub mod lookup;

pub use lookup::{lookup_join, LookupJoin, RIGHT_SUFFIX};
