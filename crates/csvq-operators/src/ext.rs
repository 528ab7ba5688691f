//! Method-call sugar over the free operator functions.
//!
//! ```ignore
//! let mut ctx = OpContext::lenient();
//! let directors = table
//!     .indexed_by("n", Comparator::Integer, &mut ctx)?
//!     .query(&Query::new().eq("title", "Director"), &mut ctx)?
//!     .select(&["name"], &mut ctx)?;
//! ```

use csvq_core::compare::Comparator;
use csvq_core::condition::Query;
use csvq_core::table::Table;

use crate::traits::{OpContext, OpError};
use crate::{aggregate, index, join, map, project, query};

pub trait TableExt: Sized {
    /// Sort by `field` and record the index, returning the table.
    fn indexed_by(self, field: &str, comparator: Comparator, ctx: &mut OpContext)
        -> Result<Self, OpError>;

    fn query(&self, query: &Query, ctx: &mut OpContext) -> Result<Table, OpError>;

    fn query_one(&self, query: &Query, ctx: &mut OpContext) -> Result<Table, OpError>;

    fn select<S: AsRef<str>>(&self, fields: &[S], ctx: &mut OpContext) -> Result<Table, OpError>;

    fn select_unique(&self, field: &str, ctx: &mut OpContext) -> Result<Table, OpError>;

    fn renamed<K: AsRef<str>, V: AsRef<str>>(
        self,
        mapping: &[(K, V)],
        ctx: &mut OpContext,
    ) -> Result<Self, OpError>;

    fn join(&self, right: &Table, key: &str, ctx: &mut OpContext) -> Result<Table, OpError>;

    fn count(&self) -> usize;
}

impl TableExt for Table {
    fn indexed_by(
        mut self,
        field: &str,
        comparator: Comparator,
        ctx: &mut OpContext,
    ) -> Result<Self, OpError> {
        index::index(&mut self, field, comparator, ctx)?;
        Ok(self)
    }

    fn query(&self, q: &Query, ctx: &mut OpContext) -> Result<Table, OpError> {
        query::run_query(self, q, ctx)
    }

    fn query_one(&self, q: &Query, ctx: &mut OpContext) -> Result<Table, OpError> {
        query::query_one(self, q, ctx)
    }

    fn select<S: AsRef<str>>(&self, fields: &[S], ctx: &mut OpContext) -> Result<Table, OpError> {
        project::select(self, fields, ctx)
    }

    fn select_unique(&self, field: &str, ctx: &mut OpContext) -> Result<Table, OpError> {
        project::select_unique(self, field, ctx)
    }

    fn renamed<K: AsRef<str>, V: AsRef<str>>(
        mut self,
        mapping: &[(K, V)],
        ctx: &mut OpContext,
    ) -> Result<Self, OpError> {
        map::rename_fields(&mut self, mapping, ctx)?;
        Ok(self)
    }

    fn join(&self, right: &Table, key: &str, ctx: &mut OpContext) -> Result<Table, OpError> {
        join::lookup_join(self, right, key, ctx)
    }

    fn count(&self) -> usize {
        aggregate::count(self)
    }
}
