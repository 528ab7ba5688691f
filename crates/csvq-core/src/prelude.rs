//! Convenient re-exports for downstream crates.

pub use crate::compare::Comparator;
pub use crate::condition::{Condition, FieldFilter, Operator, Query};
pub use crate::config::EngineConfig;
pub use crate::diagnostics::{Diagnostics, Policy, Warning};
pub use crate::error::{Error, Result};
pub use crate::schema::{Field, Schema};
pub use crate::table::{IndexState, Row, RowView, Table};
