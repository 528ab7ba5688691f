//! Readers that materialize a whole `Table`.

pub mod csv;
