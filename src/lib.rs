#![forbid(unsafe_code)]
//! csvq: MongoDB-style queries over in-memory CSV tables.
//!
//! This facade re-exports the workspace crates so integration tests and
//! benchmarks can reach everything through one dependency.

pub use csvq_core as core;
pub use csvq_exec as exec;
pub use csvq_io as io;
pub use csvq_operators as operators;
pub use csvq_planner as planner;
