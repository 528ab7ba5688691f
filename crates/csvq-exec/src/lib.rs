#![forbid(unsafe_code)]
//! csvq-exec: runs a `ParsedPipeline` against real files.
//!
//! One table flows through the steps in order; each step is an operator
//! from `csvq-operators` except sinks, which write the current table and
//! pass it on unchanged. All steps share one diagnostics channel, so the
//! policy set in config applies to the whole run.

pub mod metrics;
pub mod runtime;

pub use runtime::{Engine, ExecError, RunReport, StepReport};
