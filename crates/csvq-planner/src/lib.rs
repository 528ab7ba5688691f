#![forbid(unsafe_code)]
//! csvq-planner: from a YAML pipeline document to a validated, typed list
//! of steps, plus an `explain` view of it.
//!
//! Design:
//! - `dsl::yaml` owns the document shape (serde) and all validation, so a
//!   `ParsedPipeline` only holds resolved comparators, parsed condition
//!   trees and known sink formats.
//! - `plan` is the typed step list the exec runtime walks.
//! - `explain` replays the index state through the steps to tell which
//!   queries will be range-narrowed.
//!
//! No IO here: paths are carried, never opened.

pub mod dsl;
pub mod error;
pub mod explain;
pub mod plan;

pub use dsl::yaml::{parse_yaml_pipeline, PipelineConfig};
pub use error::{PlanError, Result};
pub use explain::{explain, PlannedStep};
pub use plan::{ParsedPipeline, PlanStep, SinkFormat, SinkSpec, SourceSpec};
