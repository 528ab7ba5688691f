//! Typed pipeline: what the runtime executes.

use std::fmt;
use std::str::FromStr;

use csvq_core::compare::Comparator;
use csvq_core::condition::Query;

use crate::dsl::yaml::PipelineConfig;
use crate::error::PlanError;

/// A CSV file to load.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSpec {
    pub path: String,
    /// Overrides the engine delimiter for this file only.
    pub delimiter: Option<char>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkFormat {
    Csv,
    Jsonl,
    /// Console grid.
    Table,
}

impl SinkFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            SinkFormat::Csv => "csv",
            SinkFormat::Jsonl => "jsonl",
            SinkFormat::Table => "table",
        }
    }
}

impl fmt::Display for SinkFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SinkFormat {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(SinkFormat::Csv),
            "jsonl" | "ndjson" | "json" => Ok(SinkFormat::Jsonl),
            "table" | "grid" => Ok(SinkFormat::Table),
            other => Err(PlanError::Invalid(format!("unknown sink format '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SinkSpec {
    /// `None` writes to stdout.
    pub destination: Option<String>,
    pub format: SinkFormat,
    pub delimiter: Option<char>,
    pub fields: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlanStep {
    /// `None` comparator means the engine default.
    Index {
        field: String,
        comparator: Option<Comparator>,
    },
    AlreadyIndexed {
        field: String,
        comparator: Option<Comparator>,
    },
    Query {
        query: Option<Query>,
        limit_one: bool,
    },
    Select {
        fields: Vec<String>,
    },
    SelectAs {
        mapping: Vec<(String, String)>,
    },
    SelectUnique {
        field: String,
    },
    Rename {
        mapping: Vec<(String, String)>,
    },
    AddField {
        field: String,
        value: String,
    },
    Join {
        source: SourceSpec,
        key: String,
        /// Index the right table on `key` before joining.
        index: bool,
    },
    Sink(SinkSpec),
}

impl PlanStep {
    pub fn name(&self) -> &'static str {
        match self {
            PlanStep::Index { .. } => "index",
            PlanStep::AlreadyIndexed { .. } => "already_indexed",
            PlanStep::Query {
                limit_one: false, ..
            } => "query",
            PlanStep::Query { limit_one: true, .. } => "query_one",
            PlanStep::Select { .. } => "select",
            PlanStep::SelectAs { .. } => "select_as",
            PlanStep::SelectUnique { .. } => "select_unique",
            PlanStep::Rename { .. } => "rename",
            PlanStep::AddField { .. } => "add_field",
            PlanStep::Join { .. } => "join",
            PlanStep::Sink(_) => "sink",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ParsedPipeline {
    pub config: PipelineConfig,
    pub source: SourceSpec,
    pub steps: Vec<PlanStep>,
}

impl ParsedPipeline {
    pub fn sinks(&self) -> impl Iterator<Item = &SinkSpec> {
        self.steps.iter().filter_map(|s| match s {
            PlanStep::Sink(spec) => Some(spec),
            _ => None,
        })
    }
}
