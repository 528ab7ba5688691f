//! YAML → `ParsedPipeline` for linear pipelines.
//!
//! Example:
//! ```yaml
//! config: { policy: strict }
//! source: { path: "data/people.csv", delimiter: "," }
//! steps:
//!   - op: index
//!     field: age
//!     comparison: integer
//!   - op: query
//!     where: { age: { gte: 30 }, title: "Director" }
//!   - op: select
//!     fields: [name, age]
//!   - op: sink
//!     destination: "out/directors.csv"
//!     format: csv
//! ```
//!
//! Every `where` is parsed into a `Query` and every comparison name is
//! resolved here, so a pipeline that parses cannot fail later on its own
//! syntax.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use csvq_core::compare::Comparator;
use csvq_core::condition::Query;
use csvq_core::config::{parse_delimiter, EngineConfig};
use csvq_core::diagnostics::Policy;

use crate::error::{PlanError, Result};
use crate::plan::{ParsedPipeline, PlanStep, SinkSpec, SourceSpec};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pipeline {
    #[serde(default)]
    pub config: Option<PipelineConfig>,
    pub source: Source,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub path: String,
    #[serde(default)]
    pub delimiter: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "op")]
pub enum Step {
    Index {
        field: String,
        #[serde(default)]
        comparison: Option<String>,
    },

    AlreadyIndexed {
        field: String,
        #[serde(default)]
        comparison: Option<String>,
    },

    Query {
        #[serde(rename = "where", default)]
        condition: Option<Value>,
    },

    QueryOne {
        #[serde(rename = "where", default)]
        condition: Option<Value>,
    },

    Select { fields: Vec<String> },

    SelectAs { fields: Map<String, Value> },

    SelectUnique { field: String },

    Rename { fields: Map<String, Value> },

    AddField {
        field: String,
        #[serde(default)]
        value: String,
    },

    Join {
        source: String,
        key: String,
        #[serde(default)]
        index: bool,
        #[serde(default)]
        delimiter: Option<String>,
    },

    Sink {
        #[serde(default)]
        destination: Option<String>,
        #[serde(default = "default_sink_format")]
        format: String,
        #[serde(default)]
        delimiter: Option<String>,
        #[serde(default)]
        fields: Option<Vec<String>>,
    },
}

fn default_sink_format() -> String {
    "csv".to_string()
}

/// Engine settings carried in the pipeline file. Unset keys leave the
/// environment/default value alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub policy: Option<Policy>,
    pub delimiter: Option<String>,
    pub default_comparison: Option<String>,
    pub max_print_rows: Option<usize>,
}

impl PipelineConfig {
    /// Layer these settings over `cfg`.
    pub fn apply_to(&self, cfg: &mut EngineConfig) -> Result<()> {
        if let Some(p) = self.policy {
            cfg.policy = p;
        }
        if let Some(d) = &self.delimiter {
            cfg.delimiter = parse_delimiter(d)?;
        }
        if let Some(name) = &self.default_comparison {
            name.parse::<Comparator>()?;
            cfg.default_comparison = name.clone();
        }
        if let Some(n) = self.max_print_rows {
            cfg.max_print_rows = Some(n);
        }
        Ok(())
    }
}

/// Parse and validate a YAML pipeline.
pub fn parse_yaml_pipeline(yaml_src: &str) -> Result<ParsedPipeline> {
    let doc: Pipeline = serde_yaml::from_str(yaml_src)?;

    if doc.source.path.trim().is_empty() {
        return Err(PlanError::Invalid("source path is empty".into()));
    }
    if doc.steps.is_empty() {
        return Err(PlanError::Invalid("pipeline has no steps".into()));
    }

    let config = doc.config.unwrap_or_default();
    // Surface bad config values at parse time too.
    config.apply_to(&mut EngineConfig::default())?;

    let source = source_spec(doc.source.path, doc.source.delimiter.as_deref())?;
    let steps = doc
        .steps
        .into_iter()
        .enumerate()
        .map(|(i, step)| {
            lower_step(step).map_err(|e| PlanError::Invalid(format!("step {}: {}", i + 1, e)))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ParsedPipeline {
        config,
        source,
        steps,
    })
}

fn lower_step(step: Step) -> Result<PlanStep> {
    Ok(match step {
        Step::Index { field, comparison } => PlanStep::Index {
            field: non_empty("field", field)?,
            comparator: comparator(comparison.as_deref())?,
        },
        Step::AlreadyIndexed { field, comparison } => PlanStep::AlreadyIndexed {
            field: non_empty("field", field)?,
            comparator: comparator(comparison.as_deref())?,
        },
        Step::Query { condition } => PlanStep::Query {
            query: where_clause(condition.as_ref())?,
            limit_one: false,
        },
        Step::QueryOne { condition } => PlanStep::Query {
            query: where_clause(condition.as_ref())?,
            limit_one: true,
        },
        Step::Select { fields } => PlanStep::Select { fields },
        Step::SelectAs { fields } => PlanStep::SelectAs {
            mapping: field_mapping(fields)?,
        },
        Step::SelectUnique { field } => PlanStep::SelectUnique {
            field: non_empty("field", field)?,
        },
        Step::Rename { fields } => PlanStep::Rename {
            mapping: field_mapping(fields)?,
        },
        Step::AddField { field, value } => PlanStep::AddField {
            field: non_empty("field", field)?,
            value,
        },
        Step::Join {
            source,
            key,
            index,
            delimiter,
        } => PlanStep::Join {
            source: source_spec(source, delimiter.as_deref())?,
            key: non_empty("key", key)?,
            index,
        },
        Step::Sink {
            destination,
            format,
            delimiter,
            fields,
        } => PlanStep::Sink(SinkSpec {
            destination: destination.filter(|d| !d.is_empty() && d != "-"),
            format: format.parse()?,
            delimiter: delimiter.as_deref().map(parse_delimiter).transpose()?,
            fields,
        }),
    })
}

fn source_spec(path: String, delimiter: Option<&str>) -> Result<SourceSpec> {
    Ok(SourceSpec {
        path: non_empty("source", path)?,
        delimiter: delimiter.map(parse_delimiter).transpose()?,
    })
}

/// Parse a `where` tree. Comparison names must resolve here; at query time
/// an unknown one would silently fall back to the default.
fn where_clause(tree: Option<&Value>) -> Result<Option<Query>> {
    let Some(tree) = tree else {
        return Ok(None);
    };
    let query = Query::from_json(tree)?;
    for (field, filter) in query.iter() {
        if let Some(name) = &filter.invalid_comparison {
            return Err(PlanError::Invalid(format!(
                "unknown comparison '{}' on field '{}'",
                name, field
            )));
        }
    }
    Ok(Some(query))
}

fn comparator(name: Option<&str>) -> Result<Option<Comparator>> {
    Ok(name.map(str::parse::<Comparator>).transpose()?)
}

fn non_empty(what: &str, s: String) -> Result<String> {
    if s.trim().is_empty() {
        return Err(PlanError::Invalid(format!("'{}' is empty", what)));
    }
    Ok(s)
}

/// `{old: new}` in document order. Values must be strings.
fn field_mapping(fields: Map<String, Value>) -> Result<Vec<(String, String)>> {
    fields
        .into_iter()
        .map(|(old, new)| match new {
            Value::String(s) => Ok((old, s)),
            other => Err(PlanError::Invalid(format!(
                "new name for '{}' must be a string, got {}",
                old, other
            ))),
        })
        .collect()
}
