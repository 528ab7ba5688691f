//! Runtime: load the source, walk the steps, write sinks, report.
//!
//! - Each non-sink step is instantiated as a `Box<dyn Operator>` and fed
//!   the previous step's table.
//! - Join steps load (and optionally index) their right table up front.
//! - Sinks with no destination write to the writer handed to `run_to`.
//! - The first escalated diagnostic (strict policy) aborts the run.

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::time::Instant;

use serde::Serialize;
use thiserror::Error;

use csvq_core::compare::Comparator;
use csvq_core::config::EngineConfig;
use csvq_core::diagnostics::Warning;
use csvq_core::table::Table;

use csvq_io::readers::csv::CsvReader;
use csvq_io::writers::csv::CsvWriter;
use csvq_io::writers::jsonl::JsonlWriter;
use csvq_io::writers::table::GridPrinter;

use csvq_operators::index::{index, AlreadyIndexed, Index};
use csvq_operators::join::LookupJoin;
use csvq_operators::map::{AddField, Rename};
use csvq_operators::project::{Select, SelectAs, SelectUnique};
use csvq_operators::query::QueryOp;
use csvq_operators::traits::{OpContext, OpError, Operator};

use csvq_planner::plan::{ParsedPipeline, PlanStep, SinkFormat, SinkSpec, SourceSpec};

use crate::metrics::emit_span;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("step {position} ({op}): {source}")]
    Operator {
        position: usize,
        op: &'static str,
        #[source]
        source: OpError,
    },
    #[error("io: {0}")]
    Io(#[from] csvq_io::Error),
    #[error(transparent)]
    Core(#[from] csvq_core::error::Error),
    #[error("invalid plan: {0}")]
    Invalid(String),
}

/// Row counts and timing for one executed step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepReport {
    pub position: usize,
    pub op: &'static str,
    pub rows_in: usize,
    pub rows_out: usize,
    pub millis: u128,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub source_rows: usize,
    pub steps: Vec<StepReport>,
    /// Rendered diagnostics, in the order they were reported.
    pub warnings: Vec<String>,
    pub elapsed_ms: u128,
    #[serde(skip)]
    pub output: Table,
}

impl RunReport {
    pub fn rows_out(&self) -> usize {
        self.output.len()
    }
}

/// Engine owns the resolved configuration for a run.
pub struct Engine {
    cfg: EngineConfig,
    default_comparator: Comparator,
    delimiter: u8,
}

impl Engine {
    pub fn new(cfg: EngineConfig) -> Result<Self, ExecError> {
        let default_comparator = cfg.default_comparator()?;
        let delimiter = cfg.delimiter_byte()?;
        Ok(Self {
            cfg,
            default_comparator,
            delimiter,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    /// Run with console sinks going to stdout.
    pub fn run(&self, pipeline: &ParsedPipeline) -> Result<RunReport, ExecError> {
        let stdout = io::stdout();
        let mut lock = stdout.lock();
        self.run_to(pipeline, &mut lock)
    }

    /// Run with console sinks going to `console`.
    pub fn run_to<W: Write>(
        &self,
        pipeline: &ParsedPipeline,
        console: &mut W,
    ) -> Result<RunReport, ExecError> {
        let started = Instant::now();
        let mut ctx = self.context();

        let mut table = self.load(&pipeline.source, &mut ctx)?;
        let source_rows = table.len();
        tracing::info!(path = %pipeline.source.path, rows = source_rows, "source loaded");

        let mut steps = Vec::with_capacity(pipeline.steps.len());
        for (i, step) in pipeline.steps.iter().enumerate() {
            let position = i + 1;
            let op_started = Instant::now();
            let rows_in = table.len();

            table = match step {
                PlanStep::Sink(sink) => {
                    self.write_sink(&table, sink, console)?;
                    table
                }
                other => {
                    let op = self.instantiate(position, other, &mut ctx)?;
                    op.eval(table, &mut ctx).map_err(|source| ExecError::Operator {
                        position,
                        op: step.name(),
                        source,
                    })?
                }
            };

            let report = StepReport {
                position,
                op: step.name(),
                rows_in,
                rows_out: table.len(),
                millis: op_started.elapsed().as_millis(),
            };
            tracing::info!(
                step = position,
                op = report.op,
                rows_in,
                rows_out = report.rows_out,
                "step done"
            );
            emit_span(
                "step",
                &[
                    ("op", report.op.to_string()),
                    ("rows_in", rows_in.to_string()),
                    ("rows_out", report.rows_out.to_string()),
                    ("millis", report.millis.to_string()),
                ],
            );
            steps.push(report);
        }

        let warnings = ctx.diagnostics.take();
        Ok(RunReport {
            source_rows,
            steps,
            warnings: warnings.iter().map(Warning::to_string).collect(),
            elapsed_ms: started.elapsed().as_millis(),
            output: table,
        })
    }

    fn context(&self) -> OpContext {
        let mut ctx = OpContext::new(self.cfg.policy);
        ctx.default_comparator = self.default_comparator.clone();
        ctx
    }

    /// Load a CSV source with this engine's delimiter unless it names its own.
    pub fn load(&self, source: &SourceSpec, ctx: &mut OpContext) -> Result<Table, ExecError> {
        let delimiter = match source.delimiter {
            Some(c) => ascii_byte(c)?,
            None => self.delimiter,
        };
        let table = CsvReader::from_path(&source.path, delimiter)?.read_table(&mut ctx.diagnostics)?;
        Ok(table)
    }

    fn instantiate(
        &self,
        position: usize,
        step: &PlanStep,
        ctx: &mut OpContext,
    ) -> Result<Box<dyn Operator>, ExecError> {
        let comparator =
            |c: &Option<Comparator>| c.clone().unwrap_or_else(|| self.default_comparator.clone());
        Ok(match step {
            PlanStep::Index {
                field,
                comparator: c,
            } => Box::new(Index {
                field: field.clone(),
                comparator: comparator(c),
            }),
            PlanStep::AlreadyIndexed {
                field,
                comparator: c,
            } => Box::new(AlreadyIndexed {
                field: field.clone(),
                comparator: comparator(c),
            }),
            PlanStep::Query { query, limit_one } => Box::new(QueryOp {
                query: query.clone(),
                limit_one: *limit_one,
            }),
            PlanStep::Select { fields } => Box::new(Select {
                fields: fields.clone(),
            }),
            PlanStep::SelectAs { mapping } => Box::new(SelectAs {
                mapping: mapping.clone(),
            }),
            PlanStep::SelectUnique { field } => Box::new(SelectUnique {
                field: field.clone(),
            }),
            PlanStep::Rename { mapping } => Box::new(Rename {
                mapping: mapping.clone(),
            }),
            PlanStep::AddField { field, value } => Box::new(AddField {
                field: field.clone(),
                value: value.clone(),
            }),
            PlanStep::Join {
                source,
                key,
                index: index_right,
            } => {
                let mut right = self.load(source, ctx)?;
                if *index_right {
                    // Equality lookups only need a consistent order.
                    index(&mut right, key, Comparator::Lexical, ctx).map_err(|source| {
                        ExecError::Operator {
                            position,
                            op: "join",
                            source,
                        }
                    })?;
                }
                Box::new(LookupJoin {
                    right,
                    key: key.clone(),
                })
            }
            PlanStep::Sink(_) => {
                return Err(ExecError::Invalid("sink is not an operator".into()));
            }
        })
    }

    fn write_sink<W: Write>(
        &self,
        table: &Table,
        sink: &SinkSpec,
        console: &mut W,
    ) -> Result<(), ExecError> {
        let delimiter = match sink.delimiter {
            Some(c) => ascii_byte(c)?,
            None => self.delimiter,
        };
        let fields = sink.fields.as_deref();

        match &sink.destination {
            Some(path) => {
                if let Some(parent) = Path::new(path).parent() {
                    if !parent.as_os_str().is_empty() {
                        fs::create_dir_all(parent).map_err(csvq_io::Error::from)?;
                    }
                }
                match sink.format {
                    SinkFormat::Csv => CsvWriter::to_path(path, delimiter)?.write_table(table, fields)?,
                    SinkFormat::Jsonl => JsonlWriter::to_path(path)?.write_table(table, fields)?,
                    SinkFormat::Table => {
                        let f = fs::File::create(path).map_err(csvq_io::Error::from)?;
                        self.grid().print_to(&projected(table, fields)?, f)?
                    }
                }
                tracing::info!(path = %path, format = %sink.format, rows = table.len(), "sink written");
            }
            None => match sink.format {
                SinkFormat::Csv => CsvWriter::to_writer(&mut *console, delimiter).write_table(table, fields)?,
                SinkFormat::Jsonl => JsonlWriter::to_writer(&mut *console).write_table(table, fields)?,
                SinkFormat::Table => self.grid().print_to(&projected(table, fields)?, &mut *console)?,
            },
        }
        Ok(())
    }

    fn grid(&self) -> GridPrinter {
        GridPrinter::new(self.cfg.max_print_rows)
    }
}

/// The grid printer has no field subset of its own.
fn projected(table: &Table, fields: Option<&[String]>) -> Result<Table, ExecError> {
    let Some(fields) = fields else {
        return Ok(table.clone());
    };
    let mut ctx = OpContext::strict();
    csvq_operators::project::select(table, fields, &mut ctx).map_err(|source| ExecError::Operator {
        position: 0,
        op: "sink",
        source,
    })
}

fn ascii_byte(c: char) -> Result<u8, ExecError> {
    u8::try_from(c).map_err(|_| ExecError::Invalid(format!("delimiter '{}' is not ASCII", c)))
}
