//! Explain: a readable step list with the index state replayed through it.
//!
//! Tracks which field (and comparator) the table is indexed on after each
//! step, using the same rules as the operators: query results carry no
//! index, projections keep it while the field survives, renames carry it
//! along, column additions and joins keep it.

use std::fmt;

use csvq_core::compare::Comparator;

use crate::plan::{ParsedPipeline, PlanStep};

#[derive(Debug, Clone, PartialEq)]
pub struct PlannedStep {
    /// 1-based.
    pub position: usize,
    pub op: &'static str,
    pub detail: String,
    /// Indexed field going into this step.
    pub indexed_on: Option<String>,
    /// Query steps only: whether the indexed field bounds the scan.
    pub range_narrowed: Option<bool>,
}

impl fmt::Display for PlannedStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {:<15} {}", self.position, self.op, self.detail)?;
        match (self.range_narrowed, &self.indexed_on) {
            (Some(true), Some(field)) => write!(f, "  (range on '{}')", field),
            (Some(false), _) => write!(f, "  (full scan)"),
            _ => Ok(()),
        }
    }
}

/// Lower the pipeline to annotated steps. `default` is the comparator an
/// index or query falls back to when none is named.
pub fn explain(pipeline: &ParsedPipeline, default: &Comparator) -> Vec<PlannedStep> {
    let mut index: Option<(String, Comparator)> = None;
    let mut out = Vec::with_capacity(pipeline.steps.len());

    for (i, step) in pipeline.steps.iter().enumerate() {
        let indexed_on = index.as_ref().map(|(f, _)| f.clone());
        let mut range_narrowed = None;
        let detail = match step {
            PlanStep::Index { field, comparator } | PlanStep::AlreadyIndexed { field, comparator } => {
                let c = comparator.clone().unwrap_or_else(|| default.clone());
                let detail = format!("field={} comparison={}", field, c.name());
                index = Some((field.clone(), c));
                detail
            }
            PlanStep::Query { query, .. } => {
                match query {
                    Some(q) => {
                        let narrowed = index.as_ref().is_some_and(|(field, c)| {
                            q.get(field).is_some_and(|filter| {
                                // An unknown name falls back to the default at run time.
                                let resolved = match (&filter.comparison, &filter.invalid_comparison) {
                                    (Some(own), _) => own,
                                    (None, Some(_)) => default,
                                    (None, None) => c,
                                };
                                resolved == c
                            })
                        });
                        range_narrowed = Some(narrowed);
                        index = None;
                        format!("where={}", q.to_json())
                    }
                    // Identity: the input, index included, passes through.
                    None => "where=<none>".to_string(),
                }
            }
            PlanStep::Select { fields } => {
                if index.as_ref().is_some_and(|(f, _)| !fields.contains(f)) {
                    index = None;
                }
                format!("fields={}", fields.join(","))
            }
            PlanStep::SelectAs { mapping } => {
                index = index.and_then(|(f, c)| {
                    mapping
                        .iter()
                        .find(|(old, _)| *old == f)
                        .map(|(_, new)| (new.clone(), c))
                });
                format!("fields={}", render_mapping(mapping))
            }
            PlanStep::SelectUnique { field } => {
                index = None;
                format!("field={}", field)
            }
            PlanStep::Rename { mapping } => {
                if let Some((f, _)) = index.as_mut() {
                    if let Some((_, new)) = mapping.iter().find(|(old, _)| old == f) {
                        *f = new.clone();
                    }
                }
                format!("fields={}", render_mapping(mapping))
            }
            PlanStep::AddField { field, value } => format!("field={} value={:?}", field, value),
            PlanStep::Join { source, key, index: indexed } => format!(
                "source={} key={}{}",
                source.path,
                key,
                if *indexed { " (indexed lookups)" } else { "" }
            ),
            PlanStep::Sink(sink) => format!(
                "destination={} format={}",
                sink.destination.as_deref().unwrap_or("stdout"),
                sink.format
            ),
        };
        out.push(PlannedStep {
            position: i + 1,
            op: step.name(),
            detail,
            indexed_on,
            range_narrowed,
        });
    }
    out
}

fn render_mapping(mapping: &[(String, String)]) -> String {
    mapping
        .iter()
        .map(|(old, new)| format!("{}->{}", old, new))
        .collect::<Vec<_>>()
        .join(",")
}
