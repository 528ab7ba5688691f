//! Operator trait + common interfaces.
//!
//! The exec runtime threads one `Table` through a list of operators, each
//! consuming its input and returning the next table. Operators that only
//! need to read (query, select) build a fresh table; the indexer sorts its
//! input in place and hands the same table back.

use csvq_core::compare::Comparator;
use csvq_core::config::EngineConfig;
use csvq_core::diagnostics::{Diagnostics, Policy, Warning};
use csvq_core::table::Table;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OpError {
    #[error(transparent)]
    Core(#[from] csvq_core::error::Error),
}

/// Per-run state shared by operators: the diagnostics channel and the
/// comparator used when a query orders a field without naming one.
#[derive(Debug, Clone)]
pub struct OpContext {
    pub diagnostics: Diagnostics,
    pub default_comparator: Comparator,
}

impl OpContext {
    pub fn new(policy: Policy) -> Self {
        Self {
            diagnostics: Diagnostics::new(policy),
            default_comparator: Comparator::Float,
        }
    }

    pub fn lenient() -> Self {
        Self::new(Policy::Lenient)
    }

    pub fn strict() -> Self {
        Self::new(Policy::Strict)
    }

    pub fn from_config(cfg: &EngineConfig) -> Result<Self, OpError> {
        Ok(Self {
            diagnostics: cfg.diagnostics(),
            default_comparator: cfg.default_comparator()?,
        })
    }

    /// Report through the diagnostics channel; errors only under strict policy.
    pub fn warn(&mut self, warning: Warning) -> Result<(), OpError> {
        self.diagnostics.report(warning).map_err(OpError::from)
    }

    pub fn warnings(&self) -> &[Warning] {
        self.diagnostics.warnings()
    }
}

impl Default for OpContext {
    fn default() -> Self {
        Self::lenient()
    }
}

/// Trait that all table operators implement.
///
/// Invariants:
/// - `eval` must be deterministic given the same input and context.
/// - An operator never aliases row storage between its input and output.
pub trait Operator: Send + Sync {
    /// Human-readable operator name (stable).
    fn name(&self) -> &'static str;

    /// Transform one table into the next.
    fn eval(&self, input: Table, ctx: &mut OpContext) -> Result<Table, OpError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use csvq_core::error::Error;

    #[test]
    fn test_strict_warning_surfaces_as_core_error() {
        let mut ctx = OpContext::strict();
        let err = ctx
            .warn(Warning::UnknownField {
                field: "missing".into(),
                context: "filter".into(),
            })
            .unwrap_err();
        assert!(matches!(err, OpError::Core(Error::Schema(_))));
        assert!(err.to_string().starts_with("Schema error: "));
        assert!(ctx.warnings().is_empty());
    }

    #[test]
    fn test_lenient_warning_is_recorded() {
        let mut ctx = OpContext::lenient();
        ctx.warn(Warning::MalformedQuery("x".into())).unwrap();
        assert_eq!(ctx.warnings().len(), 1);
    }
}
