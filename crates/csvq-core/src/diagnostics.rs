//! Diagnostics channel shared by every table operation.
//!
//! Bad input never aborts a whole query on its own. Each recoverable problem
//! is reported as a [`Warning`]; the caller's [`Policy`] decides what happens
//! next:
//!
//! - `Lenient`: log it (`tracing::warn!`), keep it, degrade (skip the field,
//!   no-op the index, return an empty result).
//! - `Strict`: turn it into the matching [`Error`] and propagate.
//!
//! `DefaultComparator` is informational and never escalates.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Policy {
    Strict,
    #[default]
    Lenient,
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Policy::Strict => write!(f, "strict"),
            Policy::Lenient => write!(f, "lenient"),
        }
    }
}

impl std::str::FromStr for Policy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Policy::Strict),
            "lenient" => Ok(Policy::Lenient),
            other => Err(Error::Config(format!("unknown policy '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Warning {
    #[error("field '{field}' does not exist, skipping {context}")]
    UnknownField { field: String, context: String },

    #[error("operator '{operator}' on field '{field}' does not exist, skipping")]
    UnknownOperator { field: String, operator: String },

    #[error("comparison '{name}' for field '{field}' is unknown, using default comparison instead")]
    UnknownComparator { field: String, name: String },

    #[error("comparison not specified for '{field}' filter, using default comparison")]
    DefaultComparator { field: String },

    #[error("invalid bounds [{low}, {high}) over {rows} rows, returning empty table")]
    InvalidBounds { low: usize, high: usize, rows: usize },

    #[error("malformed query: {0}")]
    MalformedQuery(String),

    #[error("record {record} has {found} values, expected {expected}; skipping")]
    RaggedRow {
        record: usize,
        found: usize,
        expected: usize,
    },

    #[error("{0}")]
    Shape(String),
}

impl Warning {
    /// Whether a strict policy turns this warning into an error.
    pub fn escalates(&self) -> bool {
        !matches!(self, Warning::DefaultComparator { .. })
    }

    /// Map onto the error taxonomy: schema, configuration, range, query.
    pub fn into_error(self) -> Error {
        let msg = self.to_string();
        match self {
            Warning::UnknownField { .. } | Warning::RaggedRow { .. } | Warning::Shape(_) => {
                Error::Schema(msg)
            }
            Warning::UnknownComparator { .. } | Warning::DefaultComparator { .. } => {
                Error::Config(msg)
            }
            Warning::InvalidBounds { .. } => Error::Range(msg),
            Warning::UnknownOperator { .. } | Warning::MalformedQuery(_) => Error::Query(msg),
        }
    }
}

/// Collects warnings for one or more operations under a single policy.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    policy: Policy,
    warnings: Vec<Warning>,
}

impl Diagnostics {
    pub fn new(policy: Policy) -> Self {
        Self {
            policy,
            warnings: Vec::new(),
        }
    }

    pub fn lenient() -> Self {
        Self::new(Policy::Lenient)
    }

    pub fn strict() -> Self {
        Self::new(Policy::Strict)
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }

    /// Report a warning. Returns `Err` only under a strict policy.
    pub fn report(&mut self, warning: Warning) -> Result<()> {
        if self.policy == Policy::Strict && warning.escalates() {
            return Err(warning.into_error());
        }
        tracing::warn!(target: "csvq", "{}", warning);
        self.warnings.push(warning);
        Ok(())
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn take(&mut self) -> Vec<Warning> {
        std::mem::take(&mut self.warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lenient_collects() {
        let mut diag = Diagnostics::lenient();
        diag.report(Warning::UnknownField {
            field: "x".into(),
            context: "index".into(),
        })
        .unwrap();
        assert_eq!(diag.warnings().len(), 1);
        assert!(diag.warnings()[0].to_string().contains("'x'"));
    }

    #[test]
    fn test_strict_escalates_by_taxonomy() {
        let mut diag = Diagnostics::strict();
        let err = diag
            .report(Warning::InvalidBounds {
                low: 3,
                high: 1,
                rows: 4,
            })
            .unwrap_err();
        assert!(matches!(err, Error::Range(_)));

        let err = diag
            .report(Warning::UnknownOperator {
                field: "x".into(),
                operator: "like".into(),
            })
            .unwrap_err();
        assert!(matches!(err, Error::Query(_)));
        assert!(diag.is_empty());
    }

    #[test]
    fn test_default_comparator_never_escalates() {
        let mut diag = Diagnostics::strict();
        diag.report(Warning::DefaultComparator { field: "n".into() })
            .unwrap();
        assert_eq!(diag.warnings().len(), 1);
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!("Strict".parse::<Policy>().unwrap(), Policy::Strict);
        assert_eq!("lenient".parse::<Policy>().unwrap(), Policy::Lenient);
        assert!("loud".parse::<Policy>().is_err());
    }
}
