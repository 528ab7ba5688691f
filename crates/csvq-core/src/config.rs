//! Engine configuration that downstream crates can serialize/deserialize.

use serde::{Deserialize, Serialize};

use crate::compare::Comparator;
use crate::diagnostics::{Diagnostics, Policy};
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Strict propagates the first diagnostic as an error; lenient logs and degrades.
    pub policy: Policy,

    /// Field delimiter for CSV input and output.
    pub delimiter: char,

    /// Comparator name used when a query orders a field without naming one.
    pub default_comparison: String,

    /// Cap on rows rendered by the console grid. `None` prints everything.
    pub max_print_rows: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            policy: Policy::Lenient,
            delimiter: ',',
            default_comparison: "float".to_string(),
            max_print_rows: None,
        }
    }
}

impl EngineConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `CSVQ_POLICY`: `strict` or `lenient`
    /// - `CSVQ_DELIMITER`: single-character field delimiter (`\t` for tab)
    /// - `CSVQ_DEFAULT_COMPARISON`: comparator name, e.g. `integer`
    /// - `CSVQ_MAX_PRINT_ROWS`: row cap for console output
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("CSVQ_POLICY") {
            if let Ok(p) = s.parse::<Policy>() {
                cfg.policy = p;
            }
        }

        if let Ok(s) = std::env::var("CSVQ_DELIMITER") {
            if let Ok(d) = parse_delimiter(&s) {
                cfg.delimiter = d;
            }
        }

        if let Ok(s) = std::env::var("CSVQ_DEFAULT_COMPARISON") {
            if s.parse::<Comparator>().is_ok() {
                cfg.default_comparison = s;
            }
        }

        if let Ok(s) = std::env::var("CSVQ_MAX_PRINT_ROWS") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.max_print_rows = Some(v);
            }
        }

        cfg
    }

    /// Resolve `default_comparison`, checking it names a real comparator.
    pub fn default_comparator(&self) -> Result<Comparator> {
        self.default_comparison.parse()
    }

    /// Single-byte delimiter for the csv reader/writer.
    pub fn delimiter_byte(&self) -> Result<u8> {
        u8::try_from(self.delimiter)
            .map_err(|_| Error::Config(format!("delimiter '{}' is not ASCII", self.delimiter)))
    }

    /// Fresh diagnostics under this config's policy.
    pub fn diagnostics(&self) -> Diagnostics {
        Diagnostics::new(self.policy)
    }
}

/// Parse a delimiter argument. Accepts one character or the escapes `\t`
/// and `tab`.
pub fn parse_delimiter(s: &str) -> Result<char> {
    match s {
        "\\t" | "tab" => return Ok('\t'),
        _ => {}
    }
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() => Ok(c),
        _ => Err(Error::Config(format!(
            "delimiter must be a single ASCII character, got '{}'",
            s
        ))),
    }
}
