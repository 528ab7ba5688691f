//! Comparators: strict "is-before" predicates over two text cells.
//!
//! A comparator supplies the total order used both to sort a column
//! (indexing) and to bisect it (range resolution). Callers are responsible
//! for picking one that is a strict weak order over the column's values;
//! the engine does not verify it.
//!
//! Built-ins parse the text on every comparison. Text that does not parse
//! (e.g. `"n/a"` in a numeric column) orders after every parsable value, and
//! unparsable values order lexically among themselves, so the built-ins stay
//! strict weak orders over arbitrary input.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::Error;

/// Caller-supplied ordering predicate.
pub type CompareFn = dyn Fn(&str, &str) -> bool + Send + Sync;

#[derive(Clone)]
pub enum Comparator {
    /// Whole numbers (`"-3"`, `" 42 "`).
    Integer,
    /// Floating point numbers. The default when nothing else is specified.
    Float,
    /// Byte-wise string order.
    Lexical,
    /// Dates/timestamps in the given `chrono` format, e.g. `"%Y-%m-%d"`.
    Date(String),
    Custom(Arc<CompareFn>),
}

impl Comparator {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&str, &str) -> bool + Send + Sync + 'static,
    {
        Comparator::Custom(Arc::new(f))
    }

    pub fn date(format: impl Into<String>) -> Self {
        Comparator::Date(format.into())
    }

    /// Returns true when `a` strictly sorts before `b`.
    pub fn is_before(&self, a: &str, b: &str) -> bool {
        match self {
            Comparator::Integer => {
                ordered_before(parse_integer(a), parse_integer(b), a, b)
            }
            Comparator::Float => ordered_before(parse_float(a), parse_float(b), a, b),
            Comparator::Lexical => a < b,
            Comparator::Date(format) => {
                ordered_before(parse_date(a, format), parse_date(b, format), a, b)
            }
            Comparator::Custom(f) => f(a, b),
        }
    }

    /// Stable name used in config files and condition trees.
    ///
    /// Custom comparators have no textual form and report `"custom"`.
    pub fn name(&self) -> String {
        match self {
            Comparator::Integer => "integer".to_string(),
            Comparator::Float => "float".to_string(),
            Comparator::Lexical => "string".to_string(),
            Comparator::Date(format) => format!("date:{}", format),
            Comparator::Custom(_) => "custom".to_string(),
        }
    }
}

impl Default for Comparator {
    fn default() -> Self {
        Comparator::Float
    }
}

impl fmt::Debug for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Comparator({})", self.name())
    }
}

impl PartialEq for Comparator {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparator::Integer, Comparator::Integer)
            | (Comparator::Float, Comparator::Float)
            | (Comparator::Lexical, Comparator::Lexical) => true,
            (Comparator::Date(a), Comparator::Date(b)) => a == b,
            (Comparator::Custom(a), Comparator::Custom(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl FromStr for Comparator {
    type Err = Error;

    /// Accepts `integer`, `float`, `string` (and a few aliases) or
    /// `date:<format>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some(format) = trimmed.strip_prefix("date:") {
            if format.is_empty() {
                return Err(Error::Config("date comparison needs a format".into()));
            }
            return Ok(Comparator::Date(format.to_string()));
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "integer" | "integers" | "int" => Ok(Comparator::Integer),
            "float" | "floats" | "number" | "numeric" => Ok(Comparator::Float),
            "string" | "strings" | "str" | "lexical" => Ok(Comparator::Lexical),
            "date" => Ok(Comparator::Date("%Y-%m-%d".to_string())),
            other => Err(Error::Config(format!("unknown comparison '{}'", other))),
        }
    }
}

fn ordered_before<T: PartialOrd>(a: Option<T>, b: Option<T>, raw_a: &str, raw_b: &str) -> bool {
    match (a, b) {
        (Some(x), Some(y)) => x < y,
        (Some(_), None) => true,
        (None, Some(_)) => false,
        (None, None) => raw_a < raw_b,
    }
}

fn parse_integer(s: &str) -> Option<i128> {
    s.trim().parse::<i128>().ok()
}

fn parse_float(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|f| !f.is_nan())
}

fn parse_date(s: &str, format: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, format).ok().or_else(|| {
        NaiveDate::parse_from_str(s, format)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_order() {
        let c = Comparator::Integer;
        assert!(c.is_before("3", "10"));
        assert!(!c.is_before("10", "3"));
        assert!(!c.is_before("5", "5"));
        assert!(c.is_before("-2", " 1 "));
    }

    #[test]
    fn test_lexical_differs_from_numeric() {
        assert!(Comparator::Lexical.is_before("10", "3"));
        assert!(!Comparator::Float.is_before("10", "3"));
    }

    #[test]
    fn test_float_order() {
        let c = Comparator::Float;
        assert!(c.is_before("2.5", "2.75"));
        assert!(c.is_before("-0.5", "0"));
    }

    #[test]
    fn test_unparsable_sorts_last() {
        let c = Comparator::Integer;
        assert!(c.is_before("99", "n/a"));
        assert!(!c.is_before("n/a", "99"));
        assert!(c.is_before("abc", "abd"));
        assert!(Comparator::Float.is_before("1", "nan"));
    }

    #[test]
    fn test_date_order() {
        let c = Comparator::date("%Y-%m-%d");
        assert!(c.is_before("2020-03-01", "2020-03-15"));
        assert!(c.is_before("2020-02-29", "2020-03-01"));
        assert!(!c.is_before("2020-03-15", "2020-03-01"));

        let c = Comparator::date("%d/%m/%Y %H:%M");
        assert!(c.is_before("01/03/2020 09:00", "01/03/2020 10:30"));
    }

    #[test]
    fn test_custom() {
        let by_len = Comparator::custom(|a, b| a.len() < b.len());
        assert!(by_len.is_before("z", "aa"));
        assert_eq!(by_len.name(), "custom");
        assert_eq!(by_len, by_len.clone());
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("integer".parse::<Comparator>().unwrap(), Comparator::Integer);
        assert_eq!("Floats".parse::<Comparator>().unwrap(), Comparator::Float);
        assert_eq!("string".parse::<Comparator>().unwrap(), Comparator::Lexical);
        assert_eq!(
            "date:%Y-%m-%d".parse::<Comparator>().unwrap(),
            Comparator::date("%Y-%m-%d")
        );
        assert!("bogus".parse::<Comparator>().is_err());
        assert!("date:".parse::<Comparator>().is_err());
    }

    #[test]
    fn test_name_round_trips() {
        for c in [
            Comparator::Integer,
            Comparator::Float,
            Comparator::Lexical,
            Comparator::date("%Y"),
        ] {
            assert_eq!(c.name().parse::<Comparator>().unwrap(), c);
        }
    }
}
