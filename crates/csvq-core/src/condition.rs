//! Condition trees: the typed form of a MongoDB-style query.
//!
//! ```text
//! { "n":     { "gt": 3, "comparison": "integer" },
//!   "title": "Director",
//!   "x":     { "or": [ { "eq": "a" }, { "eq": "b" } ] } }
//! ```
//!
//! A [`Query`] maps field names to a [`FieldFilter`]; a filter holds the
//! field's [`Condition`]s, an optional comparator and any operator tokens
//! that were not recognised (reported at query time, not at parse time).
//! A bare value under a field is shorthand for `{ "eq": value }`.
//!
//! Queries are immutable value objects. The engine never edits a caller's
//! query; it tracks consumed operators on the side.

use std::fmt;

use serde_json::{Map, Value};

use crate::compare::Comparator;
use crate::error::{Error, Result};

/// Reserved per-field key naming the field's comparator.
pub const COMPARISON_KEY: &str = "comparison";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Neq,
    Lt,
    Gt,
    Lte,
    Gte,
    In,
    Not,
    And,
    Or,
}

impl Operator {
    pub const ALL: [Operator; 10] = [
        Operator::Eq,
        Operator::Neq,
        Operator::Lt,
        Operator::Gt,
        Operator::Lte,
        Operator::Gte,
        Operator::In,
        Operator::Not,
        Operator::And,
        Operator::Or,
    ];

    pub fn token(&self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Neq => "neq",
            Operator::Lt => "lt",
            Operator::Gt => "gt",
            Operator::Lte => "lte",
            Operator::Gte => "gte",
            Operator::In => "in",
            Operator::Not => "not",
            Operator::And => "and",
            Operator::Or => "or",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|op| op.token() == token)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq(String),
    Neq(String),
    Lt(String),
    Gt(String),
    Lte(String),
    Gte(String),
    In(Vec<String>),
    Not(Box<Condition>),
    And(Vec<Condition>),
    Or(Vec<Condition>),
}

impl Condition {
    pub fn eq(v: impl Into<String>) -> Self {
        Condition::Eq(v.into())
    }
    pub fn neq(v: impl Into<String>) -> Self {
        Condition::Neq(v.into())
    }
    pub fn lt(v: impl Into<String>) -> Self {
        Condition::Lt(v.into())
    }
    pub fn gt(v: impl Into<String>) -> Self {
        Condition::Gt(v.into())
    }
    pub fn lte(v: impl Into<String>) -> Self {
        Condition::Lte(v.into())
    }
    pub fn gte(v: impl Into<String>) -> Self {
        Condition::Gte(v.into())
    }
    pub fn is_in<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Condition::In(values.into_iter().map(Into::into).collect())
    }
    pub fn not(inner: Condition) -> Self {
        Condition::Not(Box::new(inner))
    }

    pub fn operator(&self) -> Operator {
        match self {
            Condition::Eq(_) => Operator::Eq,
            Condition::Neq(_) => Operator::Neq,
            Condition::Lt(_) => Operator::Lt,
            Condition::Gt(_) => Operator::Gt,
            Condition::Lte(_) => Operator::Lte,
            Condition::Gte(_) => Operator::Gte,
            Condition::In(_) => Operator::In,
            Condition::Not(_) => Operator::Not,
            Condition::And(_) => Operator::And,
            Condition::Or(_) => Operator::Or,
        }
    }

    /// True when evaluating this condition needs an ordering.
    pub fn needs_comparator(&self) -> bool {
        match self {
            Condition::Lt(_) | Condition::Gt(_) | Condition::Lte(_) | Condition::Gte(_) => true,
            Condition::Eq(_) | Condition::Neq(_) | Condition::In(_) => false,
            Condition::Not(inner) => inner.needs_comparator(),
            Condition::And(items) | Condition::Or(items) => {
                items.iter().any(Condition::needs_comparator)
            }
        }
    }

    fn to_json(&self) -> Value {
        let value = match self {
            Condition::Eq(v)
            | Condition::Neq(v)
            | Condition::Lt(v)
            | Condition::Gt(v)
            | Condition::Lte(v)
            | Condition::Gte(v) => Value::String(v.clone()),
            Condition::In(vs) => Value::Array(vs.iter().cloned().map(Value::String).collect()),
            Condition::Not(inner) => inner.to_json(),
            Condition::And(items) | Condition::Or(items) => {
                Value::Array(items.iter().map(Condition::to_json).collect())
            }
        };
        let mut obj = Map::new();
        obj.insert(self.operator().token().to_string(), value);
        Value::Object(obj)
    }
}

/// Everything a query says about one field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldFilter {
    pub conditions: Vec<Condition>,
    pub comparison: Option<Comparator>,
    /// A `comparison` value that did not name a known comparator.
    pub invalid_comparison: Option<String>,
    /// Operator tokens that are not part of the language.
    pub unknown_operators: Vec<String>,
}

impl FieldFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn eq(self, v: impl Into<String>) -> Self {
        self.with(Condition::eq(v))
    }
    pub fn neq(self, v: impl Into<String>) -> Self {
        self.with(Condition::neq(v))
    }
    pub fn lt(self, v: impl Into<String>) -> Self {
        self.with(Condition::lt(v))
    }
    pub fn gt(self, v: impl Into<String>) -> Self {
        self.with(Condition::gt(v))
    }
    pub fn lte(self, v: impl Into<String>) -> Self {
        self.with(Condition::lte(v))
    }
    pub fn gte(self, v: impl Into<String>) -> Self {
        self.with(Condition::gte(v))
    }
    pub fn is_in<I, S>(self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with(Condition::is_in(values))
    }
    pub fn not(self, inner: Condition) -> Self {
        self.with(Condition::not(inner))
    }
    pub fn and(self, items: Vec<Condition>) -> Self {
        self.with(Condition::And(items))
    }
    pub fn or(self, items: Vec<Condition>) -> Self {
        self.with(Condition::Or(items))
    }

    pub fn comparison(mut self, comparator: Comparator) -> Self {
        self.comparison = Some(comparator);
        self
    }

    pub fn needs_comparator(&self) -> bool {
        self.conditions.iter().any(Condition::needs_comparator)
    }

    fn from_json(field: &str, obj: &Map<String, Value>) -> Result<Self> {
        let mut filter = FieldFilter::new();
        for (key, value) in obj {
            if key == COMPARISON_KEY {
                match value.as_str().map(str::parse::<Comparator>) {
                    Some(Ok(c)) => filter.comparison = Some(c),
                    Some(Err(_)) => filter.invalid_comparison = value.as_str().map(String::from),
                    None => filter.invalid_comparison = Some(value.to_string()),
                }
                continue;
            }
            match Operator::from_token(key) {
                Some(op) => filter.conditions.push(parse_condition(field, op, value)?),
                None => filter.unknown_operators.push(key.clone()),
            }
        }
        Ok(filter)
    }

    /// A repeated operator cannot share one mapping, so such a filter is
    /// written as a single `and` of its conditions.
    fn to_json(&self) -> Value {
        let mut obj = Map::new();
        let repeated = self.conditions.iter().enumerate().any(|(i, c)| {
            self.conditions[..i]
                .iter()
                .any(|prev| prev.operator() == c.operator())
        });
        if repeated {
            let items = self.conditions.iter().map(Condition::to_json).collect();
            obj.insert(Operator::And.token().to_string(), Value::Array(items));
        } else {
            for c in &self.conditions {
                if let Value::Object(entry) = c.to_json() {
                    obj.extend(entry);
                }
            }
        }
        if let Some(c) = &self.comparison {
            obj.insert(COMPARISON_KEY.to_string(), Value::String(c.name()));
        } else if let Some(name) = &self.invalid_comparison {
            obj.insert(COMPARISON_KEY.to_string(), Value::String(name.clone()));
        }
        Value::Object(obj)
    }
}

/// A full condition tree: field name → filter, in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    filters: Vec<(String, FieldFilter)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or extend) the filter for `field`.
    pub fn filter(mut self, field: impl Into<String>, filter: FieldFilter) -> Self {
        let field = field.into();
        match self.filters.iter_mut().find(|(f, _)| *f == field) {
            Some((_, existing)) => {
                existing.conditions.extend(filter.conditions);
                if filter.comparison.is_some() {
                    existing.comparison = filter.comparison;
                    existing.invalid_comparison = None;
                } else if filter.invalid_comparison.is_some() {
                    existing.invalid_comparison = filter.invalid_comparison;
                }
                existing.unknown_operators.extend(filter.unknown_operators);
            }
            None => self.filters.push((field, filter)),
        }
        self
    }

    /// Shorthand for `{field: value}`.
    pub fn eq(self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filter(field, FieldFilter::new().eq(value))
    }

    pub fn get(&self, field: &str) -> Option<&FieldFilter> {
        self.filters
            .iter()
            .find(|(f, _)| f == field)
            .map(|(_, filter)| filter)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldFilter)> {
        self.filters.iter().map(|(f, filter)| (f.as_str(), filter))
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Parse a JSON (or YAML-converted) condition tree.
    pub fn from_json(value: &Value) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| Error::Query("condition tree must be a mapping".into()))?;
        let mut query = Query::new();
        for (field, spec) in obj {
            let filter = match spec {
                Value::Object(ops) => FieldFilter::from_json(field, ops)?,
                bare => FieldFilter::new().eq(text_of(field, bare)?),
            };
            query.filters.push((field.clone(), filter));
        }
        Ok(query)
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(s)?;
        Self::from_json(&value)
    }

    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        for (field, filter) in &self.filters {
            obj.insert(field.clone(), filter.to_json());
        }
        Value::Object(obj)
    }
}

fn parse_condition(field: &str, op: Operator, value: &Value) -> Result<Condition> {
    Ok(match op {
        Operator::Eq => Condition::Eq(text_of(field, value)?),
        Operator::Neq => Condition::Neq(text_of(field, value)?),
        Operator::Lt => Condition::Lt(text_of(field, value)?),
        Operator::Gt => Condition::Gt(text_of(field, value)?),
        Operator::Lte => Condition::Lte(text_of(field, value)?),
        Operator::Gte => Condition::Gte(text_of(field, value)?),
        Operator::In => {
            let items = value.as_array().ok_or_else(|| {
                Error::Query(format!("'in' on field '{}' expects a sequence", field))
            })?;
            Condition::In(
                items
                    .iter()
                    .map(|v| text_of(field, v))
                    .collect::<Result<Vec<_>>>()?,
            )
        }
        Operator::Not => Condition::not(parse_nested(field, value)?),
        Operator::And | Operator::Or => {
            let items = value.as_array().ok_or_else(|| {
                Error::Query(format!("'{}' on field '{}' expects a sequence", op, field))
            })?;
            let nested = items
                .iter()
                .map(|v| parse_nested(field, v))
                .collect::<Result<Vec<_>>>()?;
            if op == Operator::And {
                Condition::And(nested)
            } else {
                Condition::Or(nested)
            }
        }
    })
}

/// A nested tree (`{op: value, ...}`) becomes one condition; several keys
/// are read as their conjunction.
fn parse_nested(field: &str, value: &Value) -> Result<Condition> {
    let obj = value.as_object().ok_or_else(|| {
        Error::Query(format!(
            "nested condition on field '{}' must be a mapping",
            field
        ))
    })?;
    let mut conditions = Vec::with_capacity(obj.len());
    for (key, v) in obj {
        let op = Operator::from_token(key).ok_or_else(|| {
            Error::Query(format!(
                "unknown operator '{}' in nested condition on field '{}'",
                key, field
            ))
        })?;
        conditions.push(parse_condition(field, op, v)?);
    }
    if conditions.len() == 1 {
        Ok(conditions.remove(0))
    } else {
        Ok(Condition::And(conditions))
    }
}

/// Text form of a scalar operand. Cells are text, so numbers and booleans
/// compare by their printed form.
fn text_of(field: &str, value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok(String::new()),
        Value::Array(_) | Value::Object(_) => Err(Error::Query(format!(
            "operand on field '{}' must be a scalar",
            field
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bare_value_is_eq() {
        let q = Query::from_json(&json!({"title": "Director"})).unwrap();
        assert_eq!(q.get("title").unwrap().conditions, vec![Condition::eq("Director")]);
    }

    #[test]
    fn test_numbers_become_text() {
        let q = Query::from_json(&json!({"n": {"gt": 3, "in": [1, 2.5, true]}})).unwrap();
        let f = q.get("n").unwrap();
        assert_eq!(f.conditions[0], Condition::gt("3"));
        assert_eq!(f.conditions[1], Condition::is_in(["1", "2.5", "true"]));
    }

    #[test]
    fn test_comparison_key() {
        let q = Query::from_json(&json!({
            "date": {"gte": "2020-03-01", "comparison": "date:%Y-%m-%d"},
            "n": {"lt": 5, "comparison": "roman"},
        }))
        .unwrap();
        let date = q.get("date").unwrap();
        assert_eq!(date.comparison, Some(Comparator::date("%Y-%m-%d")));
        assert_eq!(date.conditions.len(), 1);
        let n = q.get("n").unwrap();
        assert_eq!(n.comparison, None);
        assert_eq!(n.invalid_comparison.as_deref(), Some("roman"));
    }

    #[test]
    fn test_nested_boolean_operators() {
        let q = Query::from_json(&json!({
            "x": {
                "or": [{"eq": "a"}, {"eq": "b"}],
                "not": {"in": ["c"]},
                "and": [{"gte": 1, "lte": 9}]
            }
        }))
        .unwrap();
        let f = q.get("x").unwrap();
        assert_eq!(
            f.conditions,
            vec![
                Condition::Or(vec![Condition::eq("a"), Condition::eq("b")]),
                Condition::not(Condition::is_in(["c"])),
                Condition::And(vec![Condition::And(vec![
                    Condition::gte("1"),
                    Condition::lte("9")
                ])]),
            ]
        );
        assert!(f.needs_comparator());
    }

    #[test]
    fn test_unknown_operator_is_kept_for_reporting() {
        let q = Query::from_json(&json!({"x": {"like": "a%", "eq": "b"}})).unwrap();
        let f = q.get("x").unwrap();
        assert_eq!(f.unknown_operators, vec!["like".to_string()]);
        assert_eq!(f.conditions, vec![Condition::eq("b")]);
    }

    #[test]
    fn test_malformed_trees() {
        assert!(Query::from_json(&json!(["not", "a", "mapping"])).is_err());
        assert!(Query::from_json(&json!({"x": {"or": {"eq": "a"}}})).is_err());
        assert!(Query::from_json(&json!({"x": {"in": "abc"}})).is_err());
        assert!(Query::from_json(&json!({"x": {"not": {"like": "a"}}})).is_err());
        assert!(Query::from_json(&json!({"x": [1, 2]})).is_err());
    }

    #[test]
    fn test_repeated_operators_survive_rendering() {
        let q = Query::new().filter("n", FieldFilter::new().gt("1").gt("5").lt("9"));
        let rendered = q.to_json();
        assert_eq!(
            rendered,
            json!({"n": {"and": [{"gt": "1"}, {"gt": "5"}, {"lt": "9"}]}})
        );
        let back = Query::from_json(&rendered).unwrap();
        assert_eq!(
            back.get("n").unwrap().conditions,
            vec![Condition::And(vec![
                Condition::gt("1"),
                Condition::gt("5"),
                Condition::lt("9")
            ])]
        );
    }

    #[test]
    fn test_merge_keeps_unknown_comparison() {
        let bad = Query::from_json(&json!({"n": {"gt": 1, "comparison": "roman"}})).unwrap();
        let bad_filter = bad.get("n").unwrap().clone();
        let q = Query::new().filter("n", FieldFilter::new().lt("9")).filter("n", bad_filter);
        let merged = q.get("n").unwrap();
        assert_eq!(merged.invalid_comparison.as_deref(), Some("roman"));
        assert_eq!(q.to_json(), json!({"n": {"lt": "9", "gt": "1", "comparison": "roman"}}));
    }

    #[test]
    fn test_builder_matches_parser() {
        let built = Query::new()
            .filter(
                "n",
                FieldFilter::new().gt("3").comparison(Comparator::Integer),
            )
            .eq("title", "Director");
        let parsed = Query::from_json(&json!({
            "n": {"gt": "3", "comparison": "integer"},
            "title": "Director"
        }))
        .unwrap();
        assert_eq!(built, parsed);
        assert_eq!(Query::from_json(&built.to_json()).unwrap(), built);
    }

    #[test]
    fn test_filter_merges_same_field() {
        let q = Query::new()
            .filter("n", FieldFilter::new().gt("1"))
            .filter("n", FieldFilter::new().lt("9"));
        assert_eq!(q.len(), 1);
        assert_eq!(q.get("n").unwrap().conditions.len(), 2);
    }
}
