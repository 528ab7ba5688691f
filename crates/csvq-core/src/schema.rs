//! Logical schema: an ordered list of uniquely named text fields.
//!
//! Every cell is text, so a field carries nothing but its name. Field order
//! matters for display and for positional row alignment, not for semantics.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
}

impl Field {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub fields: Vec<Field>,
}

impl Schema {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Build a schema from field names, rejecting duplicates.
    pub fn from_names<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut fields: Vec<Field> = Vec::new();
        for name in names {
            let name = name.into();
            if fields.iter().any(|f| f.name == name) {
                return Err(Error::Schema(format!("duplicate field '{}'", name)));
            }
            fields.push(Field::new(name));
        }
        Ok(Self { fields })
    }

    pub fn field(&self, idx: usize) -> Option<&Field> {
        self.fields.get(idx)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_of() {
        let schema = Schema::from_names(["name", "title"]).unwrap();
        assert_eq!(schema.index_of("title"), Some(1));
        assert_eq!(schema.index_of("missing"), None);
        assert_eq!(schema.names().collect::<Vec<_>>(), vec!["name", "title"]);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let err = Schema::from_names(["a", "b", "a"]).unwrap_err();
        assert!(matches!(err, Error::Schema(_)));
    }
}
