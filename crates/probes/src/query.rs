use std::collections::BTreeSet;
use std::collections::btree_set;

use serde_json::Value;

use crate::error::ConfigError;

/// Unique set of parameterized queries a database probe runs every cycle.
///
/// Each query takes the previous watermark as its single bound parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuerySet {
    queries: BTreeSet<String>,
}

impl QuerySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a JSON array of objects, pooling every object value into the set.
    ///
    /// ```ignore
    /// let set = QuerySet::from_json(r#"[{"a": "SELECT 1 WHERE ? IS NOT NULL"}]"#)?;
    /// ```
    pub fn from_json(encoded: &str) -> Result<Self, ConfigError> {
        let value: Value = serde_json::from_str(encoded)?;
        let Value::Array(entries) = value else {
            return Err(ConfigError::QueryShape(json_kind(&value)));
        };

        let mut set = Self::new();
        for entry in entries {
            let Value::Object(fields) = entry else {
                return Err(ConfigError::QueryShape(json_kind(&entry)));
            };
            for (key, query) in fields {
                match query {
                    Value::String(query) => {
                        set.insert(query);
                    }
                    _ => return Err(ConfigError::QueryValue { key }),
                }
            }
        }

        Ok(set)
    }

    /// Returns `false` if the query was already present
    pub fn insert(&mut self, query: impl Into<String>) -> bool {
        self.queries.insert(query.into())
    }

    /// Returns `false` if the query was not present
    pub fn remove(&mut self, query: &str) -> bool {
        self.queries.remove(query)
    }

    pub fn contains(&self, query: &str) -> bool {
        self.queries.contains(query)
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    pub fn iter(&self) -> btree_set::Iter<'_, String> {
        self.queries.iter()
    }
}

impl<S: Into<String>> FromIterator<S> for QuerySet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self { queries: iter.into_iter().map(Into::into).collect() }
    }
}

impl<'a> IntoIterator for &'a QuerySet {
    type Item = &'a String;
    type IntoIter = btree_set::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.queries.iter()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_remove() {
        let mut set = QuerySet::new();
        assert!(set.insert("SELECT 1"));
        assert!(!set.insert("SELECT 1"));
        assert_eq!(set.len(), 1);
        assert!(set.remove("SELECT 1"));
        assert!(!set.remove("SELECT 1"));
        assert!(set.is_empty());
    }

    #[test]
    fn test_from_iterator_collapses_duplicates() {
        let set: QuerySet = ["b", "a", "b"].into_iter().collect();
        let queries: Vec<&String> = set.iter().collect();
        assert_eq!(queries, ["a", "b"]);
    }

    #[test]
    fn test_nested_array_is_rejected() {
        let err = QuerySet::from_json(r#"[["SELECT 1"]]"#).unwrap_err();
        assert!(matches!(err, ConfigError::QueryShape("an array")));
    }
}
