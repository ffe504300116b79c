//! Row and filter primitives.

use std::collections::BTreeMap;

use serde_json::Value as JsonValue;

/// A single record: an order-irrelevant mapping of column name to value.
pub type Row = BTreeMap<String, JsonValue>;

/// A conjunction of column-equality terms, the store-facing analogue of a
/// named-parameter `WHERE` clause.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    terms: Vec<(String, JsonValue)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality term. Terms combine with AND.
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.terms.push((column.into(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn terms(&self) -> &[(String, JsonValue)] {
        &self.terms
    }

    /// Whether a row satisfies every term. An empty filter matches all rows.
    pub fn matches(&self, row: &Row) -> bool {
        self.terms
            .iter()
            .all(|(column, value)| row.get(column) == Some(value))
    }
}

/// Read a column as `i64`, accepting JSON numbers only.
pub fn row_i64(row: &Row, column: &str) -> Option<i64> {
    row.get(column).and_then(JsonValue::as_i64)
}

/// Read a column as a string slice.
pub fn row_str<'a>(row: &'a Row, column: &str) -> Option<&'a str> {
    row.get(column).and_then(JsonValue::as_str)
}

/// Read a column as a boolean, accepting JSON booleans and 0/1 integers
/// (relational stores commonly model flags as tiny ints).
pub fn row_bool(row: &Row, column: &str) -> Option<bool> {
    match row.get(column)? {
        JsonValue::Bool(b) => Some(*b),
        JsonValue::Number(n) => n.as_i64().map(|v| v != 0),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_row() -> Row {
        let mut row = Row::new();
        row.insert("id".into(), json!(7));
        row.insert("name".into(), json!("article"));
        row.insert("is_admin".into(), json!(1));
        row
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(Filter::new().matches(&sample_row()));
    }

    #[test]
    fn terms_are_conjunctive() {
        let row = sample_row();
        assert!(Filter::new().eq("id", 7).eq("name", "article").matches(&row));
        assert!(!Filter::new().eq("id", 7).eq("name", "page").matches(&row));
        assert!(!Filter::new().eq("missing", 1).matches(&row));
    }

    #[test]
    fn bool_accepts_tiny_ints() {
        let row = sample_row();
        assert_eq!(row_bool(&row, "is_admin"), Some(true));
        assert_eq!(row_bool(&row, "name"), None);
    }
}
