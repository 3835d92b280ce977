//! Result rows as ordered column name → [`Value`] maps.

use crate::error::OrmResult;
use crate::value::{Value, decode_column};
use serde::ser::{Serialize, SerializeMap, Serializer};
use tokio_postgres::Row;

/// One result row: column names in select-list order with their decoded values.
///
/// A repeated column name keeps its first position and the last value, like
/// an associative fetch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultRow {
    columns: Vec<(String, Value)>,
}

impl ResultRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode every column of a `tokio_postgres` row.
    pub fn from_row(row: &Row) -> OrmResult<Self> {
        let mut out = ResultRow::new();
        for (idx, column) in row.columns().iter().enumerate() {
            out.insert(column.name(), decode_column(row, idx)?);
        }
        Ok(out)
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        let column = column.into();
        let value = value.into();
        match self.columns.iter_mut().find(|(c, _)| *c == column) {
            Some(entry) => entry.1 = value,
            None => self.columns.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v)
    }

    /// Value at a select-list position.
    pub fn get_index(&self, idx: usize) -> Option<&Value> {
        self.columns.get(idx).map(|(_, v)| v)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(c, _)| c.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(c, v)| (c.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub(crate) fn take(mut self, column: &str) -> Option<Value> {
        let idx = self.columns.iter().position(|(c, _)| c == column)?;
        Some(self.columns.swap_remove(idx).1)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for ResultRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = ResultRow::new();
        for (k, v) in iter {
            row.insert(k, v);
        }
        row
    }
}

impl IntoIterator for ResultRow {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.into_iter()
    }
}

impl Serialize for ResultRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (column, value) in &self.columns {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_select_list_order() {
        let row: ResultRow = [("login", Value::from("user1")), ("id", Value::from(3))]
            .into_iter()
            .collect();
        assert_eq!(row.columns().collect::<Vec<_>>(), vec!["login", "id"]);
        assert_eq!(row.get("id"), Some(&Value::Int(3)));
        assert_eq!(row.get_index(0), Some(&Value::from("user1")));
        assert_eq!(row.get("missing"), None);
    }

    #[test]
    fn repeated_column_keeps_last_value() {
        let mut row = ResultRow::new();
        row.insert("id", 1);
        row.insert("login", "a");
        row.insert("id", 2);
        assert_eq!(row.len(), 2);
        assert_eq!(row.get_index(0), Some(&Value::Int(2)));
    }

    #[test]
    fn serializes_as_json_object() {
        let row: ResultRow = [
            ("id", Value::Int(1)),
            ("active", Value::Bool(true)),
            ("note", Value::Null),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            serde_json::to_string(&row).unwrap(),
            r#"{"id":1,"active":true,"note":null}"#
        );
    }

    #[test]
    fn take_moves_value_out() {
        let row: ResultRow = [("retval", Value::from("x"))].into_iter().collect();
        assert_eq!(row.take("retval"), Some(Value::from("x")));
    }
}
