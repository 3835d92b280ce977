//! Per-handle record of executed statements.

use crate::sql::{starts_with_keyword, strip_sql_prefix};
use std::time::Duration;

/// The type of SQL operation being performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    /// SELECT query
    Select,
    /// INSERT statement
    Insert,
    /// UPDATE statement
    Update,
    /// DELETE statement
    Delete,
    /// Other SQL (e.g., DDL, transaction control)
    Other,
}

impl QueryType {
    /// Detect query type from SQL string.
    pub fn from_sql(sql: &str) -> Self {
        let trimmed = strip_sql_prefix(sql);
        if starts_with_keyword(trimmed, "SELECT") {
            QueryType::Select
        } else if starts_with_keyword(trimmed, "INSERT") {
            QueryType::Insert
        } else if starts_with_keyword(trimmed, "UPDATE") {
            QueryType::Update
        } else if starts_with_keyword(trimmed, "DELETE") {
            QueryType::Delete
        } else {
            QueryType::Other
        }
    }
}

/// One executed statement.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceEntry {
    /// SQL with placeholders replaced by quoted values.
    pub query: String,
    pub elapsed: Duration,
    /// `Database::<method>()`, followed by ` >> <label>` when one was set.
    pub caller: String,
    pub query_type: QueryType,
}

/// Trace settings plus the append-only entry list.
#[derive(Debug, Clone, Default)]
pub(crate) struct Tracer {
    enabled: bool,
    strip_prefix: String,
    entries: Vec<TraceEntry>,
}

impl Tracer {
    pub(crate) fn configure(&mut self, enabled: bool, strip_prefix: &str) {
        self.enabled = enabled;
        self.strip_prefix = strip_prefix.to_string();
    }

    pub(crate) fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub(crate) fn entries(&self) -> &[TraceEntry] {
        &self.entries
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn caller(&self, method: &str, label: Option<&str>) -> String {
        caller_description(method, label, &self.strip_prefix)
    }

    pub(crate) fn record(&mut self, entry: TraceEntry) {
        if self.enabled {
            self.entries.push(entry);
        }
    }
}

fn caller_description(method: &str, label: Option<&str>, strip_prefix: &str) -> String {
    match label {
        Some(label) => {
            let label = if strip_prefix.is_empty() {
                label.to_string()
            } else {
                label.replace(strip_prefix, "")
            };
            format!("Database::{method}() >> {label}")
        }
        None => format!("Database::{method}()"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_type_skips_comments() {
        assert_eq!(QueryType::from_sql("SELECT 1"), QueryType::Select);
        assert_eq!(
            QueryType::from_sql("/* report */ insert into t values (1)"),
            QueryType::Insert
        );
        assert_eq!(QueryType::from_sql("-- x\nUPDATE t SET a = 1"), QueryType::Update);
        assert_eq!(QueryType::from_sql("DELETE FROM t"), QueryType::Delete);
        assert_eq!(QueryType::from_sql("DROP TABLE t"), QueryType::Other);
        assert_eq!(QueryType::from_sql("SELECTED"), QueryType::Other);
    }

    #[test]
    fn caller_includes_label_without_strip_prefix() {
        assert_eq!(caller_description("get", None, ""), "Database::get()");
        assert_eq!(
            caller_description(
                "update",
                Some("file \"/srv/app/src/users.rs\" line #12"),
                "/srv/app/"
            ),
            "Database::update() >> file \"src/users.rs\" line #12"
        );
    }

    #[test]
    fn disabled_tracer_records_nothing() {
        let mut tracer = Tracer::default();
        let entry = TraceEntry {
            query: "SELECT 1".to_string(),
            elapsed: Duration::from_millis(1),
            caller: tracer.caller("query", None),
            query_type: QueryType::Select,
        };
        tracer.record(entry.clone());
        assert!(tracer.entries().is_empty());

        tracer.configure(true, "");
        tracer.record(entry.clone());
        assert_eq!(tracer.entries(), &[entry]);

        tracer.clear();
        assert!(tracer.entries().is_empty());
    }
}
