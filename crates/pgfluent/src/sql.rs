//! SQL fragment buffer.
//!
//! `SqlBuf` stores SQL pieces and bind values separately and numbers the
//! `$1, $2, ...` placeholders only when the final string is rendered, so
//! fragments (sub-queries, raw conditions, function markers) can be spliced
//! together without tracking indices by hand.

use crate::error::{OrmError, OrmResult};
use crate::params::BindParams;
use crate::value::Value;

#[derive(Debug, Clone, PartialEq)]
enum SqlPart {
    Raw(String),
    Param,
}

/// A parameter-safe SQL buffer.
#[derive(Debug, Clone, Default, PartialEq)]
#[must_use]
pub struct SqlBuf {
    parts: Vec<SqlPart>,
    params: BindParams,
}

impl SqlBuf {
    pub fn new(initial_sql: impl Into<String>) -> Self {
        let mut buf = Self::default();
        buf.push(&initial_sql.into());
        buf
    }

    /// Append raw SQL (no parameters).
    pub fn push(&mut self, sql: &str) -> &mut Self {
        if sql.is_empty() {
            return self;
        }
        match self.parts.last_mut() {
            Some(SqlPart::Raw(last)) => last.push_str(sql),
            _ => self.parts.push(SqlPart::Raw(sql.to_string())),
        }
        self
    }

    /// Append a placeholder and bind its value.
    pub fn push_bind(&mut self, value: impl Into<Value>) -> &mut Self {
        self.parts.push(SqlPart::Param);
        self.params.push(value);
        self
    }

    /// Append a comma-separated placeholder list; an empty list appends `NULL`.
    pub fn push_bind_list<V: Into<Value>>(
        &mut self,
        values: impl IntoIterator<Item = V>,
    ) -> &mut Self {
        let mut iter = values.into_iter();
        let Some(first) = iter.next() else {
            return self.push("NULL");
        };
        self.push_bind(first);
        for v in iter {
            self.push(", ");
            self.push_bind(v);
        }
        self
    }

    /// Append another buffer, consuming it. Its placeholders are renumbered.
    pub fn push_sql(&mut self, other: SqlBuf) -> &mut Self {
        for part in other.parts {
            match part {
                SqlPart::Raw(s) => {
                    self.push(&s);
                }
                SqlPart::Param => self.parts.push(SqlPart::Param),
            }
        }
        self.params.push_all(other.params);
        self
    }

    /// Append SQL written with `?` placeholders, binding `params` in order.
    ///
    /// `?` inside single-quoted literals is left alone. The number of
    /// placeholders must match the number of params.
    pub fn push_template(&mut self, sql: &str, params: BindParams) -> OrmResult<&mut Self> {
        let pieces = split_placeholders(sql);
        let placeholders = pieces.len() - 1;
        if placeholders != params.len() {
            return Err(OrmError::validation(format!(
                "'{sql}': placeholders({placeholders}) != params({})",
                params.len()
            )));
        }
        let mut values = params.into_values().into_iter();
        for (i, piece) in pieces.into_iter().enumerate() {
            if i > 0 {
                if let Some(v) = values.next() {
                    self.push_bind(v);
                }
            }
            self.push(piece);
        }
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn params(&self) -> &BindParams {
        &self.params
    }

    pub fn into_params(self) -> BindParams {
        self.params
    }

    /// Render with `$1, $2, ...` placeholders.
    pub fn to_sql(&self) -> String {
        let mut out = String::new();
        let mut idx = 0usize;
        for part in &self.parts {
            match part {
                SqlPart::Raw(s) => out.push_str(s),
                SqlPart::Param => {
                    idx += 1;
                    out.push('$');
                    out.push_str(&idx.to_string());
                }
            }
        }
        out
    }

    /// Render with every placeholder replaced by its quoted value.
    ///
    /// For logs and the trace only; never sent to the server.
    pub fn to_display_sql(&self) -> String {
        let mut out = String::new();
        let mut values = self.params.values().iter();
        for part in &self.parts {
            match part {
                SqlPart::Raw(s) => out.push_str(s),
                SqlPart::Param => match values.next() {
                    Some(v) => out.push_str(&v.display_literal()),
                    None => out.push('?'),
                },
            }
        }
        out
    }

    /// Check the placeholder count against the bound values.
    pub fn validate(&self) -> OrmResult<()> {
        let placeholder_count = self
            .parts
            .iter()
            .filter(|p| matches!(p, SqlPart::Param))
            .count();
        if placeholder_count != self.params.len() {
            let params_len = self.params.len();
            return Err(OrmError::validation(format!(
                "SqlBuf: placeholders({placeholder_count}) != params({params_len})"
            )));
        }
        self.params.validate()
    }
}

/// Split `sql` on `?` outside single-quoted literals.
fn split_placeholders(sql: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut in_quote = false;
    for (i, ch) in sql.char_indices() {
        match ch {
            '\'' => in_quote = !in_quote,
            '?' if !in_quote => {
                pieces.push(&sql[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    pieces.push(&sql[start..]);
    pieces
}

/// Strip leading whitespace, SQL comments (`--` and `/* */`), and parentheses
/// from a SQL string to find the first meaningful keyword.
pub(crate) fn strip_sql_prefix(sql: &str) -> &str {
    let mut s = sql;
    loop {
        let before = s;
        s = s.trim_start();
        if s.starts_with("--") {
            if let Some(pos) = s.find('\n') {
                s = &s[pos + 1..];
                continue;
            }
            return "";
        }
        if s.starts_with("/*") {
            if let Some(pos) = s.find("*/") {
                s = &s[pos + 2..];
                continue;
            }
            return "";
        }
        if let Some(rest) = s.strip_prefix('(') {
            s = rest;
            continue;
        }
        if s == before {
            break;
        }
    }
    s
}

pub(crate) fn starts_with_keyword(s: &str, keyword: &str) -> bool {
    match s.get(0..keyword.len()) {
        Some(prefix) if prefix.eq_ignore_ascii_case(keyword) => !s[keyword.len()..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_'),
        _ => false,
    }
}
