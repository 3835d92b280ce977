//! Insert/update values and the modifier markers (increment, function call,
//! boolean negation, time intervals).

use super::subquery::SubQuery;
use crate::error::{OrmError, OrmResult};
use crate::ident;
use crate::params::BindParams;
use crate::sql::SqlBuf;
use crate::value::Value;
use regex::Regex;
use std::sync::OnceLock;

/// Value of one column in insert/update data.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Bound as a parameter.
    Value(Value),
    /// Rendered in parentheses.
    SubQuery(Box<SubQuery>),
    /// `col + n` on update; the signed literal on insert.
    Increment(i64),
    /// SQL expression with its own `?` placeholders.
    Func { expr: String, params: BindParams },
    /// `NOT col`, or `NOT <literal>` when given.
    Not(Option<String>),
}

/// Increment a column by `n`.
pub fn inc(n: i64) -> FieldValue {
    FieldValue::Increment(n)
}

/// Decrement a column by `n`.
pub fn dec(n: i64) -> FieldValue {
    FieldValue::Increment(n.saturating_neg())
}

/// SQL expression with `?` placeholders bound to `params`.
pub fn func(expr: impl Into<String>, params: &[Value]) -> FieldValue {
    FieldValue::Func {
        expr: expr.into(),
        params: params.iter().cloned().collect(),
    }
}

/// Boolean negation of the column itself (`None`) or of `col`.
pub fn not(col: Option<&str>) -> FieldValue {
    FieldValue::Not(col.map(str::to_string))
}

/// `NOW()` shifted by `diff`, see [`interval`].
pub fn now(diff: Option<&str>) -> OrmResult<FieldValue> {
    Ok(FieldValue::Func {
        expr: interval(diff, "NOW()")?,
        params: BindParams::new(),
    })
}

fn interval_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"([+-]?) ?(\d+) ?([a-zA-Z]?)").expect("invalid built-in interval regex")
    })
}

/// Shift `base` by `diff`, e.g. `interval(Some("-1h"), "NOW()")` gives
/// `NOW() - INTERVAL '1 hour'`.
///
/// `diff` is `[+|-]<n>[unit]` with units `s` second, `m` minute, `h` hour,
/// `d` day (default), `M` month and `Y` year. `None` or text without a number
/// returns `base` unchanged.
pub fn interval(diff: Option<&str>, base: &str) -> OrmResult<String> {
    let Some(diff) = diff.filter(|d| !d.is_empty()) else {
        return Ok(base.to_string());
    };
    let Some(caps) = interval_re().captures(diff) else {
        return Ok(base.to_string());
    };

    let sign = caps.get(1).map(|m| m.as_str()).filter(|s| !s.is_empty()).unwrap_or("+");
    let amount = caps.get(2).map_or("", |m| m.as_str());
    let unit = match caps.get(3).map(|m| m.as_str()).filter(|s| !s.is_empty()).unwrap_or("d") {
        "s" => "second",
        "m" => "minute",
        "h" => "hour",
        "d" => "day",
        "M" => "month",
        "Y" => "year",
        _ => {
            return Err(OrmError::invalid_argument(format!(
                "invalid interval type in '{diff}'"
            )));
        }
    };
    Ok(format!("{base} {sign} INTERVAL '{amount} {unit}'"))
}

macro_rules! impl_field_value_from_scalar {
    ($($t:ty),* $(,)?) => {
        $(
            impl From<$t> for FieldValue {
                fn from(v: $t) -> Self {
                    FieldValue::Value(Value::from(v))
                }
            }
        )*
    };
}

impl_field_value_from_scalar!(
    i8,
    i16,
    i32,
    i64,
    u8,
    u16,
    u32,
    bool,
    f32,
    f64,
    &str,
    String,
    &String,
    chrono::NaiveDateTime,
    chrono::NaiveDate,
    chrono::DateTime<chrono::Utc>,
    uuid::Uuid,
);

impl From<Value> for FieldValue {
    fn from(v: Value) -> Self {
        FieldValue::Value(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        FieldValue::Value(Value::from(v))
    }
}

impl From<SubQuery> for FieldValue {
    fn from(q: SubQuery) -> Self {
        FieldValue::SubQuery(Box::new(q))
    }
}

impl FieldValue {
    /// Parse a JSON value: scalars are values, `{"[I]": "+1"}` increments,
    /// `{"[F]": [expr, [params]]}` is a function and `{"[N]": col}` negates.
    pub fn from_json(v: serde_json::Value) -> OrmResult<Self> {
        let serde_json::Value::Object(map) = v else {
            return Ok(FieldValue::Value(Value::try_from(v)?));
        };
        let mut entries = map.into_iter();
        let (key, inner) = match (entries.next(), entries.next()) {
            (Some(entry), None) => entry,
            _ => {
                return Err(OrmError::unsupported_type(
                    "a marker object must have exactly one key",
                ));
            }
        };

        match key.as_str() {
            "[I]" => parse_increment(&inner).map(FieldValue::Increment),
            "[F]" => parse_func(inner),
            "[N]" => match inner {
                serde_json::Value::Null => Ok(FieldValue::Not(None)),
                serde_json::Value::String(s) if s.is_empty() => Ok(FieldValue::Not(None)),
                serde_json::Value::String(s) => Ok(FieldValue::Not(Some(s))),
                other => Err(OrmError::unsupported_type(format!(
                    "[N] expects a column name or null, got {other}"
                ))),
            },
            other => Err(OrmError::invalid_argument(format!(
                "Wrong operation: {other}"
            ))),
        }
    }
}

fn parse_increment(v: &serde_json::Value) -> OrmResult<i64> {
    match v {
        serde_json::Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| OrmError::unsupported_type(format!("[I] expects an integer, got {n}"))),
        serde_json::Value::String(s) => {
            let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
            compact
                .parse::<i64>()
                .map_err(|_| OrmError::invalid_argument(format!("invalid increment '{s}'")))
        }
        other => Err(OrmError::unsupported_type(format!(
            "[I] expects an integer, got {other}"
        ))),
    }
}

fn parse_func(v: serde_json::Value) -> OrmResult<FieldValue> {
    let (expr, params) = match v {
        serde_json::Value::String(expr) => (expr, None),
        serde_json::Value::Array(items) => {
            let mut items = items.into_iter();
            match items.next() {
                Some(serde_json::Value::String(expr)) => (expr, items.next()),
                _ => {
                    return Err(OrmError::unsupported_type(
                        "[F] expects [expression, [params]]",
                    ));
                }
            }
        }
        other => {
            return Err(OrmError::unsupported_type(format!(
                "[F] expects [expression, [params]], got {other}"
            )));
        }
    };

    let mut bind = BindParams::new();
    match params {
        None | Some(serde_json::Value::Null) => {}
        Some(serde_json::Value::Array(values)) => {
            for value in values {
                bind.push(Value::try_from(value)?);
            }
        }
        Some(other) => {
            return Err(OrmError::unsupported_type(format!(
                "[F] params must be an array, got {other}"
            )));
        }
    }
    Ok(FieldValue::Func { expr, params: bind })
}

/// Ordered column data of an insert or update.
///
/// ```ignore
/// let data = TableData::new()
///     .set("login", "user1")
///     .set("login_count", inc(1))
///     .set("created_at", now(None)?);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableData(Vec<(String, FieldValue)>);

impl TableData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `column`; setting it again replaces the earlier value in place.
    pub fn set(mut self, column: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<FieldValue>) {
        let column = column.into();
        let value = value.into();
        match self.0.iter_mut().find(|(c, _)| *c == column) {
            Some(entry) => entry.1 = value,
            None => self.0.push((column, value)),
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.0.iter().map(|(c, v)| (c.as_str(), v))
    }

    /// Build from a JSON object, parsing each member with [`FieldValue::from_json`].
    pub fn from_json(v: serde_json::Value) -> OrmResult<Self> {
        let serde_json::Value::Object(map) = v else {
            return Err(OrmError::unsupported_type("table data must be a JSON object"));
        };
        let mut data = TableData::new();
        for (column, value) in map {
            data.insert(column, FieldValue::from_json(value)?);
        }
        Ok(data)
    }

    fn ensure_not_empty(&self) -> OrmResult<()> {
        if self.0.is_empty() {
            return Err(OrmError::validation("insert/update data cannot be empty"));
        }
        Ok(())
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for TableData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut data = TableData::new();
        for (k, v) in iter {
            data.insert(k, v);
        }
        data
    }
}

/// Append ` SET col = ..., ...`.
pub(crate) fn append_update_set(data: &TableData, prefix: &str, out: &mut SqlBuf) -> OrmResult<()> {
    data.ensure_not_empty()?;
    out.push(" SET ");
    for (i, (column, value)) in data.0.iter().enumerate() {
        if i > 0 {
            out.push(", ");
        }
        let column = ident::column(column)?;
        out.push(&column).push(" = ");
        match value {
            FieldValue::Increment(n) if *n < 0 => {
                out.push(&format!("{column} - {}", n.unsigned_abs()));
            }
            FieldValue::Increment(n) => {
                out.push(&format!("{column} + {n}"));
            }
            FieldValue::Not(None) => {
                out.push(&format!("NOT {column}"));
            }
            other => append_expression(other, prefix, out)?,
        }
    }
    Ok(())
}

/// Append ` (cols) VALUES (...)`.
pub(crate) fn append_insert_values(data: &TableData, prefix: &str, out: &mut SqlBuf) -> OrmResult<()> {
    data.ensure_not_empty()?;
    let columns = data
        .0
        .iter()
        .map(|(c, _)| ident::column(c))
        .collect::<OrmResult<Vec<_>>>()?;
    out.push(" (").push(&columns.join(", ")).push(") VALUES (");
    for (i, (column, value)) in data.0.iter().enumerate() {
        if i > 0 {
            out.push(", ");
        }
        match value {
            // A new row has no prior value to add to.
            FieldValue::Increment(n) => {
                out.push(&n.to_string());
            }
            FieldValue::Not(None) => {
                return Err(OrmError::validation(format!(
                    "not() on '{column}' needs a literal in an INSERT"
                )));
            }
            other => append_expression(other, prefix, out)?,
        }
    }
    out.push(")");
    Ok(())
}

fn append_expression(value: &FieldValue, prefix: &str, out: &mut SqlBuf) -> OrmResult<()> {
    match value {
        FieldValue::Value(v) => {
            out.push_bind(v.clone());
        }
        FieldValue::SubQuery(q) => {
            out.push("(");
            out.push_sql(q.build(prefix)?);
            out.push(")");
        }
        FieldValue::Func { expr, params } => {
            out.push_template(expr, params.clone())?;
        }
        FieldValue::Not(Some(literal)) => {
            out.push("NOT ").push(literal);
        }
        FieldValue::Increment(_) | FieldValue::Not(None) => {}
    }
    Ok(())
}
