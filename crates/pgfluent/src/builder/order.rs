//! ORDER BY and GROUP BY fragments.

use crate::error::{OrmError, OrmResult};
use crate::sql::SqlBuf;
use regex::Regex;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn parse(s: &str) -> OrmResult<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ASC" => Ok(Direction::Asc),
            "DESC" => Ok(Direction::Desc),
            other => Err(OrmError::invalid_argument(format!(
                "Wrong order direction: {other}"
            ))),
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

fn order_field_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"[^-a-zA-Z0-9.(),_"]+"#).expect("invalid built-in order regex"))
}

fn group_field_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^-a-zA-Z0-9.(),_]+").expect("invalid built-in group regex"))
}

// `"table".` qualifier; the prefix is inserted after the opening quote.
fn quoted_table_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(")([a-zA-Z0-9_]*"\.)"#).expect("invalid built-in table qualifier regex")
    })
}

pub(crate) fn sanitize_order_field(field: &str) -> String {
    order_field_re().replace_all(field, "").into_owned()
}

pub(crate) fn sanitize_group_field(field: &str) -> String {
    group_field_re().replace_all(field, "").into_owned()
}

#[derive(Debug, Clone, PartialEq)]
struct OrderItem {
    field: String,
    // `None` for random ordering, which takes no direction.
    direction: Option<Direction>,
}

/// Insertion-ordered ORDER BY list keyed by the sanitized field text.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct OrderBy(Vec<OrderItem>);

impl OrderBy {
    pub(crate) fn set(&mut self, field: String, direction: Direction) {
        let direction = if field.replace(' ', "").eq_ignore_ascii_case("rand()")
            || field.eq_ignore_ascii_case("random()")
        {
            None
        } else {
            Some(direction)
        };
        match self.0.iter_mut().find(|item| item.field == field) {
            Some(item) => item.direction = direction,
            None => self.0.push(OrderItem { field, direction }),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn append_to(&self, prefix: &str, out: &mut SqlBuf) {
        if self.0.is_empty() {
            return;
        }
        let items: Vec<String> = self
            .0
            .iter()
            .map(|item| match item.direction {
                None => "random()".to_string(),
                Some(dir) => {
                    let field = if prefix.is_empty() {
                        item.field.clone()
                    } else {
                        quoted_table_re()
                            .replace_all(&item.field, format!("${{1}}{prefix}${{2}}"))
                            .into_owned()
                    };
                    format!("{field} {}", dir.as_sql())
                }
            })
            .collect();
        out.push(" ORDER BY ").push(&items.join(", "));
    }
}

/// Build the ordering expression for a custom value list.
pub(crate) fn value_list_field(field: &str, values: &[&str]) -> String {
    let list: Vec<String> = values
        .iter()
        .map(|v| format!("'{}'", sanitize_order_field(v).replace('"', "")))
        .collect();
    format!("array_position(ARRAY[{}]::text[], {field}::text)", list.join(", "))
}

pub(crate) fn append_group_by(fields: &[String], out: &mut SqlBuf) {
    if fields.is_empty() {
        return;
    }
    out.push(" GROUP BY ").push(&fields.join(", "));
}
