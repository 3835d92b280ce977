//! WHERE conditions and their rendering.

use super::operator::Operator;
use super::subquery::SubQuery;
use crate::error::{OrmError, OrmResult};
use crate::params::BindParams;
use crate::sql::SqlBuf;
use crate::value::Value;

/// Right-hand side of a WHERE condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Value(Value),
    List(Vec<Value>),
    SubQuery(Box<SubQuery>),
    /// An operand carrying its own operator, see [`op`].
    Keyed(Operator, Box<Operand>),
}

/// Attach an operator to an operand; it overrides the operator of the
/// `where` call it is passed to.
///
/// ```ignore
/// db.and_where("age", op(Operator::Gte, 18));
/// ```
pub fn op(operator: Operator, operand: impl Into<Operand>) -> Operand {
    Operand::Keyed(operator, Box::new(operand.into()))
}

macro_rules! impl_operand_from_scalar {
    ($($t:ty),* $(,)?) => {
        $(
            impl From<$t> for Operand {
                fn from(v: $t) -> Self {
                    Operand::Value(Value::from(v))
                }
            }
        )*
    };
}

impl_operand_from_scalar!(
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

impl From<Value> for Operand {
    fn from(v: Value) -> Self {
        Operand::Value(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Operand {
    fn from(v: Option<T>) -> Self {
        Operand::Value(Value::from(v))
    }
}

impl<T: Into<Value>> From<Vec<T>> for Operand {
    fn from(v: Vec<T>) -> Self {
        Operand::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Operand {
    fn from(v: [T; N]) -> Self {
        Operand::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value> + Clone> From<&[T]> for Operand {
    fn from(v: &[T]) -> Self {
        Operand::List(v.iter().cloned().map(Into::into).collect())
    }
}

impl From<SubQuery> for Operand {
    fn from(q: SubQuery) -> Self {
        Operand::SubQuery(Box::new(q))
    }
}

impl TryFrom<serde_json::Value> for Operand {
    type Error = OrmError;

    /// Scalars become values, arrays become lists and a single-key object
    /// `{"<op>": value}` becomes a keyed operand.
    fn try_from(v: serde_json::Value) -> OrmResult<Self> {
        match v {
            serde_json::Value::Array(items) => Ok(Operand::List(
                items
                    .into_iter()
                    .map(Value::try_from)
                    .collect::<OrmResult<_>>()?,
            )),
            serde_json::Value::Object(map) => {
                let mut entries = map.into_iter();
                match (entries.next(), entries.next()) {
                    (Some((key, inner)), None) => Ok(op(
                        Operator::parse(&key)?,
                        Operand::try_from(inner)?,
                    )),
                    _ => Err(OrmError::unsupported_type(
                        "a condition object must have exactly one operator key",
                    )),
                }
            }
            scalar => Ok(Operand::Value(Value::try_from(scalar)?)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Connector {
    And,
    Or,
}

impl Connector {
    fn as_sql(self) -> &'static str {
        match self {
            Connector::And => " AND ",
            Connector::Or => " OR ",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Condition {
    Value {
        connector: Connector,
        field: String,
        operator: Operator,
        operand: Operand,
    },
    Raw {
        connector: Connector,
        sql: String,
        params: BindParams,
    },
}

impl Condition {
    fn connector(&self) -> Connector {
        match self {
            Condition::Value { connector, .. } | Condition::Raw { connector, .. } => *connector,
        }
    }
}

/// Append ` WHERE ...` for `conditions`; nothing when empty.
pub(crate) fn append_where(conditions: &[Condition], prefix: &str, out: &mut SqlBuf) -> OrmResult<()> {
    if conditions.is_empty() {
        return Ok(());
    }
    out.push(" WHERE ");
    for (i, cond) in conditions.iter().enumerate() {
        if i > 0 {
            out.push(cond.connector().as_sql());
        }
        match cond {
            Condition::Raw { sql, params, .. } => {
                out.push_template(sql, params.clone())?;
            }
            Condition::Value {
                field,
                operator,
                operand,
                ..
            } => {
                let (operator, operand) = match operand {
                    Operand::Keyed(op, inner) => (*op, inner.as_ref()),
                    other => (*operator, other),
                };
                append_comparison(field.trim(), operator, operand, prefix, out)?;
            }
        }
    }
    Ok(())
}

fn append_comparison(
    field: &str,
    operator: Operator,
    operand: &Operand,
    prefix: &str,
    out: &mut SqlBuf,
) -> OrmResult<()> {
    if let Operand::Keyed(..) = operand {
        return Err(OrmError::unsupported_type(format!(
            "nested operator on '{field}'"
        )));
    }

    match operator {
        Operator::In | Operator::NotIn => {
            out.push(field).push(" ").push(operator.as_sql()).push(" (");
            match operand {
                Operand::List(values) => {
                    out.push_bind_list(values.iter().cloned());
                }
                Operand::Value(v) => {
                    out.push_bind(v.clone());
                }
                Operand::SubQuery(q) => {
                    out.push_sql(q.build(prefix)?);
                }
                Operand::Keyed(..) => {}
            }
            out.push(")");
        }
        Operator::Between | Operator::NotBetween => match operand {
            Operand::List(values) if values.len() == 2 => {
                out.push(field)
                    .push(" ")
                    .push(operator.as_sql())
                    .push(" ")
                    .push_bind(values[0].clone())
                    .push(" AND ")
                    .push_bind(values[1].clone());
            }
            Operand::List(values) => {
                return Err(OrmError::validation(format!(
                    "{operator} on '{field}' needs exactly 2 values, got {}",
                    values.len()
                )));
            }
            _ => {
                return Err(OrmError::validation(format!(
                    "{operator} on '{field}' needs a list of 2 values"
                )));
            }
        },
        Operator::Exists | Operator::NotExists => {
            let Operand::SubQuery(q) = operand else {
                return Err(OrmError::unsupported_type(format!(
                    "{operator} needs a sub-query operand"
                )));
            };
            if !field.is_empty() {
                out.push(field).push(" ");
            }
            out.push(operator.as_sql()).push(" (");
            out.push_sql(q.build(prefix)?);
            out.push(")");
        }
        Operator::Is | Operator::IsNot => {
            out.push(field).push(" ");
            match operand {
                Operand::Value(Value::Null) => {
                    out.push(operator.as_sql()).push(" NULL");
                }
                Operand::Value(v) => {
                    let kw = if operator == Operator::Is {
                        "IS NOT DISTINCT FROM "
                    } else {
                        "IS DISTINCT FROM "
                    };
                    out.push(kw).push_bind(v.clone());
                }
                _ => {
                    return Err(OrmError::unsupported_type(format!(
                        "{operator} on '{field}' needs a scalar operand"
                    )));
                }
            }
        }
        _ => match operand {
            Operand::Value(Value::Null) => {
                out.push(field)
                    .push(" ")
                    .push(operator.as_sql())
                    .push(" NULL");
            }
            Operand::Value(v) => {
                out.push(field)
                    .push(" ")
                    .push(operator.as_sql())
                    .push(" ")
                    .push_bind(v.clone());
            }
            Operand::SubQuery(q) => {
                out.push(field).push(" ").push(operator.as_sql()).push(" (");
                out.push_sql(q.build(prefix)?);
                out.push(")");
            }
            Operand::List(_) | Operand::Keyed(..) => {
                return Err(OrmError::unsupported_type(format!(
                    "a list cannot be compared with {operator} on '{field}'"
                )));
            }
        },
    }
    Ok(())
}
