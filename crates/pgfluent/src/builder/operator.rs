use crate::error::{OrmError, OrmResult};
use std::fmt;

/// Comparison operator of a WHERE condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    NotEq,
    Lt,
    Lte,
    Gt,
    Gte,
    /// `<=>`, null-safe equality.
    NullSafeEq,
    Like,
    NotLike,
    ILike,
    NotILike,
    In,
    NotIn,
    Between,
    NotBetween,
    Exists,
    NotExists,
    Is,
    IsNot,
}

impl Operator {
    /// Parse an operator case-insensitively (`"not in"`, `">="`, `"<>"`, ...).
    pub fn parse(s: &str) -> OrmResult<Self> {
        let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ");
        let op = match normalized.to_ascii_uppercase().as_str() {
            "=" => Operator::Eq,
            "!=" | "<>" => Operator::NotEq,
            "<" => Operator::Lt,
            "<=" => Operator::Lte,
            ">" => Operator::Gt,
            ">=" => Operator::Gte,
            "<=>" => Operator::NullSafeEq,
            "LIKE" => Operator::Like,
            "NOT LIKE" => Operator::NotLike,
            "ILIKE" => Operator::ILike,
            "NOT ILIKE" => Operator::NotILike,
            "IN" => Operator::In,
            "NOT IN" => Operator::NotIn,
            "BETWEEN" => Operator::Between,
            "NOT BETWEEN" => Operator::NotBetween,
            "EXISTS" => Operator::Exists,
            "NOT EXISTS" => Operator::NotExists,
            "IS" => Operator::Is,
            "IS NOT" => Operator::IsNot,
            _ => {
                return Err(OrmError::invalid_argument(format!(
                    "Wrong operator: {s}"
                )));
            }
        };
        Ok(op)
    }

    /// SQL text of the operator.
    pub fn as_sql(self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::NotEq => "<>",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::NullSafeEq => "IS NOT DISTINCT FROM",
            Operator::Like => "LIKE",
            Operator::NotLike => "NOT LIKE",
            Operator::ILike => "ILIKE",
            Operator::NotILike => "NOT ILIKE",
            Operator::In => "IN",
            Operator::NotIn => "NOT IN",
            Operator::Between => "BETWEEN",
            Operator::NotBetween => "NOT BETWEEN",
            Operator::Exists => "EXISTS",
            Operator::NotExists => "NOT EXISTS",
            Operator::Is => "IS",
            Operator::IsNot => "IS NOT",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl std::str::FromStr for Operator {
    type Err = OrmError;

    fn from_str(s: &str) -> OrmResult<Self> {
        Operator::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_and_space_insensitive() {
        assert_eq!(Operator::parse("not   in").unwrap(), Operator::NotIn);
        assert_eq!(Operator::parse("Between").unwrap(), Operator::Between);
        assert_eq!(Operator::parse("!=").unwrap(), Operator::NotEq);
        assert_eq!(Operator::parse(" <=> ").unwrap(), Operator::NullSafeEq);
        assert_eq!("ilike".parse::<Operator>().unwrap(), Operator::ILike);
    }

    #[test]
    fn unknown_operator_is_invalid_argument() {
        let err = Operator::parse("=~").unwrap_err();
        assert!(err.is_invalid_argument());
    }
}
