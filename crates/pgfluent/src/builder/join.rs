use super::subquery::SubQuery;
use crate::error::{OrmError, OrmResult};
use crate::ident;
use crate::sql::SqlBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    /// Plain `JOIN`.
    Default,
    Left,
    Right,
    Inner,
    Full,
    LeftOuter,
    RightOuter,
    FullOuter,
    Cross,
}

impl JoinType {
    /// Parse a join type; input is trimmed and upper-cased, `""` is a plain JOIN.
    pub fn parse(s: &str) -> OrmResult<Self> {
        let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ");
        match normalized.to_ascii_uppercase().as_str() {
            "" => Ok(JoinType::Default),
            "LEFT" => Ok(JoinType::Left),
            "RIGHT" => Ok(JoinType::Right),
            "INNER" => Ok(JoinType::Inner),
            "FULL" => Ok(JoinType::Full),
            "LEFT OUTER" => Ok(JoinType::LeftOuter),
            "RIGHT OUTER" => Ok(JoinType::RightOuter),
            "FULL OUTER" => Ok(JoinType::FullOuter),
            "CROSS" => Ok(JoinType::Cross),
            other => Err(OrmError::invalid_argument(format!(
                "Wrong JOIN type: {other}"
            ))),
        }
    }

    fn keyword(self) -> &'static str {
        match self {
            JoinType::Default => "JOIN",
            JoinType::Left => "LEFT JOIN",
            JoinType::Right => "RIGHT JOIN",
            JoinType::Inner => "INNER JOIN",
            JoinType::Full => "FULL JOIN",
            JoinType::LeftOuter => "LEFT OUTER JOIN",
            JoinType::RightOuter => "RIGHT OUTER JOIN",
            JoinType::FullOuter => "FULL OUTER JOIN",
            JoinType::Cross => "CROSS JOIN",
        }
    }
}

/// What a JOIN attaches: a table reference (`"users u"`) or an aliased sub-query.
#[derive(Debug, Clone, PartialEq)]
pub enum JoinTarget {
    Table(String),
    SubQuery(Box<SubQuery>),
}

impl From<&str> for JoinTarget {
    fn from(s: &str) -> Self {
        JoinTarget::Table(s.to_string())
    }
}

impl From<String> for JoinTarget {
    fn from(s: String) -> Self {
        JoinTarget::Table(s)
    }
}

impl From<SubQuery> for JoinTarget {
    fn from(q: SubQuery) -> Self {
        JoinTarget::SubQuery(Box::new(q))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct JoinSpec {
    pub(crate) join_type: JoinType,
    pub(crate) target: JoinTarget,
    pub(crate) condition: String,
}

pub(crate) fn append_joins(joins: &[JoinSpec], prefix: &str, out: &mut SqlBuf) -> OrmResult<()> {
    for join in joins {
        out.push(" ").push(join.join_type.keyword()).push(" ");
        match &join.target {
            JoinTarget::Table(name) => {
                out.push(&ident::table(prefix, name)?);
            }
            JoinTarget::SubQuery(q) => {
                let alias = q.alias_name().ok_or_else(|| {
                    OrmError::validation("a sub-query JOIN target needs an alias")
                })?;
                let alias = ident::column(alias)?;
                out.push("(");
                out.push_sql(q.build(prefix)?);
                out.push(") ").push(&alias);
            }
        }
        let condition = join.condition.trim();
        if !condition.is_empty() {
            out.push(" ON ").push(condition);
        }
    }
    Ok(())
}
