use crate::error::{OrmError, OrmResult};

/// Statement modifier keyword set with `set_query_option`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOption {
    /// `SELECT ALL`
    All,
    /// `SELECT DISTINCT`
    Distinct,
    /// Fill `total_count` with the row count ignoring LIMIT.
    TotalCount,
    /// Trailing `FOR UPDATE` on SELECT.
    ForUpdate,
    /// Trailing `FOR SHARE` on SELECT.
    ForShare,
    /// `ON CONFLICT DO NOTHING` on INSERT.
    Ignore,
}

impl QueryOption {
    pub fn parse(name: &str) -> OrmResult<Self> {
        let normalized = name.split_whitespace().collect::<Vec<_>>().join(" ");
        match normalized.to_ascii_uppercase().as_str() {
            "ALL" => Ok(QueryOption::All),
            "DISTINCT" => Ok(QueryOption::Distinct),
            "SQL_CALC_FOUND_ROWS" | "TOTAL_COUNT" => Ok(QueryOption::TotalCount),
            "FOR UPDATE" => Ok(QueryOption::ForUpdate),
            "FOR SHARE" => Ok(QueryOption::ForShare),
            "IGNORE" => Ok(QueryOption::Ignore),
            _ => Err(OrmError::invalid_argument(format!(
                "Wrong query option: {name}"
            ))),
        }
    }
}

/// Ordered, de-duplicated option list of a pending query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct QueryOptions(Vec<QueryOption>);

impl QueryOptions {
    pub(crate) fn insert(&mut self, option: QueryOption) {
        if !self.0.contains(&option) {
            self.0.push(option);
        }
    }

    pub(crate) fn contains(&self, option: QueryOption) -> bool {
        self.0.contains(&option)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Keywords that go right after `SELECT`.
    pub(crate) fn select_modifiers(&self) -> String {
        let mut out = String::new();
        for option in &self.0 {
            let kw = match option {
                QueryOption::All => "ALL ",
                QueryOption::Distinct => "DISTINCT ",
                _ => continue,
            };
            out.push_str(kw);
        }
        out
    }

    /// Row-locking clause that goes after LIMIT.
    pub(crate) fn locking_clause(&self) -> &'static str {
        if self.contains(QueryOption::ForUpdate) {
            " FOR UPDATE"
        } else if self.contains(QueryOption::ForShare) {
            " FOR SHARE"
        } else {
            ""
        }
    }
}
