use super::PendingQuery;
use super::limit::Limit;
use crate::error::OrmResult;
use crate::sql::SqlBuf;

/// A nested SELECT used as a WHERE operand, a JOIN target or an insert/update
/// value.
///
/// It carries its own pending clauses and is rendered with the table prefix of
/// the statement it is embedded in; its placeholders are numbered in line with
/// the outer statement.
///
/// ```ignore
/// let mut ids = SubQuery::select("products", "customer_id");
/// ids.and_where("product_name", "product1");
/// db.and_where_op("customer_id", Operator::In, ids);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct SubQuery {
    table: String,
    columns: String,
    limit: Limit,
    alias: Option<String>,
    query: PendingQuery,
}

impl SubQuery {
    /// `SELECT <columns> FROM <table>`.
    pub fn select(table: impl Into<String>, columns: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: columns.into(),
            limit: Limit::All,
            alias: None,
            query: PendingQuery::default(),
        }
    }

    /// Alias used when the sub-query is a JOIN target.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn limit(mut self, limit: impl Into<Limit>) -> Self {
        self.limit = limit.into();
        self
    }

    pub fn alias_name(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub(crate) fn build(&self, prefix: &str) -> OrmResult<SqlBuf> {
        self.query
            .build_select(prefix, &self.table, &self.columns, self.limit)
    }

    pub(crate) fn pending_mut(&mut self) -> &mut PendingQuery {
        &mut self.query
    }
}

impl_builder_methods!(SubQuery, pending_mut);
