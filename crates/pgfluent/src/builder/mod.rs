//! Fluent query builder.
//!
//! [`PendingQuery`] accumulates WHERE/JOIN/ORDER BY/GROUP BY/option state
//! between terminal calls. The `build_*` functions turn that state into a
//! [`SqlBuf`] with a fixed clause order:
//!
//! JOIN, SET/VALUES data, WHERE, GROUP BY, ORDER BY, LIMIT, trailing options.
//!
//! Every terminal call on [`Database`](crate::Database) takes the pending
//! state out of the handle first, so it is empty afterwards whether the call
//! succeeded or not.

#[macro_use]
mod macros;

mod condition;
mod join;
mod limit;
mod modifier;
mod operator;
mod options;
mod order;
mod subquery;


pub use condition::{Operand, op};
pub use join::{JoinTarget, JoinType};
pub use limit::Limit;
pub use modifier::{FieldValue, TableData, dec, func, inc, interval, not, now};
pub use operator::Operator;
pub use options::QueryOption;
pub use order::Direction;
pub use subquery::SubQuery;

use crate::error::{OrmError, OrmResult};
use crate::ident;
use crate::params::BindParams;
use crate::sql::SqlBuf;
use crate::value::Value;
use condition::{Condition, Connector};
use join::JoinSpec;
use options::QueryOptions;
use order::OrderBy;

/// Builder state accumulated until the next terminal call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PendingQuery {
    wheres: Vec<Condition>,
    joins: Vec<JoinSpec>,
    order_by: OrderBy,
    group_by: Vec<String>,
    options: QueryOptions,
    label: Option<String>,
}

impl PendingQuery {
    /// `true` when no clause, option or label is pending.
    pub fn is_empty(&self) -> bool {
        self.wheres.is_empty()
            && self.joins.is_empty()
            && self.order_by.is_empty()
            && self.group_by.is_empty()
            && self.options.is_empty()
            && self.label.is_none()
    }

    pub fn caller_label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn has_option(&self, option: QueryOption) -> bool {
        self.options.contains(option)
    }

    fn push_condition(
        &mut self,
        connector: Connector,
        field: &str,
        operator: Operator,
        operand: Operand,
    ) -> &mut Self {
        self.wheres.push(Condition::Value {
            connector,
            field: field.to_string(),
            operator,
            operand,
        });
        self
    }

    pub fn and_where(&mut self, field: &str, operand: impl Into<Operand>) -> &mut Self {
        self.push_condition(Connector::And, field, Operator::Eq, operand.into())
    }

    pub fn and_where_op(
        &mut self,
        field: &str,
        operator: Operator,
        operand: impl Into<Operand>,
    ) -> &mut Self {
        self.push_condition(Connector::And, field, operator, operand.into())
    }

    pub fn or_where(&mut self, field: &str, operand: impl Into<Operand>) -> &mut Self {
        self.push_condition(Connector::Or, field, Operator::Eq, operand.into())
    }

    pub fn or_where_op(
        &mut self,
        field: &str,
        operator: Operator,
        operand: impl Into<Operand>,
    ) -> &mut Self {
        self.push_condition(Connector::Or, field, operator, operand.into())
    }

    pub fn where_raw(&mut self, sql: &str, params: &[Value]) -> &mut Self {
        self.wheres.push(Condition::Raw {
            connector: Connector::And,
            sql: sql.to_string(),
            params: params.iter().cloned().collect::<BindParams>(),
        });
        self
    }

    pub fn or_where_raw(&mut self, sql: &str, params: &[Value]) -> &mut Self {
        self.wheres.push(Condition::Raw {
            connector: Connector::Or,
            sql: sql.to_string(),
            params: params.iter().cloned().collect::<BindParams>(),
        });
        self
    }

    pub fn join(
        &mut self,
        target: impl Into<JoinTarget>,
        condition: &str,
        join_type: &str,
    ) -> OrmResult<&mut Self> {
        let join_type = JoinType::parse(join_type)?;
        self.joins.push(JoinSpec {
            join_type,
            target: target.into(),
            condition: condition.to_string(),
        });
        Ok(self)
    }

    pub fn order_by(&mut self, field: &str, direction: &str) -> OrmResult<&mut Self> {
        let direction = Direction::parse(direction)?;
        self.order_by
            .set(order::sanitize_order_field(field), direction);
        Ok(self)
    }

    pub fn order_by_values(
        &mut self,
        field: &str,
        direction: &str,
        values: &[&str],
    ) -> OrmResult<&mut Self> {
        let direction = Direction::parse(direction)?;
        let field = order::sanitize_order_field(field);
        self.order_by
            .set(order::value_list_field(&field, values), direction);
        Ok(self)
    }

    pub fn group_by(&mut self, field: &str) -> &mut Self {
        self.group_by.push(order::sanitize_group_field(field));
        self
    }

    pub fn set_query_option(&mut self, name: &str) -> OrmResult<&mut Self> {
        self.options.insert(QueryOption::parse(name)?);
        Ok(self)
    }

    /// All names are checked before any is applied.
    pub fn set_query_options(&mut self, names: &[&str]) -> OrmResult<&mut Self> {
        let parsed = names
            .iter()
            .map(|n| QueryOption::parse(n))
            .collect::<OrmResult<Vec<_>>>()?;
        for option in parsed {
            self.options.insert(option);
        }
        Ok(self)
    }

    pub fn with_total_count(&mut self) -> &mut Self {
        self.options.insert(QueryOption::TotalCount);
        self
    }

    pub fn label(&mut self, text: impl Into<String>) -> &mut Self {
        self.label = Some(text.into());
        self
    }

    // ── Statement assembly ──

    fn append_filters(&self, prefix: &str, out: &mut SqlBuf) -> OrmResult<()> {
        join::append_joins(&self.joins, prefix, out)?;
        condition::append_where(&self.wheres, prefix, out)?;
        order::append_group_by(&self.group_by, out);
        Ok(())
    }

    fn append_tail(&self, prefix: &str, limit: Limit, out: &mut SqlBuf) {
        self.order_by.append_to(prefix, out);
        limit.append_to(out);
        out.push(self.options.locking_clause());
    }

    fn select_head(&self, prefix: &str, table: &str, columns: &str) -> OrmResult<SqlBuf> {
        let columns = match columns.trim() {
            "" => "*",
            c => c,
        };
        let mut out = SqlBuf::new("SELECT ");
        out.push(&self.options.select_modifiers())
            .push(columns)
            .push(" FROM ")
            .push(&ident::table(prefix, table)?);
        Ok(out)
    }

    /// `SELECT [ALL|DISTINCT] columns FROM table ...`
    pub fn build_select(
        &self,
        prefix: &str,
        table: &str,
        columns: &str,
        limit: Limit,
    ) -> OrmResult<SqlBuf> {
        let mut out = self.select_head(prefix, table, columns)?;
        self.append_filters(prefix, &mut out)?;
        self.append_tail(prefix, limit, &mut out);
        Ok(out)
    }

    /// Row count of the same SELECT without ORDER BY, LIMIT and locking.
    pub fn build_count(&self, prefix: &str, table: &str, columns: &str) -> OrmResult<SqlBuf> {
        let mut inner = self.select_head(prefix, table, columns)?;
        self.append_filters(prefix, &mut inner)?;
        let mut out = SqlBuf::new("SELECT COUNT(*) FROM (");
        out.push_sql(inner).push(") AS found_rows");
        Ok(out)
    }

    /// Caller SQL followed by the pending clauses.
    pub fn build_query(&self, prefix: &str, sql: &str, limit: Limit) -> OrmResult<SqlBuf> {
        let mut out = SqlBuf::new(sql.trim_end().trim_end_matches(';'));
        self.append_filters(prefix, &mut out)?;
        self.append_tail(prefix, limit, &mut out);
        Ok(out)
    }

    /// Count query wrapping [`build_query`](Self::build_query).
    pub fn build_query_count(&self, prefix: &str, sql: &str) -> OrmResult<SqlBuf> {
        let mut inner = SqlBuf::new(sql.trim_end().trim_end_matches(';'));
        self.append_filters(prefix, &mut inner)?;
        let mut out = SqlBuf::new("SELECT COUNT(*) FROM (");
        out.push_sql(inner).push(") AS found_rows");
        Ok(out)
    }

    /// `INSERT INTO table (cols) VALUES (...) [ON CONFLICT DO NOTHING] RETURNING *`
    pub fn build_insert(&self, prefix: &str, table: &str, data: &TableData) -> OrmResult<SqlBuf> {
        self.reject_clauses("INSERT", false)?;
        let mut out = SqlBuf::new("INSERT INTO ");
        out.push(&ident::table(prefix, table)?);
        modifier::append_insert_values(data, prefix, &mut out)?;
        if self.options.contains(QueryOption::Ignore) {
            out.push(" ON CONFLICT DO NOTHING");
        }
        out.push(" RETURNING *");
        Ok(out)
    }

    /// `UPDATE table SET ... WHERE ...`
    pub fn build_update(&self, prefix: &str, table: &str, data: &TableData) -> OrmResult<SqlBuf> {
        self.reject_clauses("UPDATE", false)?;
        let mut out = SqlBuf::new("UPDATE ");
        out.push(&ident::table(prefix, table)?);
        modifier::append_update_set(data, prefix, &mut out)?;
        condition::append_where(&self.wheres, prefix, &mut out)?;
        Ok(out)
    }

    /// `DELETE FROM table WHERE ...`; a row cap selects the victims by `ctid`,
    /// ordered by the pending ORDER BY.
    pub fn build_delete(&self, prefix: &str, table: &str, limit: Limit) -> OrmResult<SqlBuf> {
        self.reject_clauses("DELETE", !limit.is_all())?;
        let table = ident::table(prefix, table)?;
        let mut out = SqlBuf::new("DELETE FROM ");
        out.push(&table);
        if limit.is_all() {
            condition::append_where(&self.wheres, prefix, &mut out)?;
            return Ok(out);
        }
        out.push(" WHERE ctid IN (SELECT ctid FROM ").push(&table);
        condition::append_where(&self.wheres, prefix, &mut out)?;
        self.order_by.append_to(prefix, &mut out);
        limit.append_to(&mut out);
        out.push(")");
        Ok(out)
    }

    /// `DROP TABLE table`
    pub fn build_drop(&self, prefix: &str, table: &str) -> OrmResult<SqlBuf> {
        let mut out = SqlBuf::new("DROP TABLE ");
        out.push(&ident::table(prefix, table)?);
        Ok(out)
    }

    /// JOIN and GROUP BY never apply to a mutation; ORDER BY only where
    /// `order_allowed` (a capped DELETE).
    fn reject_clauses(&self, statement: &str, order_allowed: bool) -> OrmResult<()> {
        let clause = if !self.joins.is_empty() {
            "JOIN"
        } else if !self.group_by.is_empty() {
            "GROUP BY"
        } else if !order_allowed && !self.order_by.is_empty() {
            "ORDER BY"
        } else {
            return Ok(());
        };
        Err(OrmError::validation(format!(
            "{clause} is not supported in {statement}"
        )))
    }
}
