//! Database client seam.
//!
//! [`Database`](crate::Database) talks to the server only through
//! [`DbClient`]: prepare a statement, run it for rows or for an affected-row
//! count, and run simple multi-statement SQL for transaction control. Row
//! decoding into [`ResultRow`] happens on this side of the seam so the
//! executor never touches driver rows.

use crate::error::{OrmError, OrmResult};
use crate::row::ResultRow;
use crate::value::Value;
use std::future::Future;
use tokio_postgres::types::ToSql;

/// The primitive capability set the statement executor needs.
pub trait DbClient: Send + Sync {
    /// A statement prepared on this connection.
    type Statement: Send + Sync;

    /// Prepare `sql`; failures map to [`OrmError::Prepare`].
    fn prepare(&self, sql: &str) -> impl Future<Output = OrmResult<Self::Statement>> + Send;

    /// Execute a prepared statement and decode all rows.
    fn query(
        &self,
        stmt: &Self::Statement,
        params: &[Value],
    ) -> impl Future<Output = OrmResult<Vec<ResultRow>>> + Send;

    /// Execute a prepared statement and return the affected row count.
    fn execute(
        &self,
        stmt: &Self::Statement,
        params: &[Value],
    ) -> impl Future<Output = OrmResult<u64>> + Send;

    /// Run one or more statements without parameters.
    fn batch_execute(&self, sql: &str) -> impl Future<Output = OrmResult<()>> + Send;

    /// Whether the underlying connection is known to be gone.
    fn is_closed(&self) -> bool {
        false
    }
}

fn as_sql_params(params: &[Value]) -> Vec<&(dyn ToSql + Sync)> {
    params.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
}

fn server_message(err: &tokio_postgres::Error) -> String {
    match err.as_db_error() {
        Some(db_err) => format!("{} ({})", db_err.message(), db_err.code().code()),
        None => err.to_string(),
    }
}

impl DbClient for tokio_postgres::Client {
    type Statement = tokio_postgres::Statement;

    async fn prepare(&self, sql: &str) -> OrmResult<Self::Statement> {
        tokio_postgres::Client::prepare(self, sql)
            .await
            .map_err(|e| OrmError::prepare(sql, server_message(&e)))
    }

    async fn query(&self, stmt: &Self::Statement, params: &[Value]) -> OrmResult<Vec<ResultRow>> {
        let params = as_sql_params(params);
        let rows = tokio_postgres::Client::query(self, stmt, &params)
            .await
            .map_err(OrmError::from_db_error)?;
        rows.iter().map(ResultRow::from_row).collect()
    }

    async fn execute(&self, stmt: &Self::Statement, params: &[Value]) -> OrmResult<u64> {
        let params = as_sql_params(params);
        tokio_postgres::Client::execute(self, stmt, &params)
            .await
            .map_err(OrmError::from_db_error)
    }

    async fn batch_execute(&self, sql: &str) -> OrmResult<()> {
        tokio_postgres::Client::batch_execute(self, sql)
            .await
            .map_err(OrmError::from_db_error)
    }

    fn is_closed(&self) -> bool {
        tokio_postgres::Client::is_closed(self)
    }
}
