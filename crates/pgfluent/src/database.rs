//! The `Database` handle: connection, pending builder state and terminal calls.

use crate::builder::{self, Limit, PendingQuery, QueryOption, TableData};
use crate::client::DbClient;
use crate::config::DbConfig;
use crate::error::{OrmError, OrmResult};
use crate::row::ResultRow;
use crate::sql::SqlBuf;
use crate::trace::{QueryType, TraceEntry, Tracer};
use crate::value::Value;
use std::time::Instant;

/// Outcome of [`Database::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertResult {
    /// The new row's primary key.
    Id(i64),
    /// A row was inserted but has no positive primary key.
    Inserted,
    /// Execution failed or a conflict skipped the row; see [`Database::last_error`].
    Failed,
}

impl InsertResult {
    pub fn is_ok(self) -> bool {
        !matches!(self, InsertResult::Failed)
    }

    pub fn id(self) -> Option<i64> {
        match self {
            InsertResult::Id(id) => Some(id),
            _ => None,
        }
    }
}

struct Call {
    method: &'static str,
    label: Option<String>,
}

/// A connection plus the builder state of the statement being composed.
///
/// Builder methods (`and_where`, `join`, `order_by`, ...) accumulate state;
/// a terminal call (`get`, `insert`, `update`, ...) consumes it. Build,
/// argument and prepare failures are returned as `Err`. Execution failures
/// are recorded in [`last_error`](Self::last_error) and reported through the
/// return value.
///
/// ```ignore
/// let mut db = Database::connect(DbConfig::new("localhost").dbname("shop")).await?;
/// let users = db
///     .and_where("active", true)
///     .order_by("id", "DESC")?
///     .get("users", 10)
///     .await?;
/// ```
pub struct Database<C: DbClient = tokio_postgres::Client> {
    client: Option<C>,
    config: DbConfig,
    pending: PendingQuery,
    count: u64,
    total_count: u64,
    last_query: String,
    last_error: Option<String>,
    last_insert_id: Option<i64>,
    pub(crate) in_transaction: bool,
    tracer: Tracer,
}

impl Database<tokio_postgres::Client> {
    /// Connect with `config`; an unknown charset fails the connection.
    pub async fn connect(config: DbConfig) -> OrmResult<Self> {
        config.validate()?;
        let client = open(&config).await?;
        Ok(Self::with_config(client, config))
    }

    /// Connect with [`DbConfig::from_dotenv`].
    pub async fn from_env() -> OrmResult<Self> {
        Self::connect(DbConfig::from_dotenv()?).await
    }

    /// Reconnect to database `name` with the stored connection parameters.
    pub async fn select_database(&mut self, name: &str) -> OrmResult<()> {
        let config = self.config.clone().dbname(name);
        config.validate()?;
        let client = open(&config).await?;
        self.client = Some(client);
        self.config = config;
        self.in_transaction = false;
        Ok(())
    }
}

async fn open(config: &DbConfig) -> OrmResult<tokio_postgres::Client> {
    let (client, connection) = config
        .to_pg_config()
        .connect(tokio_postgres::NoTls)
        .await
        .map_err(|e| OrmError::Connection(e.to_string()))?;
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            #[cfg(feature = "tracing")]
            tracing::error!(target: "pgfluent.sql", error = %e, "connection error");
            #[cfg(not(feature = "tracing"))]
            let _ = e;
        }
    });
    Ok(client)
}

impl<C: DbClient> Database<C> {
    /// Wrap an already-open client with default settings.
    pub fn from_client(client: C) -> Self {
        Self::with_config(client, DbConfig::default())
    }

    /// Wrap an already-open client; `config` supplies the prefix and primary key.
    pub fn with_config(client: C, config: DbConfig) -> Self {
        Self {
            client: Some(client),
            config,
            pending: PendingQuery::default(),
            count: 0,
            total_count: 0,
            last_query: String::new(),
            last_error: None,
            last_insert_id: None,
            in_transaction: false,
            tracer: Tracer::default(),
        }
    }

    /// The underlying client, `None` after [`close`](Self::close).
    pub fn client(&self) -> Option<&C> {
        self.client.as_ref()
    }

    pub(crate) fn connection(&self) -> OrmResult<&C> {
        self.client
            .as_ref()
            .ok_or_else(|| OrmError::Connection("connection is closed".to_string()))
    }

    fn pending_mut(&mut self) -> &mut PendingQuery {
        &mut self.pending
    }

    /// Builder state of the statement being composed.
    pub fn pending(&self) -> &PendingQuery {
        &self.pending
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Total rows of the last SELECT run with the total-count option.
    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    /// Last statement sent, with values substituted for display.
    pub fn last_query(&self) -> &str {
        &self.last_query
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn last_insert_id(&self) -> Option<i64> {
        self.last_insert_id
    }

    pub fn prefix(&self) -> &str {
        &self.config.prefix
    }

    pub fn set_prefix(&mut self, prefix: impl Into<String>) -> &mut Self {
        self.config.prefix = prefix.into();
        self
    }

    pub fn trace(&self) -> &[TraceEntry] {
        self.tracer.entries()
    }

    pub fn clear_trace(&mut self) {
        self.tracer.clear();
    }

    /// Turn tracing on or off; `strip_prefix` is removed from caller labels.
    pub fn set_trace(&mut self, enabled: bool, strip_prefix: &str) -> &mut Self {
        self.tracer.configure(enabled, strip_prefix);
        self
    }

    /// Double single quotes for embedding `s` in a string literal.
    pub fn escape(&self, s: &str) -> String {
        s.replace('\'', "''")
    }

    /// `true` when the connection answers `SELECT 1`.
    pub async fn ping(&self) -> bool {
        match self.client.as_ref() {
            Some(client) if !client.is_closed() => client.batch_execute("SELECT 1").await.is_ok(),
            _ => false,
        }
    }

    /// Roll back an open transaction and drop the connection.
    pub async fn close(&mut self) -> OrmResult<()> {
        let result = if self.in_transaction {
            self.rollback().await
        } else {
            Ok(())
        };
        self.client = None;
        result
    }

    // ── Terminal calls ──

    fn take_pending(&mut self, method: &'static str) -> (PendingQuery, Call) {
        let pending = std::mem::take(&mut self.pending);
        let call = Call {
            method,
            label: pending.caller_label().map(str::to_string),
        };
        (pending, call)
    }

    /// Rows of `SELECT * FROM table` under the pending clauses.
    pub async fn get(&mut self, table: &str, limit: impl Into<Limit>) -> OrmResult<Vec<ResultRow>> {
        let limit = limit.into();
        self.select("get", table, limit, "*").await
    }

    pub async fn get_columns(
        &mut self,
        table: &str,
        limit: impl Into<Limit>,
        columns: &str,
    ) -> OrmResult<Vec<ResultRow>> {
        let limit = limit.into();
        self.select("get", table, limit, columns).await
    }

    /// First row, if any.
    pub async fn get_one(&mut self, table: &str, columns: &str) -> OrmResult<Option<ResultRow>> {
        let rows = self.select("get_one", table, Limit::Rows(1), columns).await?;
        Ok(rows.into_iter().next())
    }

    /// Value of `column` in the first row, if any.
    pub async fn get_value(&mut self, table: &str, column: &str) -> OrmResult<Option<Value>> {
        let columns = format!("{column} AS retval");
        let rows = self.select("get_value", table, Limit::Rows(1), &columns).await?;
        Ok(rows.into_iter().next().and_then(|row| row.take("retval")))
    }

    /// Values of `column` for up to `limit` rows.
    pub async fn get_values(
        &mut self,
        table: &str,
        column: &str,
        limit: impl Into<Limit>,
    ) -> OrmResult<Vec<Value>> {
        let columns = format!("{column} AS retval");
        let limit = limit.into();
        let rows = self.select("get_value", table, limit, &columns).await?;
        Ok(rows.into_iter().filter_map(|row| row.take("retval")).collect())
    }

    /// Whether any row matches the pending conditions; errors count as `false`.
    pub async fn has(&mut self, table: &str) -> bool {
        matches!(
            self.select("has", table, Limit::Rows(1), "1").await,
            Ok(rows) if !rows.is_empty()
        )
    }

    async fn select(
        &mut self,
        method: &'static str,
        table: &str,
        limit: Limit,
        columns: &str,
    ) -> OrmResult<Vec<ResultRow>> {
        let (pending, call) = self.take_pending(method);
        let prefix = &self.config.prefix;
        let sql = pending.build_select(prefix, table, columns, limit)?;
        let count_sql = match pending.has_option(QueryOption::TotalCount) {
            true => Some(pending.build_count(prefix, table, columns)?),
            false => None,
        };
        self.fetch_with_total(&call, sql, count_sql).await
    }

    /// Caller SQL followed by the pending clauses.
    pub async fn query(&mut self, sql: &str, limit: impl Into<Limit>) -> OrmResult<Vec<ResultRow>> {
        let limit = limit.into();
        let (pending, call) = self.take_pending("query");
        let prefix = &self.config.prefix;
        let built = pending.build_query(prefix, sql, limit)?;
        let count_sql = match pending.has_option(QueryOption::TotalCount) {
            true => Some(pending.build_query_count(prefix, sql)?),
            false => None,
        };
        self.fetch_with_total(&call, built, count_sql).await
    }

    async fn fetch_with_total(
        &mut self,
        call: &Call,
        sql: SqlBuf,
        count_sql: Option<SqlBuf>,
    ) -> OrmResult<Vec<ResultRow>> {
        self.total_count = 0;
        let rows = match self.fetch(call, &sql).await? {
            Ok(rows) => rows,
            Err(_) => return Ok(Vec::new()),
        };
        self.count = rows.len() as u64;

        if let Some(count_sql) = count_sql {
            self.total_count = self.fetch_total(&count_sql).await.unwrap_or(0);
        }
        Ok(rows)
    }

    /// Run the total-count follow-up of a SELECT.
    ///
    /// Part of the SELECT's terminal call: it adds no trace entry and leaves
    /// `last_query`, `last_error` and `count` alone. A failure only yields `None`.
    async fn fetch_total(&self, sql: &SqlBuf) -> Option<u64> {
        match self.query_unrecorded(sql).await {
            Ok(rows) => rows
                .first()
                .and_then(|row| row.get_index(0))
                .and_then(Value::as_i64)
                .and_then(|n| u64::try_from(n).ok()),
            Err(err) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(target: "pgfluent.sql", sql = %sql.to_sql(), error = %err, "total count failed");
                #[cfg(not(feature = "tracing"))]
                let _ = err;
                None
            }
        }
    }

    async fn query_unrecorded(&self, sql: &SqlBuf) -> OrmResult<Vec<ResultRow>> {
        sql.validate()?;
        let client = self.connection()?;
        let stmt = client.prepare(&sql.to_sql()).await?;
        client.query(&stmt, sql.params().values()).await
    }

    /// Insert one row and return its primary key.
    pub async fn insert(&mut self, table: &str, data: &TableData) -> OrmResult<InsertResult> {
        let (pending, call) = self.take_pending("insert");
        let sql = pending.build_insert(&self.config.prefix, table, data)?;
        let rows = match self.fetch(&call, &sql).await? {
            Ok(rows) => rows,
            Err(_) => return Ok(InsertResult::Failed),
        };
        self.count = rows.len() as u64;
        let Some(row) = rows.first() else {
            return Ok(InsertResult::Failed);
        };

        let id = row
            .get(&self.config.primary_key)
            .and_then(Value::as_i64)
            .filter(|id| *id > 0);
        match id {
            Some(id) => {
                self.last_insert_id = Some(id);
                Ok(InsertResult::Id(id))
            }
            None => Ok(InsertResult::Inserted),
        }
    }

    /// Update matching rows; [`count`](Self::count) holds the affected rows.
    pub async fn update(&mut self, table: &str, data: &TableData) -> OrmResult<bool> {
        let (pending, call) = self.take_pending("update");
        let sql = pending.build_update(&self.config.prefix, table, data)?;
        Ok(self.execute(&call, &sql).await?.is_ok())
    }

    /// Delete matching rows; `true` when at least one row went away.
    pub async fn delete(&mut self, table: &str, limit: impl Into<Limit>) -> OrmResult<bool> {
        let limit = limit.into();
        let (pending, call) = self.take_pending("delete");
        let sql = pending.build_delete(&self.config.prefix, table, limit)?;
        Ok(matches!(self.execute(&call, &sql).await?, Ok(n) if n > 0))
    }

    pub async fn drop_table(&mut self, table: &str) -> OrmResult<bool> {
        let (pending, call) = self.take_pending("drop_table");
        let sql = pending.build_drop(&self.config.prefix, table)?;
        Ok(self.execute(&call, &sql).await?.is_ok())
    }

    /// Run raw SQL whose `?` placeholders bind `params`.
    ///
    /// Unlike the other terminal calls, an execution failure is returned as
    /// [`OrmError::Execution`].
    pub async fn prepare(&mut self, sql: &str, params: &[Value]) -> OrmResult<Vec<ResultRow>> {
        let (_, call) = self.take_pending("prepare");
        let mut built = SqlBuf::default();
        built.push_template(sql, params.iter().cloned().collect())?;
        match self.fetch(&call, &built).await? {
            Ok(rows) => {
                self.count = rows.len() as u64;
                Ok(rows)
            }
            Err(OrmError::Execution(message)) => Err(OrmError::Execution(message)),
            Err(err) => Err(OrmError::Execution(err.to_string())),
        }
    }

    /// `CREATE TABLE name (id SERIAL PRIMARY KEY, <column> <type>, ...)`.
    pub async fn create_table(&mut self, name: &str, fields: &[(&str, &str)]) -> OrmResult<()> {
        let sql = builder::build_create_table(&self.config.prefix, name, fields)?;
        self.prepare(&sql.to_sql(), &[]).await.map(|_| ())
    }

    // ── Execution ──

    fn begin(&mut self, sql: &SqlBuf) -> OrmResult<String> {
        self.last_query = sql.to_display_sql();
        self.last_error = None;
        self.count = 0;
        sql.validate()?;
        Ok(sql.to_sql())
    }

    async fn prepare_statement(&mut self, text: &str) -> OrmResult<C::Statement> {
        let result = self.connection()?.prepare(text).await;
        if let Err(err) = &result {
            self.last_error = Some(err.to_string());
            #[cfg(feature = "tracing")]
            tracing::warn!(target: "pgfluent.sql", sql = %text, error = %err, "prepare failed");
        }
        result
    }

    /// The outer error means the statement never ran; the inner one is an
    /// execution failure, already recorded in `last_error`.
    async fn fetch(
        &mut self,
        call: &Call,
        sql: &SqlBuf,
    ) -> OrmResult<Result<Vec<ResultRow>, OrmError>> {
        let text = self.begin(sql)?;
        let stmt = self.prepare_statement(&text).await?;
        let started = Instant::now();
        let result = self
            .connection()?
            .query(&stmt, sql.params().values())
            .await;
        Ok(self.finish(call, sql, started, result))
    }

    async fn execute(&mut self, call: &Call, sql: &SqlBuf) -> OrmResult<Result<u64, OrmError>> {
        let text = self.begin(sql)?;
        let stmt = self.prepare_statement(&text).await?;
        let started = Instant::now();
        let result = self
            .connection()?
            .execute(&stmt, sql.params().values())
            .await;
        if let Ok(affected) = &result {
            self.count = *affected;
        }
        Ok(self.finish(call, sql, started, result))
    }

    fn finish<T>(
        &mut self,
        call: &Call,
        sql: &SqlBuf,
        started: Instant,
        result: OrmResult<T>,
    ) -> OrmResult<T> {
        let elapsed = started.elapsed();
        let caller = self.tracer.caller(call.method, call.label.as_deref());

        #[cfg(feature = "tracing")]
        tracing::debug!(
            target: "pgfluent.sql",
            query_type = ?QueryType::from_sql(&self.last_query),
            caller = %caller,
            elapsed_us = elapsed.as_micros() as u64,
            params = sql.params().len(),
            sql = %sql.to_sql(),
            "executed"
        );
        #[cfg(not(feature = "tracing"))]
        let _ = sql;

        if let Err(err) = &result {
            self.last_error = Some(err.to_string());
            #[cfg(feature = "tracing")]
            tracing::warn!(target: "pgfluent.sql", caller = %caller, error = %err, "execution failed");
        }

        if self.tracer.is_enabled() {
            self.tracer.record(TraceEntry {
                query: self.last_query.clone(),
                elapsed,
                caller,
                query_type: QueryType::from_sql(&self.last_query),
            });
        }
        result
    }
}

impl_builder_methods!(Database<C: DbClient>, pending_mut);

#[cfg(test)]
mod tests;
