//! # pgfluent
//!
//! A fluent, chainable query builder and thin execution layer for PostgreSQL.
//!
//! ## Features
//!
//! - **Chainable builder**: WHERE/JOIN/ORDER BY/GROUP BY/options accumulate on the handle
//! - **Safe binding**: every value is a numbered `$n` parameter, sub-queries are renumbered
//! - **Field markers**: `inc()`, `dec()`, `func()`, `not()` and `now()` for insert/update data
//! - **Execution metrics**: row counts, total count, last query, last error, timing trace
//! - **Transactions**: `start_transaction` / `commit` / `rollback` on the same handle
//!
//! ## Example
//!
//! ```ignore
//! use pgfluent::{Database, DbConfig, Operator, TableData, inc};
//!
//! let mut db = Database::connect(DbConfig::new("localhost").dbname("shop")).await?;
//!
//! // SELECT
//! let users = db
//!     .and_where("active", true)
//!     .and_where_op("id", Operator::In, vec![1, 2, 3])
//!     .order_by("id", "DESC")?
//!     .get("users", 10)
//!     .await?;
//!
//! // UPDATE
//! let data = TableData::new().set("login_count", inc(1));
//! db.and_where("login", "user1").update("users", &data).await?;
//! ```
//!
//! Terminal calls always clear the pending builder state, whether they
//! succeeded or not.

#[macro_use]
pub mod builder;

pub mod client;
pub mod config;
pub mod database;
pub mod error;
pub mod ident;
pub mod params;
pub mod row;
pub mod sql;
pub mod trace;
pub mod transaction;
pub mod value;

pub use builder::{
    Direction, FieldValue, JoinTarget, JoinType, Limit, Operand, Operator, PendingQuery,
    QueryOption, SubQuery, TableData, build_create_table, dec, func, inc, interval, not, now, op,
};
pub use client::DbClient;
pub use config::DbConfig;
pub use database::{Database, InsertResult};
pub use error::{OrmError, OrmResult};
pub use ident::Ident;
pub use params::BindParams;
pub use row::ResultRow;
pub use sql::SqlBuf;
pub use trace::{QueryType, TraceEntry};
pub use value::{BindType, Value};
