//! Transaction control on a [`Database`] handle.
//!
//! One level only: `start_transaction` inside an open transaction fails.
//! A handle dropped with an open transaction logs a warning; the server
//! rolls the transaction back when the session ends.
//!
//! ```ignore
//! db.start_transaction().await?;
//! if db.insert("users", &data).await?.is_ok() {
//!     db.commit().await?;
//! } else {
//!     db.rollback().await?;
//! }
//! ```

use crate::client::DbClient;
use crate::database::Database;
use crate::error::{OrmError, OrmResult};

impl<C: DbClient> Database<C> {
    /// `BEGIN`.
    pub async fn start_transaction(&mut self) -> OrmResult<()> {
        if self.in_transaction {
            return Err(OrmError::validation("a transaction is already in progress"));
        }
        self.transaction_control("BEGIN").await?;
        self.in_transaction = true;
        Ok(())
    }

    /// `COMMIT`.
    pub async fn commit(&mut self) -> OrmResult<()> {
        self.end_transaction("COMMIT").await
    }

    /// `ROLLBACK`.
    pub async fn rollback(&mut self) -> OrmResult<()> {
        self.end_transaction("ROLLBACK").await
    }

    pub fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    async fn end_transaction(&mut self, sql: &str) -> OrmResult<()> {
        if !self.in_transaction {
            return Err(OrmError::validation("no transaction in progress"));
        }
        // The server leaves the transaction either way once COMMIT/ROLLBACK ran.
        let result = self.transaction_control(sql).await;
        self.in_transaction = false;
        result
    }

    async fn transaction_control(&self, sql: &str) -> OrmResult<()> {
        #[cfg(feature = "tracing")]
        tracing::debug!(target: "pgfluent.sql", sql, "transaction control");
        self.connection()?.batch_execute(sql).await
    }
}

impl<C: DbClient> Drop for Database<C> {
    fn drop(&mut self) {
        #[cfg(feature = "tracing")]
        if self.in_transaction && self.client().is_some() {
            tracing::warn!(
                target: "pgfluent.sql",
                "Database dropped with an open transaction; it will be rolled back"
            );
        }
    }
}
