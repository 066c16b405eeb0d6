//! Postgres transaction driver.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::pool::PoolConnection;
use sqlx::{PgPool, Postgres};
use tokio::sync::Mutex;
use tracing::debug;

use careerhub_core::error::{AppError, ErrorKind};
use careerhub_core::result::AppResult;

use crate::driver::{IsolationLevel, TransactionDriver};

/// Transaction driver over a dedicated Postgres connection.
///
/// The connection is checked out of the pool on `begin` and shared
/// (behind a mutex) with the entity stores participating in the unit
/// of work. Transaction control is issued as explicit SQL so the
/// connection can be handed around without sqlx's borrowed
/// `Transaction` guard.
#[derive(Clone)]
pub struct PgTransactionDriver {
    pool: PgPool,
    conn: Arc<Mutex<Option<PoolConnection<Postgres>>>>,
}

impl PgTransactionDriver {
    /// Create a new driver over a pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            conn: Arc::new(Mutex::new(None)),
        }
    }

    /// Handle to the transaction connection, shared with entity stores.
    pub fn connection(&self) -> Arc<Mutex<Option<PoolConnection<Postgres>>>> {
        Arc::clone(&self.conn)
    }

    async fn execute(&self, sql: &str) -> AppResult<()> {
        let mut guard = self.conn.lock().await;
        let conn = guard
            .as_mut()
            .ok_or_else(|| AppError::database("No open transaction connection"))?;
        sqlx::query(sql)
            .execute(conn.as_mut())
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, format!("Failed to run '{sql}'"), e)
            })?;
        Ok(())
    }
}

#[async_trait]
impl TransactionDriver for PgTransactionDriver {
    async fn begin(&self, isolation: IsolationLevel) -> AppResult<()> {
        {
            let mut guard = self.conn.lock().await;
            if guard.is_none() {
                let conn = self.pool.acquire().await.map_err(|e| {
                    AppError::with_source(
                        ErrorKind::Database,
                        "Failed to acquire transaction connection",
                        e,
                    )
                })?;
                *guard = Some(conn);
            }
        }

        debug!(isolation = isolation.as_sql(), "Beginning transaction");
        self.execute(&format!(
            "BEGIN TRANSACTION ISOLATION LEVEL {}",
            isolation.as_sql()
        ))
        .await
    }

    async fn commit(&self) -> AppResult<()> {
        self.execute("COMMIT").await?;
        debug!("Transaction committed");
        Ok(())
    }

    async fn rollback(&self) -> AppResult<()> {
        self.execute("ROLLBACK").await?;
        debug!("Transaction rolled back");
        Ok(())
    }

    async fn release(&self) -> AppResult<()> {
        // Dropping the pooled connection returns it to the pool.
        let mut guard = self.conn.lock().await;
        if guard.take().is_some() {
            debug!("Transaction connection released");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isolation_level_sql() {
        assert_eq!(IsolationLevel::ReadCommitted.as_sql(), "READ COMMITTED");
        assert_eq!(IsolationLevel::RepeatableRead.as_sql(), "REPEATABLE READ");
        assert_eq!(IsolationLevel::Serializable.as_sql(), "SERIALIZABLE");
        assert_eq!(IsolationLevel::default(), IsolationLevel::ReadCommitted);
    }
}
