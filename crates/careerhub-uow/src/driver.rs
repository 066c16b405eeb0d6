//! Transaction driver abstraction.

use async_trait::async_trait;

use careerhub_core::result::AppResult;

/// Transaction isolation level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IsolationLevel {
    /// PostgreSQL's default.
    #[default]
    ReadCommitted,
    /// Snapshot isolation.
    RepeatableRead,
    /// Full serializability.
    Serializable,
}

impl IsolationLevel {
    /// The SQL spelling of this level.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::ReadCommitted => "READ COMMITTED",
            Self::RepeatableRead => "REPEATABLE READ",
            Self::Serializable => "SERIALIZABLE",
        }
    }
}

/// Controls the database transaction a unit of work runs in.
///
/// Implementations own one connection for the lifetime of the unit of
/// work so every statement issued through it lands in the same
/// transaction.
#[async_trait]
pub trait TransactionDriver: Send + Sync + 'static {
    /// Open a transaction at the given isolation level.
    async fn begin(&self, isolation: IsolationLevel) -> AppResult<()>;

    /// Commit the open transaction.
    async fn commit(&self) -> AppResult<()>;

    /// Roll back the open transaction.
    async fn rollback(&self) -> AppResult<()>;

    /// Release the underlying connection. Idempotent.
    async fn release(&self) -> AppResult<()>;
}
