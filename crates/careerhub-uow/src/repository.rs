//! Tracked repositories that capture aggregate events at persistence time.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use careerhub_core::error::AppError;
use careerhub_core::result::AppResult;

use crate::aggregate::Aggregate;
use crate::ledger::SharedLedger;

/// Raw persistence operations for one aggregate type.
///
/// Implementations run against the unit of work's transaction
/// connection, so everything written through a tracked repository
/// commits or rolls back together.
#[async_trait]
pub trait EntityStore<E: Aggregate>: Send + Sync + 'static {
    /// Load an aggregate by ID.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<E>>;

    /// Persist a new aggregate.
    async fn insert(&self, entity: &E) -> AppResult<()>;

    /// Persist changes to an existing aggregate.
    async fn update(&self, entity: &E) -> AppResult<()>;

    /// Delete an aggregate by ID.
    async fn delete(&self, id: Uuid) -> AppResult<()>;
}

/// Repository wrapper that drains aggregate event queues into the
/// unit of work's ledger whenever an aggregate is persisted.
pub struct TrackedRepository<E: Aggregate> {
    store: Arc<dyn EntityStore<E>>,
    ledger: SharedLedger,
}

impl<E: Aggregate> TrackedRepository<E> {
    /// Create a new tracked repository over a store and a shared ledger.
    pub fn new(store: Arc<dyn EntityStore<E>>, ledger: SharedLedger) -> Self {
        Self { store, ledger }
    }

    /// Load an aggregate by ID.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<E>> {
        self.store.find_by_id(id).await
    }

    /// Persist a new aggregate and capture its queued events.
    pub async fn insert(&self, entity: &mut E) -> AppResult<()> {
        self.store.insert(entity).await?;
        self.capture(entity)
    }

    /// Persist changes to an aggregate and capture its queued events.
    pub async fn update(&self, entity: &mut E) -> AppResult<()> {
        self.store.update(entity).await?;
        self.capture(entity)
    }

    /// Delete an aggregate by ID.
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.store.delete(id).await
    }

    fn capture(&self, entity: &mut E) -> AppResult<()> {
        let mut ledger = self
            .ledger
            .lock()
            .map_err(|_| AppError::internal("Event ledger mutex poisoned"))?;
        ledger.absorb(entity.events_mut());
        Ok(())
    }
}
