//! The unit of work: one transaction, two event publication phases.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use careerhub_core::error::{AppError, ErrorKind};
use careerhub_core::result::AppResult;
use careerhub_core::traits::events::EventBus;

use crate::aggregate::Aggregate;
use crate::driver::{IsolationLevel, TransactionDriver};
use crate::ledger::{EventLedger, SharedLedger};
use crate::repository::{EntityStore, TrackedRepository};

#[derive(Debug, Default)]
struct TxState {
    active: bool,
    depth: u32,
    released: bool,
}

/// Coordinates one database transaction and the domain events raised
/// within it.
///
/// Before-commit events are published inside the transaction; a
/// failure there rolls everything back. After-commit events are
/// published once the transaction is durable; a failure there is
/// surfaced as [`ErrorKind::PostCommit`] and never undoes the commit.
pub struct UnitOfWork<D: TransactionDriver> {
    driver: D,
    bus: Arc<dyn EventBus>,
    ledger: SharedLedger,
    stores: Mutex<HashMap<TypeId, Box<dyn Any + Send + Sync>>>,
    repositories: Mutex<HashMap<TypeId, Box<dyn Any + Send + Sync>>>,
    state: Mutex<TxState>,
}

impl<D: TransactionDriver> UnitOfWork<D> {
    /// Create a new unit of work over a driver and an event bus.
    pub fn new(driver: D, bus: Arc<dyn EventBus>) -> Self {
        Self {
            driver,
            bus,
            ledger: EventLedger::shared(),
            stores: Mutex::new(HashMap::new()),
            repositories: Mutex::new(HashMap::new()),
            state: Mutex::new(TxState::default()),
        }
    }

    /// The ledger shared with this unit of work's repositories.
    pub fn ledger(&self) -> SharedLedger {
        Arc::clone(&self.ledger)
    }

    /// Register the entity store backing `TrackedRepository<E>`.
    pub fn register_store<E: Aggregate>(&self, store: Arc<dyn EntityStore<E>>) {
        self.stores
            .lock()
            .expect("store registry mutex poisoned")
            .insert(TypeId::of::<E>(), Box::new(store));
    }

    /// The tracked repository for an aggregate type, memoized per type.
    ///
    /// All repositories from one unit of work share one event ledger.
    pub fn repository<E: Aggregate>(&self) -> AppResult<Arc<TrackedRepository<E>>> {
        let type_id = TypeId::of::<E>();

        let mut repositories = self
            .repositories
            .lock()
            .map_err(|_| AppError::internal("Repository registry mutex poisoned"))?;
        if let Some(existing) = repositories.get(&type_id) {
            let repo = existing
                .downcast_ref::<Arc<TrackedRepository<E>>>()
                .ok_or_else(|| AppError::internal("Repository registry type mismatch"))?;
            return Ok(Arc::clone(repo));
        }

        let stores = self
            .stores
            .lock()
            .map_err(|_| AppError::internal("Store registry mutex poisoned"))?;
        let store = stores
            .get(&type_id)
            .and_then(|s| s.downcast_ref::<Arc<dyn EntityStore<E>>>())
            .ok_or_else(|| {
                AppError::internal(format!(
                    "No entity store registered for {}",
                    std::any::type_name::<E>()
                ))
            })?;

        let repo = Arc::new(TrackedRepository::new(
            Arc::clone(store),
            Arc::clone(&self.ledger),
        ));
        repositories.insert(type_id, Box::new(Arc::clone(&repo)));
        Ok(repo)
    }

    /// Open a transaction. A no-op when one is already open.
    pub async fn begin_transaction(
        &self,
        isolation: Option<IsolationLevel>,
    ) -> AppResult<()> {
        {
            let state = self
                .state
                .lock()
                .map_err(|_| AppError::internal("Transaction state mutex poisoned"))?;
            if state.active {
                return Ok(());
            }
        }

        self.driver.begin(isolation.unwrap_or_default()).await?;
        self.set_active(true)?;
        Ok(())
    }

    /// Run `action` inside this unit of work's transaction.
    ///
    /// Nested calls share the outermost transaction: only the
    /// outermost invocation commits on success or rolls back on
    /// failure. Errors from the action are rethrown unchanged.
    pub async fn execute_in_transaction<T, F, Fut>(&self, action: F) -> AppResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let outermost = self.enter()?;
        if outermost {
            if let Err(e) = self.begin_transaction(None).await {
                self.exit()?;
                return Err(e);
            }
        }

        let result = action().await;
        let outermost = self.exit()?;

        if !outermost {
            return result;
        }

        match result {
            Ok(value) => {
                self.commit().await?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback_err) = self.rollback().await {
                    warn!(error = %rollback_err, "Rollback failed after action error");
                }
                Err(e)
            }
        }
    }

    /// Commit the transaction. A no-op when none is open.
    ///
    /// Publishes before-commit events first (inside the transaction; a
    /// failure rolls back and propagates), then commits (a driver
    /// failure also rolls back and propagates), then publishes
    /// after-commit events (a failure is reported as
    /// [`ErrorKind::PostCommit`] but the commit stands).
    pub async fn commit(&self) -> AppResult<()> {
        {
            let state = self
                .state
                .lock()
                .map_err(|_| AppError::internal("Transaction state mutex poisoned"))?;
            if !state.active {
                warn!("Commit called without an open transaction, ignoring");
                return Ok(());
            }
        }

        let before = self.take_ledger(|l| l.take_before_commit())?;
        for event in &before {
            if let Err(e) = self.bus.publish(event).await {
                warn!(tag = event.tag(), error = %e, "Before-commit event rejected; rolling back");
                self.rollback().await?;
                return Err(e);
            }
        }

        if let Err(e) = self.driver.commit().await {
            warn!(error = %e, "Driver commit failed; rolling back");
            if let Err(rollback_err) = self.rollback().await {
                warn!(error = %rollback_err, "Rollback failed after commit error");
            }
            return Err(e);
        }
        self.set_active(false)?;
        debug!("Unit of work committed");

        let after = self.take_ledger(|l| l.take_after_commit())?;
        for event in &after {
            if let Err(e) = self.bus.publish(event).await {
                // The transaction is already durable.
                return Err(AppError::with_source(
                    ErrorKind::PostCommit,
                    format!("After-commit event publication failed: {}", e.message),
                    e,
                ));
            }
        }

        Ok(())
    }

    /// Roll back the transaction, discarding all collected events.
    pub async fn rollback(&self) -> AppResult<()> {
        self.take_ledger(|l| l.clear())?;

        let was_active = {
            let state = self
                .state
                .lock()
                .map_err(|_| AppError::internal("Transaction state mutex poisoned"))?;
            state.active
        };
        if was_active {
            self.driver.rollback().await?;
            self.set_active(false)?;
        }
        debug!("Unit of work rolled back");
        Ok(())
    }

    /// Release the underlying connection. Idempotent.
    pub async fn release(&self) -> AppResult<()> {
        {
            let mut state = self
                .state
                .lock()
                .map_err(|_| AppError::internal("Transaction state mutex poisoned"))?;
            if state.released {
                return Ok(());
            }
            state.released = true;
        }
        self.driver.release().await
    }

    fn enter(&self) -> AppResult<bool> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| AppError::internal("Transaction state mutex poisoned"))?;
        state.depth += 1;
        Ok(state.depth == 1)
    }

    fn exit(&self) -> AppResult<bool> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| AppError::internal("Transaction state mutex poisoned"))?;
        state.depth = state.depth.saturating_sub(1);
        Ok(state.depth == 0)
    }

    fn set_active(&self, active: bool) -> AppResult<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| AppError::internal("Transaction state mutex poisoned"))?;
        state.active = active;
        Ok(())
    }

    fn take_ledger<T>(&self, f: impl FnOnce(&mut EventLedger) -> T) -> AppResult<T> {
        let mut ledger = self
            .ledger
            .lock()
            .map_err(|_| AppError::internal("Event ledger mutex poisoned"))?;
        Ok(f(&mut ledger))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use uuid::Uuid;

    use careerhub_core::events::{DomainEvent, EventPayload, RecruitingEvent};
    use careerhub_core::traits::events::EventHandler;

    use crate::aggregate::EventQueues;
    use crate::dispatcher::EventDispatcher;

    type Log = Arc<Mutex<Vec<String>>>;

    struct FakeDriver {
        log: Log,
        fail_commit: bool,
    }

    #[async_trait]
    impl TransactionDriver for FakeDriver {
        async fn begin(&self, isolation: IsolationLevel) -> AppResult<()> {
            self.log
                .lock()
                .unwrap()
                .push(format!("BEGIN {}", isolation.as_sql()));
            Ok(())
        }

        async fn commit(&self) -> AppResult<()> {
            if self.fail_commit {
                return Err(AppError::database("commit refused"));
            }
            self.log.lock().unwrap().push("COMMIT".to_string());
            Ok(())
        }

        async fn rollback(&self) -> AppResult<()> {
            self.log.lock().unwrap().push("ROLLBACK".to_string());
            Ok(())
        }

        async fn release(&self) -> AppResult<()> {
            self.log.lock().unwrap().push("RELEASE".to_string());
            Ok(())
        }
    }

    struct LoggingHandler {
        log: Log,
        fail: bool,
    }

    #[async_trait]
    impl EventHandler for LoggingHandler {
        fn subscribed_tags(&self) -> &[&'static str] {
            &[]
        }

        async fn handle(&self, event: &DomainEvent) -> AppResult<()> {
            self.log.lock().unwrap().push(format!("EVENT {}", event.tag()));
            if self.fail {
                return Err(AppError::event("handler rejected event"));
            }
            Ok(())
        }
    }

    struct Application {
        id: Uuid,
        events: EventQueues,
    }

    impl Application {
        fn submitted() -> Self {
            let id = Uuid::new_v4();
            let mut events = EventQueues::new();
            events.record_before_commit(EventPayload::Recruiting(
                RecruitingEvent::ApplicationSubmitted {
                    application_id: id,
                    job_posting_id: Uuid::new_v4(),
                    candidate_id: Uuid::new_v4(),
                },
            ));
            events.record_after_commit(EventPayload::Recruiting(
                RecruitingEvent::ApplicationStatusChanged {
                    application_id: id,
                    candidate_id: Uuid::new_v4(),
                    from_status: "draft".to_string(),
                    to_status: "submitted".to_string(),
                },
            ));
            Self { id, events }
        }
    }

    impl Aggregate for Application {
        fn id(&self) -> Uuid {
            self.id
        }

        fn events_mut(&mut self) -> &mut EventQueues {
            &mut self.events
        }
    }

    #[derive(Default)]
    struct MemoryApplicationStore {
        rows: Mutex<HashMap<Uuid, Uuid>>,
    }

    #[async_trait]
    impl EntityStore<Application> for MemoryApplicationStore {
        async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Application>> {
            Ok(self.rows.lock().unwrap().get(&id).map(|id| Application {
                id: *id,
                events: EventQueues::new(),
            }))
        }

        async fn insert(&self, entity: &Application) -> AppResult<()> {
            self.rows.lock().unwrap().insert(entity.id, entity.id);
            Ok(())
        }

        async fn update(&self, entity: &Application) -> AppResult<()> {
            self.rows.lock().unwrap().insert(entity.id, entity.id);
            Ok(())
        }

        async fn delete(&self, id: Uuid) -> AppResult<()> {
            self.rows.lock().unwrap().remove(&id);
            Ok(())
        }
    }

    fn unit_of_work(log: &Log, fail_commit: bool, fail_handlers: bool) -> UnitOfWork<FakeDriver> {
        let mut dispatcher = EventDispatcher::new();
        dispatcher.register(Arc::new(LoggingHandler {
            log: Arc::clone(log),
            fail: fail_handlers,
        }));

        let uow = UnitOfWork::new(
            FakeDriver {
                log: Arc::clone(log),
                fail_commit,
            },
            Arc::new(dispatcher),
        );
        uow.register_store::<Application>(Arc::new(MemoryApplicationStore::default()));
        uow
    }

    #[tokio::test]
    async fn test_commit_publishes_phases_around_the_commit() {
        let log: Log = Arc::default();
        let uow = unit_of_work(&log, false, false);

        uow.begin_transaction(None).await.unwrap();
        let repo = uow.repository::<Application>().unwrap();
        let mut app = Application::submitted();
        repo.insert(&mut app).await.unwrap();
        uow.commit().await.unwrap();

        let log = log.lock().unwrap();
        assert_eq!(
            log.as_slice(),
            [
                "BEGIN READ COMMITTED",
                "EVENT recruiting.application.submitted",
                "COMMIT",
                "EVENT recruiting.application.status_changed",
            ]
        );
    }

    #[tokio::test]
    async fn test_before_commit_failure_rolls_back() {
        let log: Log = Arc::default();
        let uow = unit_of_work(&log, false, true);

        uow.begin_transaction(None).await.unwrap();
        let repo = uow.repository::<Application>().unwrap();
        let mut app = Application::submitted();
        repo.insert(&mut app).await.unwrap();

        let err = uow.commit().await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Event);

        let log = log.lock().unwrap();
        assert!(log.contains(&"ROLLBACK".to_string()));
        assert!(!log.contains(&"COMMIT".to_string()));
        // No after-commit event leaked out of the aborted transaction.
        assert!(!log
            .iter()
            .any(|l| l.contains("status_changed")));
    }

    #[tokio::test]
    async fn test_commit_without_transaction_is_noop() {
        let log: Log = Arc::default();
        let uow = unit_of_work(&log, false, false);

        uow.commit().await.unwrap();

        // No driver call and no event left the idle unit of work.
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_driver_commit_failure_rolls_back() {
        let log: Log = Arc::default();
        let uow = unit_of_work(&log, true, false);

        uow.begin_transaction(None).await.unwrap();
        let repo = uow.repository::<Application>().unwrap();
        let mut app = Application::submitted();
        repo.insert(&mut app).await.unwrap();

        let err = uow.commit().await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Database);

        {
            let log = log.lock().unwrap();
            assert!(log.contains(&"ROLLBACK".to_string()));
            assert!(!log.contains(&"COMMIT".to_string()));
            // The pending after-commit event was discarded.
            assert!(!log.iter().any(|l| l.contains("status_changed")));
        }
        assert!(uow.ledger().lock().unwrap().is_empty());

        // The unit of work ended up inactive: committing again is a no-op.
        uow.commit().await.unwrap();
        assert!(!log.lock().unwrap().contains(&"COMMIT".to_string()));
    }

    #[tokio::test]
    async fn test_after_commit_failure_is_post_commit() {
        let log: Log = Arc::default();
        let uow = unit_of_work(&log, false, true);

        uow.begin_transaction(None).await.unwrap();

        // Only an after-commit event; the failing handler cannot veto it.
        let repo = uow.repository::<Application>().unwrap();
        let mut app = Application {
            id: Uuid::new_v4(),
            events: EventQueues::new(),
        };
        app.events_mut()
            .record_after_commit(EventPayload::Recruiting(
                RecruitingEvent::JobPostingPublished {
                    job_posting_id: Uuid::new_v4(),
                    employer_id: Uuid::new_v4(),
                    title: "SRE".to_string(),
                },
            ));
        repo.insert(&mut app).await.unwrap();

        let err = uow.commit().await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::PostCommit);

        // The commit itself stands.
        assert!(log.lock().unwrap().contains(&"COMMIT".to_string()));
    }

    #[tokio::test]
    async fn test_nested_execute_shares_one_transaction() {
        let log: Log = Arc::default();
        let uow = Arc::new(unit_of_work(&log, false, false));

        let inner_uow = Arc::clone(&uow);
        uow.execute_in_transaction(|| async move {
            inner_uow
                .execute_in_transaction(|| async { Ok(42) })
                .await?;
            Ok(())
        })
        .await
        .unwrap();

        let log = log.lock().unwrap();
        let begins = log.iter().filter(|l| l.starts_with("BEGIN")).count();
        let commits = log.iter().filter(|l| l.as_str() == "COMMIT").count();
        assert_eq!(begins, 1);
        assert_eq!(commits, 1);
    }

    #[tokio::test]
    async fn test_outer_error_rolls_back_once() {
        let log: Log = Arc::default();
        let uow = Arc::new(unit_of_work(&log, false, false));

        let inner_uow = Arc::clone(&uow);
        let err = uow
            .execute_in_transaction(|| async move {
                inner_uow
                    .execute_in_transaction(|| async { Ok(()) })
                    .await?;
                Err::<(), _>(AppError::validation("bad input"))
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        let log = log.lock().unwrap();
        let rollbacks = log.iter().filter(|l| l.as_str() == "ROLLBACK").count();
        assert_eq!(rollbacks, 1);
        assert!(!log.contains(&"COMMIT".to_string()));
    }

    #[tokio::test]
    async fn test_rollback_discards_collected_events() {
        let log: Log = Arc::default();
        let uow = unit_of_work(&log, false, false);

        uow.begin_transaction(None).await.unwrap();
        let repo = uow.repository::<Application>().unwrap();
        let mut app = Application::submitted();
        repo.insert(&mut app).await.unwrap();
        uow.rollback().await.unwrap();

        assert!(uow.ledger().lock().unwrap().is_empty());
        assert!(!log.lock().unwrap().iter().any(|l| l.starts_with("EVENT")));
    }

    #[tokio::test]
    async fn test_release_is_idempotent() {
        let log: Log = Arc::default();
        let uow = unit_of_work(&log, false, false);

        uow.release().await.unwrap();
        uow.release().await.unwrap();

        let releases = log
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.as_str() == "RELEASE")
            .count();
        assert_eq!(releases, 1);
    }

    #[tokio::test]
    async fn test_repository_is_memoized() {
        let log: Log = Arc::default();
        let uow = unit_of_work(&log, false, false);

        let a = uow.repository::<Application>().unwrap();
        let b = uow.repository::<Application>().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn test_begin_is_idempotent() {
        let log: Log = Arc::default();
        let uow = unit_of_work(&log, false, false);

        uow.begin_transaction(None).await.unwrap();
        uow.begin_transaction(Some(IsolationLevel::Serializable))
            .await
            .unwrap();

        let begins = log
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.starts_with("BEGIN"))
            .count();
        assert_eq!(begins, 1);
    }
}
