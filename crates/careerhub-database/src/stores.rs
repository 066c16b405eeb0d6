//! Store traits implemented by the Postgres repositories.
//!
//! The worker crate depends on these traits rather than concrete
//! repositories so unit tests can substitute in-memory fakes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use careerhub_core::result::AppResult;
use careerhub_entity::job::{CreateQueuedJob, QueuedJob};
use careerhub_entity::notification::{CreateNotification, NotificationRecord};

/// Per-state job counts used for queue statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobCounts {
    /// Jobs due now, waiting for a worker slot.
    pub waiting: i64,
    /// Jobs with a future `run_at`.
    pub delayed: i64,
    /// Jobs currently held by a worker.
    pub active: i64,
    /// Successfully completed jobs still within retention.
    pub completed: i64,
    /// Permanently failed jobs still within retention.
    pub failed: i64,
}

/// Persistence operations for notification records.
#[async_trait]
pub trait NotificationStore: Send + Sync + 'static {
    /// Find a notification by ID.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<NotificationRecord>>;

    /// Create a new notification.
    async fn create(&self, data: &CreateNotification) -> AppResult<NotificationRecord>;

    /// Mark a notification as sent.
    async fn mark_sent(&self, id: Uuid, sent_at: DateTime<Utc>) -> AppResult<()>;

    /// Mark a notification as failed.
    async fn mark_failed(&self, id: Uuid) -> AppResult<()>;

    /// Mark a notification as read by the recipient.
    async fn mark_read(&self, id: Uuid) -> AppResult<()>;

    /// Scheduled notifications that are due, oldest `scheduled_at` first,
    /// capped at `limit`.
    async fn find_due_scheduled(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> AppResult<Vec<NotificationRecord>>;

    /// Hard-delete terminal notifications created before the cutoff.
    /// Returns the number of rows deleted.
    async fn delete_terminal_before(&self, cutoff: DateTime<Utc>) -> AppResult<u64>;
}

/// Persistence operations for the delivery job queue.
#[async_trait]
pub trait JobStore: Send + Sync + 'static {
    /// Insert a single job.
    async fn enqueue(&self, data: &CreateQueuedJob) -> AppResult<QueuedJob>;

    /// Insert a batch of jobs in one statement. Returns the number inserted.
    async fn enqueue_many(&self, data: &[CreateQueuedJob]) -> AppResult<u64>;

    /// Atomically claim the next due job for a worker.
    ///
    /// A job is due when it is `waiting`, or `delayed` with `run_at` in
    /// the past. Claiming flips it to `active`, increments `attempts`,
    /// and stamps the worker ID. Uses `FOR UPDATE SKIP LOCKED` so
    /// concurrent workers never claim the same row.
    async fn claim_next(&self, worker_id: &str) -> AppResult<Option<QueuedJob>>;

    /// Mark a claimed job as completed.
    async fn mark_completed(&self, id: Uuid) -> AppResult<()>;

    /// Mark a claimed job as permanently failed.
    async fn mark_failed(&self, id: Uuid, error: &str) -> AppResult<()>;

    /// Return a claimed job to the queue for a later retry.
    async fn reschedule(&self, id: Uuid, run_at: DateTime<Utc>, error: &str) -> AppResult<()>;

    /// Snapshot per-state job counts.
    async fn counts_by_state(&self) -> AppResult<JobCounts>;

    /// Delete completed jobs older than the cutoff, then trim any
    /// completed jobs beyond the newest `keep_count`. Returns rows deleted.
    async fn purge_completed(
        &self,
        older_than: DateTime<Utc>,
        keep_count: i64,
    ) -> AppResult<u64>;

    /// Delete failed jobs older than the cutoff. Returns rows deleted.
    async fn purge_failed(&self, older_than: DateTime<Utc>) -> AppResult<u64>;
}
