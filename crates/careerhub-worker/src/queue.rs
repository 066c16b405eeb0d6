//! Notification queue service.
//!
//! The producer-facing surface of the delivery pipeline: everything
//! that wants a notification delivered goes through here. Jobs land in
//! the backing store with a retry policy attached; the worker runner
//! drains them.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use careerhub_core::config::queue::QueueConfig;
use careerhub_core::result::AppResult;
use careerhub_database::stores::JobStore;
use careerhub_entity::job::{CreateQueuedJob, NotificationJob, QueuedJob};

/// Retry behavior attached to every enqueued job.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum delivery attempts.
    pub max_attempts: u32,
    /// Base delay for exponential backoff; attempt `n` waits
    /// `backoff_base * 2^(n-1)`.
    pub backoff_base: Duration,
}

/// How long terminal jobs are kept for inspection.
#[derive(Debug, Clone, Copy)]
pub struct RetentionPolicy {
    /// Completed jobs older than this are purged.
    pub completed_max_age: Duration,
    /// At most this many completed jobs are kept regardless of age.
    pub completed_max_count: i64,
    /// Failed jobs older than this are purged.
    pub failed_max_age: Duration,
}

/// Snapshot of per-state job counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Jobs due now, waiting for a worker slot.
    pub waiting: i64,
    /// Jobs currently being processed.
    pub active: i64,
    /// Completed jobs within retention.
    pub completed: i64,
    /// Failed jobs within retention.
    pub failed: i64,
    /// Jobs with a future `run_at`.
    pub delayed: i64,
}

/// Producer-facing queue over the job store.
pub struct NotificationQueue {
    jobs: Arc<dyn JobStore>,
    retry: RetryPolicy,
    retention: RetentionPolicy,
}

impl NotificationQueue {
    /// Create a queue from configuration.
    pub fn new(jobs: Arc<dyn JobStore>, config: &QueueConfig) -> Self {
        Self {
            jobs,
            retry: RetryPolicy {
                max_attempts: config.max_attempts,
                backoff_base: Duration::from_millis(config.backoff_base_ms),
            },
            retention: RetentionPolicy {
                completed_max_age: Duration::from_secs(config.completed_retention_seconds),
                completed_max_count: config.completed_retention_count as i64,
                failed_max_age: Duration::from_secs(config.failed_retention_seconds),
            },
        }
    }

    /// The retry policy applied to enqueued jobs.
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Enqueue a notification for immediate delivery.
    pub async fn queue_notification(&self, job: &NotificationJob) -> AppResult<QueuedJob> {
        let queued = self.jobs.enqueue(&self.create_job(job, Utc::now())?).await?;
        debug!(job_id = %queued.id, channel = %job.channel, "Notification queued");
        Ok(queued)
    }

    /// Enqueue a notification for delivery after a delay.
    pub async fn schedule_notification(
        &self,
        job: &NotificationJob,
        delay: Duration,
    ) -> AppResult<QueuedJob> {
        // Saturate instead of panicking on an absurd delay.
        let run_at = chrono::Duration::from_std(delay)
            .ok()
            .and_then(|d| Utc::now().checked_add_signed(d))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let queued = self.jobs.enqueue(&self.create_job(job, run_at)?).await?;
        debug!(job_id = %queued.id, %run_at, "Notification scheduled");
        Ok(queued)
    }

    /// Enqueue a notification for delivery at a specific time.
    ///
    /// A timestamp in the past (or now) behaves exactly like immediate
    /// enqueueing.
    pub async fn schedule_notification_at(
        &self,
        job: &NotificationJob,
        at: DateTime<Utc>,
    ) -> AppResult<QueuedJob> {
        let run_at = at.max(Utc::now());
        let queued = self.jobs.enqueue(&self.create_job(job, run_at)?).await?;
        debug!(job_id = %queued.id, %run_at, "Notification scheduled");
        Ok(queued)
    }

    /// Enqueue a batch of notifications in one insert.
    pub async fn queue_bulk_notifications(&self, jobs: &[NotificationJob]) -> AppResult<u64> {
        let now = Utc::now();
        let rows = jobs
            .iter()
            .map(|job| self.create_job(job, now))
            .collect::<AppResult<Vec<_>>>()?;
        let inserted = self.jobs.enqueue_many(&rows).await?;
        info!(count = inserted, "Bulk notifications queued");
        Ok(inserted)
    }

    /// Snapshot the per-state job counts.
    pub async fn stats(&self) -> AppResult<QueueStats> {
        let counts = self.jobs.counts_by_state().await?;
        Ok(QueueStats {
            waiting: counts.waiting,
            active: counts.active,
            completed: counts.completed,
            failed: counts.failed,
            delayed: counts.delayed,
        })
    }

    /// Apply the retention policy to terminal jobs. Returns rows purged.
    pub async fn enforce_retention(&self) -> AppResult<u64> {
        let now = Utc::now();
        let completed_cutoff = now
            - chrono::Duration::from_std(self.retention.completed_max_age)
                .unwrap_or_else(|_| chrono::Duration::zero());
        let failed_cutoff = now
            - chrono::Duration::from_std(self.retention.failed_max_age)
                .unwrap_or_else(|_| chrono::Duration::zero());

        let purged_completed = self
            .jobs
            .purge_completed(completed_cutoff, self.retention.completed_max_count)
            .await?;
        let purged_failed = self.jobs.purge_failed(failed_cutoff).await?;

        let purged = purged_completed + purged_failed;
        if purged > 0 {
            info!(purged_completed, purged_failed, "Queue retention enforced");
        }
        Ok(purged)
    }

    fn create_job(&self, job: &NotificationJob, run_at: DateTime<Utc>) -> AppResult<CreateQueuedJob> {
        Ok(CreateQueuedJob {
            payload: serde_json::to_value(job)?,
            max_attempts: self.retry.max_attempts as i32,
            backoff_base_ms: self.retry.backoff_base.as_millis() as i64,
            run_at,
        })
    }
}
