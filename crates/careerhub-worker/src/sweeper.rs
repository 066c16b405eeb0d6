//! Scheduled-notification sweeper.
//!
//! Promotes due scheduled notifications into the delivery queue and
//! enforces retention on old rows. Sweeps run on every instance; a
//! per-notification dispatch lock keeps concurrent sweepers from
//! promoting the same record twice.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{error, info, warn};

use careerhub_cache::{keys, DistributedLock};
use careerhub_core::config::worker::SweeperConfig;
use careerhub_core::result::AppResult;
use careerhub_database::stores::NotificationStore;
use careerhub_entity::job::NotificationJob;

use crate::queue::NotificationQueue;

/// TTL on the per-notification dispatch lock. Long enough to cover the
/// enqueue round-trip, short enough that a crashed sweeper does not
/// hold up the next sweep for long.
const DISPATCH_LOCK_TTL: Duration = Duration::from_secs(30);

/// Promotes due scheduled notifications and purges expired ones.
pub struct ScheduledSweeper {
    notifications: Arc<dyn NotificationStore>,
    queue: Arc<NotificationQueue>,
    lock: DistributedLock,
    config: SweeperConfig,
}

impl ScheduledSweeper {
    /// Create a new sweeper.
    pub fn new(
        notifications: Arc<dyn NotificationStore>,
        queue: Arc<NotificationQueue>,
        lock: DistributedLock,
        config: SweeperConfig,
    ) -> Self {
        Self {
            notifications,
            queue,
            lock,
            config,
        }
    }

    /// Promote due scheduled notifications into the delivery queue.
    ///
    /// Processes at most `sweep_batch_size` records per call, oldest
    /// `scheduled_at` first. A record whose dispatch lock is held by
    /// another sweeper is skipped; a record that fails to enqueue is
    /// marked failed and the sweep continues. Returns the number of
    /// records promoted.
    pub async fn promote_due(&self) -> AppResult<u64> {
        let now = Utc::now();
        let due = self
            .notifications
            .find_due_scheduled(now, self.config.sweep_batch_size)
            .await?;

        if due.is_empty() {
            return Ok(0);
        }
        info!(count = due.len(), "Promoting due scheduled notifications");

        let mut promoted = 0u64;
        for record in due {
            let lock_key = keys::dispatch_lock(record.id);
            if !self.lock.acquire(&lock_key, DISPATCH_LOCK_TTL).await? {
                warn!(notification_id = %record.id, "Dispatch lock held elsewhere, skipping");
                continue;
            }

            let job = NotificationJob::from(&record);
            match self.queue.queue_notification(&job).await {
                Ok(_) => promoted += 1,
                Err(e) => {
                    error!(
                        notification_id = %record.id,
                        error = %e,
                        "Failed to enqueue scheduled notification"
                    );
                    // Best effort; one bad record must not stall the sweep.
                    if let Err(persist_err) = self.notifications.mark_failed(record.id).await {
                        error!(
                            notification_id = %record.id,
                            error = %persist_err,
                            "Failed to mark scheduled notification as failed"
                        );
                    }
                }
            }

            self.lock.release(&lock_key).await?;
        }

        info!(promoted, "Scheduled notification sweep finished");
        Ok(promoted)
    }

    /// Delete terminal notifications older than the retention window.
    pub async fn purge_expired(&self) -> AppResult<u64> {
        let cutoff = Utc::now() - chrono::Duration::days(self.config.notification_retention_days);
        let purged = self.notifications.delete_terminal_before(cutoff).await?;
        if purged > 0 {
            info!(purged, %cutoff, "Expired notifications purged");
        }
        Ok(purged)
    }

    /// Apply the queue's retention policy to terminal jobs.
    pub async fn enforce_queue_retention(&self) -> AppResult<u64> {
        self.queue.enforce_retention().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{seeded_record, InMemoryJobStore, InMemoryNotificationStore};
    use careerhub_cache::MemoryStore;
    use careerhub_core::config::queue::QueueConfig;
    use careerhub_entity::notification::NotificationStatus;
    use chrono::{DateTime, Utc};
    use uuid::Uuid;

    fn sweeper(
        notifications: Arc<InMemoryNotificationStore>,
        jobs: Arc<InMemoryJobStore>,
        config: SweeperConfig,
    ) -> ScheduledSweeper {
        let queue = Arc::new(NotificationQueue::new(jobs, &QueueConfig::default()));
        let lock = DistributedLock::new(Arc::new(MemoryStore::new()));
        ScheduledSweeper::new(notifications, queue, lock, config)
    }

    fn scheduled(at: DateTime<Utc>) -> careerhub_entity::notification::NotificationRecord {
        seeded_record(NotificationStatus::Scheduled, Some(at), Utc::now())
    }

    #[tokio::test]
    async fn test_promotes_oldest_first_up_to_batch_size() {
        let notifications = Arc::new(InMemoryNotificationStore::new());
        let jobs = Arc::new(InMemoryJobStore::new());

        let base = Utc::now() - chrono::Duration::hours(3);
        let mut expected_order: Vec<Uuid> = Vec::new();
        for i in 0..150 {
            let record = scheduled(base + chrono::Duration::seconds(i));
            expected_order.push(record.id);
            notifications.seed(record);
        }

        let sweeper = sweeper(
            Arc::clone(&notifications),
            Arc::clone(&jobs),
            SweeperConfig::default(),
        );
        let promoted = sweeper.promote_due().await.unwrap();
        assert_eq!(promoted, 100);

        // The 100 oldest by scheduled_at were promoted, in order.
        let enqueued: Vec<Uuid> = jobs
            .all()
            .iter()
            .map(|job| {
                let payload: NotificationJob =
                    serde_json::from_value(job.payload.clone()).unwrap();
                payload.notification_id.unwrap()
            })
            .collect();
        assert_eq!(enqueued[..], expected_order[..100]);
    }

    #[tokio::test]
    async fn test_future_and_unscheduled_records_are_not_promoted() {
        let notifications = Arc::new(InMemoryNotificationStore::new());
        let jobs = Arc::new(InMemoryJobStore::new());

        notifications.seed(scheduled(Utc::now() + chrono::Duration::hours(1)));
        notifications.seed(seeded_record(NotificationStatus::Pending, None, Utc::now()));

        let sweeper = sweeper(notifications, Arc::clone(&jobs), SweeperConfig::default());
        assert_eq!(sweeper.promote_due().await.unwrap(), 0);
        assert!(jobs.all().is_empty());
    }

    #[tokio::test]
    async fn test_held_dispatch_lock_skips_record() {
        let notifications = Arc::new(InMemoryNotificationStore::new());
        let jobs = Arc::new(InMemoryJobStore::new());

        let contested = scheduled(Utc::now() - chrono::Duration::minutes(5));
        let contested_id = contested.id;
        notifications.seed(contested);
        notifications.seed(scheduled(Utc::now() - chrono::Duration::minutes(1)));

        let queue = Arc::new(NotificationQueue::new(
            Arc::clone(&jobs) as _,
            &QueueConfig::default(),
        ));
        let store = Arc::new(MemoryStore::new());
        let lock = DistributedLock::new(Arc::clone(&store) as _);
        lock.acquire(&keys::dispatch_lock(contested_id), Duration::from_secs(60))
            .await
            .unwrap();

        let sweeper = ScheduledSweeper::new(
            Arc::clone(&notifications) as _,
            queue,
            lock,
            SweeperConfig::default(),
        );

        let promoted = sweeper.promote_due().await.unwrap();
        assert_eq!(promoted, 1);
        assert_eq!(jobs.all().len(), 1);
    }

    #[tokio::test]
    async fn test_enqueue_failure_marks_record_failed_and_continues() {
        let notifications = Arc::new(InMemoryNotificationStore::new());
        let jobs = Arc::new(InMemoryJobStore::new());
        jobs.fail_enqueues();

        let first = scheduled(Utc::now() - chrono::Duration::minutes(5));
        let second = scheduled(Utc::now() - chrono::Duration::minutes(1));
        let (first_id, second_id) = (first.id, second.id);
        notifications.seed(first);
        notifications.seed(second);

        let sweeper = sweeper(
            Arc::clone(&notifications),
            Arc::clone(&jobs),
            SweeperConfig::default(),
        );

        // Both records hit the enqueue failure; neither stalls the sweep.
        let promoted = sweeper.promote_due().await.unwrap();
        assert_eq!(promoted, 0);
        assert_eq!(
            notifications.record(first_id).unwrap().status,
            NotificationStatus::Failed
        );
        assert_eq!(
            notifications.record(second_id).unwrap().status,
            NotificationStatus::Failed
        );
    }

    #[tokio::test]
    async fn test_purge_deletes_only_old_terminal_records() {
        let notifications = Arc::new(InMemoryNotificationStore::new());
        let jobs = Arc::new(InMemoryJobStore::new());

        let old_sent = seeded_record(
            NotificationStatus::Sent,
            None,
            Utc::now() - chrono::Duration::days(31),
        );
        let recent_sent = seeded_record(
            NotificationStatus::Sent,
            None,
            Utc::now() - chrono::Duration::days(29),
        );
        let old_pending = seeded_record(
            NotificationStatus::Pending,
            None,
            Utc::now() - chrono::Duration::days(40),
        );
        let (recent_id, pending_id) = (recent_sent.id, old_pending.id);
        notifications.seed(old_sent);
        notifications.seed(recent_sent);
        notifications.seed(old_pending);

        let sweeper = sweeper(Arc::clone(&notifications), jobs, SweeperConfig::default());
        let purged = sweeper.purge_expired().await.unwrap();

        assert_eq!(purged, 1);
        assert!(notifications.record(recent_id).is_some());
        assert!(notifications.record(pending_id).is_some());
    }
}
