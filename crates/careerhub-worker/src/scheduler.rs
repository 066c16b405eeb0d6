//! Cron scheduler for the periodic sweeps.
//!
//! Every task is registered explicitly; nothing runs unless it appears
//! in `register_default_tasks`. The promotion and cleanup sweeps take a
//! distributed lock first so only one instance runs each sweep per
//! tick.

use std::sync::Arc;
use std::time::Duration;

use tokio_cron_scheduler::{Job as CronJob, JobScheduler};
use tracing;

use careerhub_cache::{keys, DistributedLock};
use careerhub_core::config::worker::SweeperConfig;
use careerhub_core::error::AppError;
use careerhub_core::result::AppResult;

use crate::sweeper::ScheduledSweeper;

/// TTL on the sweep-wide locks. Outlives any reasonable sweep but
/// lapses well before the next daily cleanup tick.
const SWEEP_LOCK_TTL: Duration = Duration::from_secs(55);
const CLEANUP_LOCK_TTL: Duration = Duration::from_secs(300);

/// Cron-based scheduler driving the notification sweeps.
pub struct CronScheduler {
    /// The underlying job scheduler
    scheduler: JobScheduler,
    /// Sweeper executing the scheduled work
    sweeper: Arc<ScheduledSweeper>,
    /// Lock keeping each sweep single-instance across the fleet
    lock: DistributedLock,
    config: SweeperConfig,
}

impl std::fmt::Debug for CronScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CronScheduler").finish()
    }
}

impl CronScheduler {
    /// Create a new cron scheduler
    pub async fn new(
        sweeper: Arc<ScheduledSweeper>,
        lock: DistributedLock,
        config: SweeperConfig,
    ) -> AppResult<Self> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {}", e)))?;

        Ok(Self {
            scheduler,
            sweeper,
            lock,
            config,
        })
    }

    /// Register all default scheduled tasks
    pub async fn register_default_tasks(&self) -> AppResult<()> {
        self.register_promotion_sweep().await?;
        self.register_retention_cleanup().await?;
        self.register_queue_janitor().await?;

        tracing::info!("All scheduled tasks registered");
        Ok(())
    }

    /// Start the scheduler
    pub async fn start(&self) -> AppResult<()> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {}", e)))?;

        tracing::info!("Cron scheduler started");
        Ok(())
    }

    /// Shutdown the scheduler
    pub async fn shutdown(&mut self) -> AppResult<()> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {}", e)))?;

        tracing::info!("Cron scheduler shut down");
        Ok(())
    }

    /// Scheduled-notification promotion — per `sweep_cron`, default every minute
    async fn register_promotion_sweep(&self) -> AppResult<()> {
        let sweeper = Arc::clone(&self.sweeper);
        let lock = self.lock.clone();
        let job = CronJob::new_async(self.config.sweep_cron.as_str(), move |_uuid, _lock| {
            let sweeper = Arc::clone(&sweeper);
            let lock = lock.clone();
            Box::pin(async move {
                let key = keys::sweep_lock();
                match lock.acquire(&key, SWEEP_LOCK_TTL).await {
                    Ok(true) => {}
                    Ok(false) => {
                        tracing::debug!("Promotion sweep running elsewhere, skipping");
                        return;
                    }
                    Err(e) => {
                        tracing::error!("Failed to acquire sweep lock: {}", e);
                        return;
                    }
                }
                if let Err(e) = sweeper.promote_due().await {
                    tracing::error!("Promotion sweep failed: {}", e);
                }
                if let Err(e) = lock.release(&key).await {
                    tracing::error!("Failed to release sweep lock: {}", e);
                }
            })
        })
        .map_err(|e| {
            AppError::internal(format!("Failed to create promotion_sweep schedule: {}", e))
        })?;

        self.scheduler.add(job).await.map_err(|e| {
            AppError::internal(format!("Failed to add promotion_sweep schedule: {}", e))
        })?;

        tracing::info!(cron = %self.config.sweep_cron, "Registered: promotion_sweep");
        Ok(())
    }

    /// Notification retention cleanup — per `cleanup_cron`, default daily at 2 AM
    async fn register_retention_cleanup(&self) -> AppResult<()> {
        let sweeper = Arc::clone(&self.sweeper);
        let lock = self.lock.clone();
        let job = CronJob::new_async(self.config.cleanup_cron.as_str(), move |_uuid, _lock| {
            let sweeper = Arc::clone(&sweeper);
            let lock = lock.clone();
            Box::pin(async move {
                let key = keys::cleanup_lock();
                match lock.acquire(&key, CLEANUP_LOCK_TTL).await {
                    Ok(true) => {}
                    Ok(false) => {
                        tracing::debug!("Retention cleanup running elsewhere, skipping");
                        return;
                    }
                    Err(e) => {
                        tracing::error!("Failed to acquire cleanup lock: {}", e);
                        return;
                    }
                }
                if let Err(e) = sweeper.purge_expired().await {
                    tracing::error!("Retention cleanup failed: {}", e);
                }
                if let Err(e) = lock.release(&key).await {
                    tracing::error!("Failed to release cleanup lock: {}", e);
                }
            })
        })
        .map_err(|e| {
            AppError::internal(format!(
                "Failed to create retention_cleanup schedule: {}",
                e
            ))
        })?;

        self.scheduler.add(job).await.map_err(|e| {
            AppError::internal(format!("Failed to add retention_cleanup schedule: {}", e))
        })?;

        tracing::info!(cron = %self.config.cleanup_cron, "Registered: retention_cleanup");
        Ok(())
    }

    /// Queue retention janitor — every 10 minutes
    async fn register_queue_janitor(&self) -> AppResult<()> {
        let sweeper = Arc::clone(&self.sweeper);
        let job = CronJob::new_async("0 */10 * * * *", move |_uuid, _lock| {
            let sweeper = Arc::clone(&sweeper);
            Box::pin(async move {
                tracing::debug!("Enforcing queue retention");
                if let Err(e) = sweeper.enforce_queue_retention().await {
                    tracing::error!("Queue retention failed: {}", e);
                }
            })
        })
        .map_err(|e| {
            AppError::internal(format!("Failed to create queue_janitor schedule: {}", e))
        })?;

        self.scheduler.add(job).await.map_err(|e| {
            AppError::internal(format!("Failed to add queue_janitor schedule: {}", e))
        })?;

        tracing::info!("Registered: queue_janitor (every 10min)");
        Ok(())
    }
}
