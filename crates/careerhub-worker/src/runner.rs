//! Worker runner — main loop that polls the queue and executes jobs.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::time;
use tracing::{debug, error, info, trace, warn};

use careerhub_core::config::worker::WorkerConfig;
use careerhub_database::stores::JobStore;
use careerhub_entity::job::{NotificationJob, QueuedJob};

use crate::processor::NotificationProcessor;

/// Polls the job store and dispatches claimed jobs to the processor
/// under bounded concurrency.
pub struct WorkerRunner {
    jobs: Arc<dyn JobStore>,
    processor: Arc<NotificationProcessor>,
    config: WorkerConfig,
    worker_id: String,
}

impl WorkerRunner {
    /// Create a new worker runner.
    pub fn new(
        jobs: Arc<dyn JobStore>,
        processor: Arc<NotificationProcessor>,
        config: WorkerConfig,
        worker_id: String,
    ) -> Self {
        Self {
            jobs,
            processor,
            config,
            worker_id,
        }
    }

    /// Start the worker runner. Runs until the cancel signal is received,
    /// then drains in-flight jobs.
    pub async fn run(&self, mut cancel: watch::Receiver<bool>) {
        info!(
            worker_id = %self.worker_id,
            concurrency = self.config.concurrency,
            poll_interval_s = self.config.poll_interval_seconds,
            "Worker started"
        );

        let semaphore = Arc::new(tokio::sync::Semaphore::new(self.config.concurrency));
        let poll_interval = Duration::from_secs(self.config.poll_interval_seconds);

        loop {
            tokio::select! {
                _ = cancel.changed() => {
                    if *cancel.borrow() {
                        info!(worker_id = %self.worker_id, "Worker received shutdown signal");
                        break;
                    }
                }
                _ = self.poll_and_execute(&semaphore) => {
                    tokio::select! {
                        _ = cancel.changed() => {
                            if *cancel.borrow() {
                                info!(worker_id = %self.worker_id, "Worker shutting down");
                                break;
                            }
                        }
                        _ = time::sleep(poll_interval) => {}
                    }
                }
            }
        }

        info!(worker_id = %self.worker_id, "Waiting for in-flight jobs to complete...");
        let max_permits = self.config.concurrency as u32;
        let _ = time::timeout(Duration::from_secs(30), semaphore.acquire_many(max_permits)).await;
        info!(worker_id = %self.worker_id, "Worker shut down");
    }

    /// Claim one job if a worker slot is free and execute it.
    async fn poll_and_execute(&self, semaphore: &Arc<tokio::sync::Semaphore>) {
        let permit = match semaphore.clone().try_acquire_owned() {
            Ok(p) => p,
            Err(_) => {
                trace!("All worker slots occupied");
                return;
            }
        };

        match self.jobs.claim_next(&self.worker_id).await {
            Ok(Some(job)) => {
                let jobs = Arc::clone(&self.jobs);
                let processor = Arc::clone(&self.processor);
                tokio::spawn(async move {
                    let _permit = permit;
                    execute_claimed(jobs, processor, job).await;
                });
            }
            Ok(None) => {
                drop(permit);
                trace!("No jobs due");
            }
            Err(e) => {
                drop(permit);
                error!(error = %e, "Failed to claim job");
            }
        }
    }
}

/// Execute one claimed job and settle its outcome in the store.
///
/// A malformed payload or a permanent delivery error fails the job
/// outright; transient errors reschedule it with exponential backoff
/// until its attempts are exhausted.
pub(crate) async fn execute_claimed(
    jobs: Arc<dyn JobStore>,
    processor: Arc<NotificationProcessor>,
    job: QueuedJob,
) {
    debug!(
        job_id = %job.id,
        attempt = job.attempts,
        max_attempts = job.max_attempts,
        "Processing job"
    );

    let payload: NotificationJob = match serde_json::from_value(job.payload.clone()) {
        Ok(p) => p,
        Err(e) => {
            error!(job_id = %job.id, error = %e, "Job payload is malformed");
            let message = format!("Malformed payload: {e}");
            if let Err(e) = jobs.mark_failed(job.id, &message).await {
                error!(job_id = %job.id, error = %e, "Failed to mark job failed");
            }
            return;
        }
    };

    match processor.process(&payload).await {
        Ok(notification_id) => {
            if let Err(e) = jobs.mark_completed(job.id).await {
                error!(job_id = %job.id, error = %e, "Failed to mark job completed");
            }
            debug!(job_id = %job.id, %notification_id, "Job completed");
        }
        Err(e) if e.is_permanent() => {
            error!(job_id = %job.id, error = %e, "Job failed permanently");
            if let Err(persist_err) = jobs.mark_failed(job.id, &e.message).await {
                error!(job_id = %job.id, error = %persist_err, "Failed to mark job failed");
            }
        }
        Err(e) => {
            if job.can_retry() {
                let delay = chrono::Duration::milliseconds(job.next_backoff_ms());
                let run_at = Utc::now() + delay;
                warn!(
                    job_id = %job.id,
                    attempt = job.attempts,
                    max_attempts = job.max_attempts,
                    retry_in_ms = job.next_backoff_ms(),
                    error = %e,
                    "Job failed, scheduling retry"
                );
                if let Err(persist_err) = jobs.reschedule(job.id, run_at, &e.message).await {
                    error!(job_id = %job.id, error = %persist_err, "Failed to reschedule job");
                }
            } else {
                error!(
                    job_id = %job.id,
                    attempts = job.attempts,
                    error = %e,
                    "Job exhausted its attempts"
                );
                if let Err(persist_err) = jobs.mark_failed(job.id, &e.message).await {
                    error!(job_id = %job.id, error = %persist_err, "Failed to mark job failed");
                }
            }
        }
    }
}
