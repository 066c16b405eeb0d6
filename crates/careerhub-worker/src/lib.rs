//! # careerhub-worker
//!
//! The delivery pipeline for CareerHub notifications: the queue
//! service producers enqueue into, the processor that hands payloads
//! to channel providers, the polling worker runner with bounded
//! concurrency and retry backoff, the scheduled sweeper, and the cron
//! scheduler that drives periodic sweeps.

pub mod processor;
pub mod queue;
pub mod runner;
pub mod scheduler;
pub mod sweeper;

#[cfg(test)]
pub(crate) mod testing;

pub use processor::NotificationProcessor;
pub use queue::{NotificationQueue, QueueStats, RetentionPolicy, RetryPolicy};
pub use runner::WorkerRunner;
pub use scheduler::CronScheduler;
pub use sweeper::ScheduledSweeper;
