//! Background worker and sweeper configuration.

use serde::{Deserialize, Serialize};

/// Background job worker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether the worker is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Number of concurrent job processing tasks.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Interval in seconds between job queue polls.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            concurrency: default_concurrency(),
            poll_interval_seconds: default_poll_interval(),
        }
    }
}

/// Scheduled-notification sweeper configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweeperConfig {
    /// Whether the sweeper is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Cron expression for the due-notification sweep.
    #[serde(default = "default_sweep_cron")]
    pub sweep_cron: String,
    /// Cron expression for the retention cleanup sweep.
    #[serde(default = "default_cleanup_cron")]
    pub cleanup_cron: String,
    /// Maximum number of due notifications promoted per sweep.
    #[serde(default = "default_sweep_batch_size")]
    pub sweep_batch_size: i64,
    /// Age in days after which terminal notifications are purged.
    #[serde(default = "default_notification_retention_days")]
    pub notification_retention_days: i64,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            sweep_cron: default_sweep_cron(),
            cleanup_cron: default_cleanup_cron(),
            sweep_batch_size: default_sweep_batch_size(),
            notification_retention_days: default_notification_retention_days(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_concurrency() -> usize {
    4
}

fn default_poll_interval() -> u64 {
    5
}

fn default_sweep_cron() -> String {
    // Every minute.
    "0 * * * * *".to_string()
}

fn default_cleanup_cron() -> String {
    // Daily at 02:00.
    "0 0 2 * * *".to_string()
}

fn default_sweep_batch_size() -> i64 {
    100
}

fn default_notification_retention_days() -> i64 {
    30
}
