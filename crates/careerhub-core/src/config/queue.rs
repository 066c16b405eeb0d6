//! Notification queue configuration.

use serde::{Deserialize, Serialize};

/// Notification queue configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Maximum number of delivery attempts per job.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Base delay in milliseconds for exponential retry backoff.
    /// Attempt `n` is retried after `backoff_base_ms * 2^(n-1)`.
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    /// How long completed jobs are retained, in seconds.
    #[serde(default = "default_completed_retention")]
    pub completed_retention_seconds: u64,
    /// Maximum number of completed jobs retained regardless of age.
    #[serde(default = "default_completed_retention_count")]
    pub completed_retention_count: u64,
    /// How long failed jobs are retained, in seconds.
    #[serde(default = "default_failed_retention")]
    pub failed_retention_seconds: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base_ms(),
            completed_retention_seconds: default_completed_retention(),
            completed_retention_count: default_completed_retention_count(),
            failed_retention_seconds: default_failed_retention(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_base_ms() -> u64 {
    2000
}

fn default_completed_retention() -> u64 {
    3600
}

fn default_completed_retention_count() -> u64 {
    1000
}

fn default_failed_retention() -> u64 {
    86400
}
