//! Notification status enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    /// Created and waiting for dispatch.
    Pending,
    /// Scheduled for future delivery; not yet enqueued.
    Scheduled,
    /// Successfully delivered to the channel provider.
    Sent,
    /// Delivered and acknowledged by the recipient.
    Read,
    /// Delivery failed after all retry attempts.
    Failed,
}

impl NotificationStatus {
    /// Check if the notification is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Sent | Self::Read | Self::Failed)
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Scheduled => "scheduled",
            Self::Sent => "sent",
            Self::Read => "read",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for NotificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(NotificationStatus::Sent.is_terminal());
        assert!(NotificationStatus::Read.is_terminal());
        assert!(NotificationStatus::Failed.is_terminal());
        assert!(!NotificationStatus::Pending.is_terminal());
        assert!(!NotificationStatus::Scheduled.is_terminal());
    }
}
