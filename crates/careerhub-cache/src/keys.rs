//! Key builders for all CareerHub key-value entries.
//!
//! Centralising key construction prevents typos and makes it easy
//! to find every key the application uses.

use uuid::Uuid;

/// Prefix applied to all CareerHub keys.
const PREFIX: &str = "careerhub";

// ── Lock keys ──────────────────────────────────────────────

/// Lock key guarding dispatch of a single notification.
pub fn dispatch_lock(notification_id: Uuid) -> String {
    format!("{PREFIX}:lock:dispatch:{notification_id}")
}

/// Lock key guarding the scheduled-notification promotion sweep.
pub fn sweep_lock() -> String {
    format!("{PREFIX}:lock:sweep")
}

/// Lock key guarding the retention cleanup sweep.
pub fn cleanup_lock() -> String {
    format!("{PREFIX}:lock:cleanup")
}

// ── Notification keys ──────────────────────────────────────

/// Key for a recipient's unread notification count.
pub fn unread_count(recipient: &str) -> String {
    format!("{PREFIX}:notif:unread:{recipient}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_lock_key() {
        let id = Uuid::nil();
        assert_eq!(
            dispatch_lock(id),
            "careerhub:lock:dispatch:00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn test_sweep_lock_key() {
        assert_eq!(sweep_lock(), "careerhub:lock:sweep");
    }
}
