//! Notification delivery channel enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A delivery medium for a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_channel", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NotificationChannel {
    /// Email delivery (SMTP).
    Email,
    /// SMS delivery via an HTTP gateway.
    Sms,
    /// In-app delivery over a live websocket connection.
    Websocket,
    /// Mobile/desktop push delivery via an HTTP gateway.
    Push,
}

impl NotificationChannel {
    /// Return the channel as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Sms => "sms",
            Self::Websocket => "websocket",
            Self::Push => "push",
        }
    }
}

impl fmt::Display for NotificationChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
