//! In-process websocket delivery.
//!
//! The hub keeps one channel per connected recipient. The transport
//! layer (outside this subsystem) registers a sender when a recipient
//! connects and unregisters it on disconnect; delivery to a recipient
//! without a live connection fails and is retried like any other
//! transient provider failure.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{debug, info};

use careerhub_core::error::AppError;
use careerhub_core::result::AppResult;
use careerhub_core::traits::provider::{ChannelProvider, DeliveryRequest};
use careerhub_core::types::NotificationChannel;

/// Registry of live websocket connections keyed by recipient.
#[derive(Debug, Default)]
pub struct WebsocketHub {
    connections: DashMap<String, mpsc::UnboundedSender<String>>,
}

impl WebsocketHub {
    /// Create a new empty hub.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a recipient's connection. Replaces any previous one.
    pub fn register(&self, recipient: &str, sender: mpsc::UnboundedSender<String>) {
        self.connections.insert(recipient.to_string(), sender);
        debug!(recipient, "Websocket connection registered");
    }

    /// Unregister a recipient's connection.
    pub fn unregister(&self, recipient: &str) {
        self.connections.remove(recipient);
        debug!(recipient, "Websocket connection unregistered");
    }

    /// Whether a recipient currently has a live connection.
    pub fn is_connected(&self, recipient: &str) -> bool {
        self.connections.contains_key(recipient)
    }

    /// Send a message to a connected recipient.
    pub fn send(&self, recipient: &str, message: String) -> AppResult<()> {
        let Some(conn) = self.connections.get(recipient) else {
            return Err(AppError::external_service(format!(
                "No live websocket connection for recipient '{recipient}'"
            )));
        };

        if conn.send(message).is_err() {
            // Receiver dropped without unregistering; clean up.
            drop(conn);
            self.connections.remove(recipient);
            return Err(AppError::external_service(format!(
                "Websocket connection for '{recipient}' is closed"
            )));
        }
        Ok(())
    }
}

/// Websocket channel provider over the hub.
#[derive(Debug, Clone)]
pub struct WebsocketProvider {
    hub: Arc<WebsocketHub>,
}

impl WebsocketProvider {
    /// Create a new websocket provider.
    pub fn new(hub: Arc<WebsocketHub>) -> Self {
        Self { hub }
    }
}

#[async_trait]
impl ChannelProvider for WebsocketProvider {
    fn channel(&self) -> NotificationChannel {
        NotificationChannel::Websocket
    }

    fn name(&self) -> &'static str {
        "websocket-hub"
    }

    async fn send(&self, request: &DeliveryRequest) -> AppResult<()> {
        let envelope = json!({
            "title": request.title,
            "message": request.message,
            "metadata": request.metadata,
            "notificationId": request.notification_id,
        });

        self.hub.send(&request.recipient, envelope.to_string())?;
        info!(recipient = %request.recipient, "Websocket notification delivered");
        Ok(())
    }
}
