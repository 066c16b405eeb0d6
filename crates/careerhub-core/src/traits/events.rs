//! Event bus and handler traits.

use async_trait::async_trait;

use crate::events::DomainEvent;
use crate::result::AppResult;

/// A subscriber invoked when a matching domain event is published.
#[async_trait]
pub trait EventHandler: Send + Sync + 'static {
    /// The routing tags this handler subscribes to. An empty slice
    /// subscribes to every event.
    fn subscribed_tags(&self) -> &[&'static str];

    /// Handle a single event.
    async fn handle(&self, event: &DomainEvent) -> AppResult<()>;
}

/// Publishes domain events to registered handlers.
#[async_trait]
pub trait EventBus: Send + Sync + 'static {
    /// Publish one event to all matching handlers.
    ///
    /// Returns an error if any handler fails; handlers after the failing
    /// one are still invoked.
    async fn publish(&self, event: &DomainEvent) -> AppResult<()>;
}
