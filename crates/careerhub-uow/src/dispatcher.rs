//! Event dispatcher with explicit handler registration.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error};

use careerhub_core::events::DomainEvent;
use careerhub_core::result::AppResult;
use careerhub_core::traits::events::{EventBus, EventHandler};

/// Routes published events to registered handlers by tag.
///
/// Handlers are registered explicitly at wiring time; there is no
/// scanning or reflection. Handlers for one tag run in registration
/// order. A failing handler does not stop the remaining handlers, but
/// the first error is returned to the publisher.
#[derive(Default)]
pub struct EventDispatcher {
    by_tag: HashMap<&'static str, Vec<Arc<dyn EventHandler>>>,
    catch_all: Vec<Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    /// Create an empty dispatcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under every tag it subscribes to.
    ///
    /// A handler with no subscribed tags receives every event.
    pub fn register(&mut self, handler: Arc<dyn EventHandler>) {
        let tags = handler.subscribed_tags();
        if tags.is_empty() {
            self.catch_all.push(handler);
            return;
        }
        for tag in tags {
            self.by_tag.entry(tag).or_default().push(Arc::clone(&handler));
        }
    }

    fn handlers_for(&self, tag: &str) -> impl Iterator<Item = &Arc<dyn EventHandler>> {
        self.by_tag
            .get(tag)
            .into_iter()
            .flatten()
            .chain(self.catch_all.iter())
    }
}

#[async_trait]
impl EventBus for EventDispatcher {
    async fn publish(&self, event: &DomainEvent) -> AppResult<()> {
        let tag = event.tag();
        debug!(tag, event_id = %event.id, "Publishing domain event");

        let mut first_error = None;
        for handler in self.handlers_for(tag) {
            if let Err(e) = handler.handle(event).await {
                error!(tag, error = %e, "Event handler failed");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
