//! Routing from notification channel to delivery provider.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use careerhub_core::error::AppError;
use careerhub_core::result::AppResult;
use careerhub_core::traits::provider::ChannelProvider;
use careerhub_core::types::NotificationChannel;

/// Maps each notification channel to its registered provider.
///
/// Routing a channel with no provider is a permanent error: the job
/// processor fails such deliveries without retrying.
#[derive(Default)]
pub struct ProviderRouter {
    providers: HashMap<NotificationChannel, Arc<dyn ChannelProvider>>,
}

impl ProviderRouter {
    /// Create an empty router.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider for its channel. Replaces any previous one.
    pub fn register(&mut self, provider: Arc<dyn ChannelProvider>) {
        info!(
            channel = %provider.channel(),
            provider = provider.name(),
            "Registered channel provider"
        );
        self.providers.insert(provider.channel(), provider);
    }

    /// Resolve the provider for a channel.
    pub fn route(&self, channel: NotificationChannel) -> AppResult<Arc<dyn ChannelProvider>> {
        self.providers.get(&channel).cloned().ok_or_else(|| {
            AppError::provider(format!("Unsupported notification channel: {channel}"))
        })
    }

    /// Channels with a registered provider.
    pub fn supported_channels(&self) -> Vec<NotificationChannel> {
        self.providers.keys().copied().collect()
    }
}
