//! Push provider over an HTTP gateway (FCM-style payload).

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info};

use careerhub_core::config::providers::PushConfig;
use careerhub_core::error::{AppError, ErrorKind};
use careerhub_core::result::AppResult;
use careerhub_core::traits::provider::{ChannelProvider, DeliveryRequest};
use careerhub_core::types::NotificationChannel;

/// Push notification provider posting to a gateway endpoint.
#[derive(Debug, Clone)]
pub struct PushProvider {
    client: reqwest::Client,
    gateway_url: String,
    api_key: String,
}

impl PushProvider {
    /// Create a new push provider from configuration.
    pub fn new(config: &PushConfig) -> AppResult<Self> {
        if config.gateway_url.is_empty() {
            return Err(AppError::configuration(
                "Push gateway URL is not configured",
            ));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            gateway_url: config.gateway_url.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl ChannelProvider for PushProvider {
    fn channel(&self) -> NotificationChannel {
        NotificationChannel::Push
    }

    fn name(&self) -> &'static str {
        "push-gateway"
    }

    async fn send(&self, request: &DeliveryRequest) -> AppResult<()> {
        debug!(recipient = %request.recipient, "Sending push via gateway");

        let body = json!({
            "to": request.recipient,
            "notification": {
                "title": request.title,
                "body": request.message,
            },
            "data": request.metadata,
        });

        let response = self
            .client
            .post(&self.gateway_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::ExternalService,
                    format!("Push gateway request failed: {e}"),
                    e,
                )
            })?;

        let status = response.status();
        if status.is_client_error() {
            return Err(AppError::provider(format!(
                "Push gateway rejected request: {status}"
            )));
        }
        if !status.is_success() {
            return Err(AppError::external_service(format!(
                "Push gateway returned {status}"
            )));
        }

        info!(recipient = %request.recipient, "Push notification sent");
        Ok(())
    }
}
