//! SMS provider over an HTTP gateway.

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info};

use careerhub_core::config::providers::SmsConfig;
use careerhub_core::error::{AppError, ErrorKind};
use careerhub_core::result::AppResult;
use careerhub_core::traits::provider::{ChannelProvider, DeliveryRequest};
use careerhub_core::types::NotificationChannel;

/// SMS provider posting to a gateway endpoint.
#[derive(Debug, Clone)]
pub struct SmsProvider {
    client: reqwest::Client,
    gateway_url: String,
    api_key: String,
    sender_id: String,
}

impl SmsProvider {
    /// Create a new SMS provider from configuration.
    pub fn new(config: &SmsConfig) -> AppResult<Self> {
        if config.gateway_url.is_empty() {
            return Err(AppError::configuration("SMS gateway URL is not configured"));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            gateway_url: config.gateway_url.clone(),
            api_key: config.api_key.clone(),
            sender_id: config.sender_id.clone(),
        })
    }
}

#[async_trait]
impl ChannelProvider for SmsProvider {
    fn channel(&self) -> NotificationChannel {
        NotificationChannel::Sms
    }

    fn name(&self) -> &'static str {
        "sms-gateway"
    }

    async fn send(&self, request: &DeliveryRequest) -> AppResult<()> {
        debug!(recipient = %request.recipient, "Sending SMS via gateway");

        let body = json!({
            "to": request.recipient,
            "message": format!("{}: {}", request.title, request.message),
            "senderId": self.sender_id,
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
                    format!("SMS gateway request failed: {e}"),
                    e,
                )
            })?;

        let status = response.status();
        if status.is_client_error() {
            // The gateway rejected the request itself; a retry with the
            // same payload cannot succeed.
            return Err(AppError::provider(format!(
                "SMS gateway rejected request: {status}"
            )));
        }
        if !status.is_success() {
            return Err(AppError::external_service(format!(
                "SMS gateway returned {status}"
            )));
        }

        info!(recipient = %request.recipient, "SMS sent");
        Ok(())
    }
}
