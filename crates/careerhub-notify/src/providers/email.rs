//! SMTP email provider using lettre.

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::{debug, info};

use careerhub_core::config::providers::SmtpConfig;
use careerhub_core::error::{AppError, ErrorKind};
use careerhub_core::result::AppResult;
use careerhub_core::traits::provider::{ChannelProvider, DeliveryRequest};
use careerhub_core::types::NotificationChannel;

/// SMTP-backed email provider.
pub struct SmtpEmailProvider {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl SmtpEmailProvider {
    /// Create a new email provider from configuration.
    pub fn new(config: &SmtpConfig) -> AppResult<Self> {
        let transport = Self::build_transport(config)?;
        Ok(Self {
            transport,
            from_address: config.from_address.clone(),
        })
    }

    fn build_transport(
        config: &SmtpConfig,
    ) -> AppResult<AsyncSmtpTransport<Tokio1Executor>> {
        let mut builder = if config.use_starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host).map_err(|e| {
                AppError::with_source(
                    ErrorKind::Configuration,
                    format!("Failed to create SMTP relay for {}: {e}", config.host),
                    e,
                )
            })?
        } else {
            // Plaintext transport for local relays (Mailpit and friends).
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
        }
        .port(config.port);

        if !config.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ));
        }

        Ok(builder.build())
    }

    /// Build a lettre message from a delivery request.
    ///
    /// Address parse failures are permanent: retrying a malformed
    /// recipient can never succeed.
    fn build_message(&self, request: &DeliveryRequest) -> AppResult<Message> {
        let from: Mailbox = self
            .from_address
            .parse()
            .map_err(|e| AppError::provider(format!("Invalid from address: {e}")))?;
        let to: Mailbox = request
            .recipient
            .parse()
            .map_err(|e| AppError::provider(format!("Invalid recipient address: {e}")))?;

        let builder = Message::builder().from(from).to(to).subject(&request.title);

        let message = match &request.html_content {
            Some(html) => builder.multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(request.message.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html.clone()),
                    ),
            ),
            None => builder.body(request.message.clone()),
        }
        .map_err(|e| {
            AppError::with_source(ErrorKind::Internal, "Failed to build email message", e)
        })?;

        Ok(message)
    }
}

#[async_trait]
impl ChannelProvider for SmtpEmailProvider {
    fn channel(&self) -> NotificationChannel {
        NotificationChannel::Email
    }

    fn name(&self) -> &'static str {
        "smtp-email"
    }

    async fn send(&self, request: &DeliveryRequest) -> AppResult<()> {
        debug!(
            recipient = %request.recipient,
            title = %request.title,
            has_html = request.html_content.is_some(),
            "Sending email via SMTP"
        );

        let message = self.build_message(request)?;

        self.transport.send(message).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::ExternalService,
                format!("SMTP send failed: {e}"),
                e,
            )
        })?;

        info!(recipient = %request.recipient, "Email sent");
        Ok(())
    }
}
