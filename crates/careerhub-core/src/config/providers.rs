//! Delivery provider configuration.

use serde::{Deserialize, Serialize};

/// Top-level delivery provider configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvidersConfig {
    /// SMTP email provider settings.
    #[serde(default)]
    pub smtp: SmtpConfig,
    /// SMS gateway settings.
    #[serde(default)]
    pub sms: SmsConfig,
    /// Push gateway settings.
    #[serde(default)]
    pub push: PushConfig,
}

/// SMTP email provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    /// SMTP relay hostname.
    #[serde(default = "default_smtp_host")]
    pub host: String,
    /// SMTP relay port.
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    /// SMTP username. Empty disables authentication.
    #[serde(default)]
    pub username: String,
    /// SMTP password.
    #[serde(default)]
    pub password: String,
    /// Sender address used in the `From` header.
    #[serde(default = "default_from_address")]
    pub from_address: String,
    /// Whether to negotiate STARTTLS with the relay.
    #[serde(default = "default_true")]
    pub use_starttls: bool,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: default_smtp_host(),
            port: default_smtp_port(),
            username: String::new(),
            password: String::new(),
            from_address: default_from_address(),
            use_starttls: default_true(),
        }
    }
}

/// SMS gateway configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SmsConfig {
    /// Gateway endpoint URL. Empty disables the provider.
    #[serde(default)]
    pub gateway_url: String,
    /// Gateway API key.
    #[serde(default)]
    pub api_key: String,
    /// Sender identifier.
    #[serde(default)]
    pub sender_id: String,
}

/// Push gateway configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PushConfig {
    /// Gateway endpoint URL. Empty disables the provider.
    #[serde(default)]
    pub gateway_url: String,
    /// Gateway API key.
    #[serde(default)]
    pub api_key: String,
}

fn default_smtp_host() -> String {
    "localhost".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_from_address() -> String {
    "no-reply@careerhub.local".to_string()
}

fn default_true() -> bool {
    true
}
