//! SMTP notifier configuration.

use serde::Deserialize;

/// Configuration for alert email delivery.
///
/// An empty `to` address disables delivery entirely; the notifier becomes a
/// no-op so the rest of the system runs unchanged without a mail setup.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SmtpConfig {
    /// SMTP relay hostname.
    pub host: String,
    /// SMTP relay port.
    pub port: u16,
    /// Sender address.
    pub from: String,
    /// Recipient address; empty disables notifications.
    pub to: String,
    /// Optional relay username.
    pub username: Option<String>,
    /// Optional relay password.
    pub password: Option<String>,
}

impl SmtpConfig {
    /// Whether delivery is configured at all.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        !self.to.trim().is_empty()
    }
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 25,
            from: "hearth@localhost".to_string(),
            to: String::new(),
            username: None,
            password: None,
        }
    }
}
