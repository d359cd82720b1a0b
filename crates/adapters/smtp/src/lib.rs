//! # hearth-adapter-smtp
//!
//! Delivers alert notifications as plain-text emails through an SMTP relay.
//!
//! Uses lettre's blocking transport on the blocking thread pool; a home
//! deployment talks to a relay on the local network, so plaintext SMTP with
//! optional credentials covers it. The [`Notifier`] contract is log-and-drop
//! on failure, so nothing here retries.
//!
//! ## Dependency rule
//! Depends on `hearth-app` (for the port trait) and `hearth-domain`.

use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

use hearth_app::ports::Notifier;
use hearth_domain::error::HearthError;

mod config;
mod error;

pub use config::SmtpConfig;
pub use error::SmtpError;

/// SMTP-backed notifier. `None` transport means delivery is disabled.
#[derive(Clone)]
pub struct SmtpNotifier {
    inner: Option<Inner>,
}

#[derive(Clone)]
struct Inner {
    transport: SmtpTransport,
    from: Mailbox,
    to: Mailbox,
}

impl SmtpNotifier {
    /// Build the notifier from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SmtpError::Address`] when a configured address does not
    /// parse. A disabled configuration (empty recipient) always succeeds.
    pub fn new(config: &SmtpConfig) -> Result<Self, SmtpError> {
        if !config.is_enabled() {
            tracing::info!("no recipient configured, notifications disabled");
            return Ok(Self { inner: None });
        }
        let mut builder = SmtpTransport::builder_dangerous(&config.host).port(config.port);
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }
        Ok(Self {
            inner: Some(Inner {
                transport: builder.build(),
                from: config.from.parse()?,
                to: config.to.parse()?,
            }),
        })
    }
}

impl Notifier for SmtpNotifier {
    async fn send(&self, subject: &str, body: &str) -> Result<(), HearthError> {
        let Some(inner) = self.inner.clone() else {
            tracing::debug!(%subject, "notification skipped, delivery disabled");
            return Ok(());
        };
        let message = Message::builder()
            .from(inner.from)
            .to(inner.to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(SmtpError::Build)?;
        // The blocking transport holds a connection pool; hand the send to
        // the blocking thread pool so the control loop is never parked on
        // socket I/O.
        let subject = subject.to_string();
        tokio::task::spawn_blocking(move || {
            inner.transport.send(&message).map_err(SmtpError::Transport)
        })
        .await
        .map_err(SmtpError::TaskJoin)??;
        tracing::info!(%subject, "notification sent");
        Ok(())
    }
}
