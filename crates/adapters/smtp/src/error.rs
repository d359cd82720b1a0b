//! SMTP adapter error types.

use hearth_domain::error::HearthError;

/// Errors specific to the SMTP notifier.
#[derive(Debug, thiserror::Error)]
pub enum SmtpError {
    /// A configured address could not be parsed.
    #[error("invalid email address")]
    Address(#[from] lettre::address::AddressError),

    /// Building the message failed.
    #[error("failed to build email")]
    Build(#[from] lettre::error::Error),

    /// The relay rejected or never received the message.
    #[error("SMTP transport error")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The blocking send task was cancelled.
    #[error("send task failed")]
    TaskJoin(#[from] tokio::task::JoinError),
}

impl From<SmtpError> for HearthError {
    fn from(err: SmtpError) -> Self {
        Self::Notify(Box::new(err))
    }
}
