//! Notification port — alert delivery with an external transport.

use std::future::Future;

use hearth_domain::error::HearthError;

/// Delivers alert notifications (email in the default deployment).
///
/// Callers treat failures as log-and-drop: alert state transitions happen
/// whether or not delivery succeeds, so a recovering transport does not get
/// hit with a retry storm.
pub trait Notifier: Send + Sync {
    /// Send one notification.
    fn send(
        &self,
        subject: &str,
        body: &str,
    ) -> impl Future<Output = Result<(), HearthError>> + Send;
}
