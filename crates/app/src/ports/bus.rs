//! Message bus port — the core's view of the publish/subscribe bridge.

use std::future::Future;

use hearth_domain::device::SetCommand;
use hearth_domain::error::HearthError;
use hearth_domain::sample::DeviceReport;

/// An event arriving from the bridge, already decoded from the wire.
///
/// The adapter owning the broker connection translates raw messages into
/// these and feeds them to the control loop over a channel; malformed
/// payloads are dropped (and logged) before they get here.
#[derive(Debug, Clone, PartialEq)]
pub enum BusEvent {
    /// A per-device status report.
    Report {
        /// Friendly name extracted from the topic.
        device: String,
        report: DeviceReport,
    },
    /// The bridge announced it is online.
    BridgeConnected,
    /// The bridge connection dropped; the adapter keeps reconnecting with
    /// backoff in the background.
    BridgeDisconnected,
}

/// Outbound command port.
///
/// Implementations must bound the time a publish can take: a stalled broker
/// connection returns an error instead of blocking the control loop, which
/// retries on its next tick.
pub trait CommandBus: Send + Sync {
    /// Publish a `set` command to the device's command topic.
    fn publish_set(
        &self,
        device: &str,
        command: SetCommand,
    ) -> impl Future<Output = Result<(), HearthError>> + Send;
}
