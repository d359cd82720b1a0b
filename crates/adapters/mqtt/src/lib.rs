//! # hearth-adapter-mqtt
//!
//! Connects hearth to the device bridge's MQTT broker.
//!
//! ## Responsibilities
//! - Maintain the broker connection (rumqttc reconnects with backoff)
//! - Subscribe under the bridge's base topic and translate publishes into
//!   [`BusEvent`]s for the control loop
//! - Implement [`CommandBus`]: publish `set` commands to device topics
//!
//! ## Topic layout (zigbee2mqtt convention)
//! - `<base>/<name>` — per-device report, flat JSON
//! - `<base>/<name>/set` — command topic, written by us
//! - `<base>/bridge/state` — bridge availability (`online` / `offline`)
//!
//! Malformed payloads and topics outside the layout are logged and dropped
//! here; the control loop only ever sees decoded events.

use std::time::Duration;

use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use tokio::sync::mpsc;

use hearth_app::ports::{BusEvent, CommandBus};
use hearth_domain::device::SetCommand;
use hearth_domain::error::HearthError;
use hearth_domain::sample::DeviceReport;

mod config;
mod error;

pub use config::MqttConfig;
pub use error::MqttError;

/// Pending-request capacity of the rumqttc client channel.
const CLIENT_CAPACITY: usize = 64;
/// Pause before re-polling after a connection error.
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Handle to the broker connection. Cloneable; all clones share one
/// underlying client.
#[derive(Clone)]
pub struct MqttBridge {
    client: AsyncClient,
    base_topic: String,
    publish_timeout: Duration,
}

impl MqttBridge {
    /// Open the broker connection and spawn the event-loop task.
    ///
    /// The task translates incoming publishes into [`BusEvent`]s and pushes
    /// them to `events`; it exits when the receiving side is dropped.
    #[must_use]
    pub fn connect(config: &MqttConfig, events: mpsc::Sender<BusEvent>) -> Self {
        let mut options = MqttOptions::new(&config.client_id, &config.host, config.port);
        options.set_keep_alive(Duration::from_secs(u64::from(config.keep_alive_secs)));
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            options.set_credentials(username, password);
        }
        let (client, mut eventloop) = AsyncClient::new(options, CLIENT_CAPACITY);

        let base_topic = config.base_topic.clone();
        let subscriber = client.clone();
        let subscription = format!("{base_topic}/#");
        tokio::spawn(async move {
            loop {
                match eventloop.poll().await {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        tracing::info!("connected to broker");
                        // Resubscribe on every (re)connect.
                        if let Err(err) =
                            subscriber.subscribe(&subscription, QoS::AtMostOnce).await
                        {
                            tracing::error!(%err, "subscribe failed");
                        }
                    }
                    Ok(Event::Incoming(Packet::Publish(publish))) => {
                        let Some(event) =
                            decode_publish(&base_topic, &publish.topic, &publish.payload)
                        else {
                            continue;
                        };
                        if events.send(event).await.is_err() {
                            tracing::info!("event channel closed, stopping broker task");
                            return;
                        }
                    }
                    Ok(_) => {}
                    Err(err) => {
                        tracing::warn!(%err, "broker connection error, retrying");
                        if events.send(BusEvent::BridgeDisconnected).await.is_err() {
                            return;
                        }
                        tokio::time::sleep(RECONNECT_DELAY).await;
                    }
                }
            }
        });

        Self {
            client,
            base_topic: config.base_topic.clone(),
            publish_timeout: Duration::from_secs(u64::from(config.publish_timeout_secs)),
        }
    }
}

impl CommandBus for MqttBridge {
    async fn publish_set(&self, device: &str, command: SetCommand) -> Result<(), HearthError> {
        let topic = format!("{}/{device}/set", self.base_topic);
        let payload = serde_json::to_vec(&command).map_err(MqttError::PayloadEncode)?;
        tracing::debug!(%topic, "publishing command");
        let publish = self
            .client
            .publish(topic, QoS::AtMostOnce, false, payload);
        match tokio::time::timeout(self.publish_timeout, publish).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => Err(MqttError::Client(err).into()),
            Err(_) => Err(MqttError::PublishTimeout.into()),
        }
    }
}

/// Decode one raw publish into a bus event.
///
/// Returns `None` for topics outside the layout (command echoes, bridge
/// internals we do not model) and for malformed payloads.
fn decode_publish(base_topic: &str, topic: &str, payload: &[u8]) -> Option<BusEvent> {
    let suffix = topic.strip_prefix(base_topic)?.strip_prefix('/')?;
    if suffix == "bridge/state" {
        return decode_bridge_state(payload);
    }
    // Only bare `<base>/<name>` topics carry reports; `<name>/set` echoes
    // and `bridge/...` internals are skipped.
    if suffix.contains('/') || suffix.starts_with("bridge") {
        return None;
    }
    match serde_json::from_slice::<DeviceReport>(payload) {
        Ok(report) => Some(BusEvent::Report {
            device: suffix.to_string(),
            report,
        }),
        Err(err) => {
            tracing::warn!(%topic, %err, "dropping malformed report payload");
            None
        }
    }
}

/// The bridge publishes availability either as a bare string or as
/// `{"state": "online"}` depending on its version; accept both.
fn decode_bridge_state(payload: &[u8]) -> Option<BusEvent> {
    #[derive(serde::Deserialize)]
    struct BridgeState {
        state: String,
    }
    let text = match serde_json::from_slice::<BridgeState>(payload) {
        Ok(wrapped) => wrapped.state,
        Err(_) => String::from_utf8_lossy(payload).trim().to_string(),
    };
    match text.as_str() {
        "online" => Some(BusEvent::BridgeConnected),
        "offline" => Some(BusEvent::BridgeDisconnected),
        other => {
            tracing::warn!(state = %other, "unknown bridge state");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_domain::device::PowerState;

    #[test]
    fn should_decode_device_report() {
        let event = decode_publish(
            "zigbee2mqtt",
            "zigbee2mqtt/porch",
            br#"{"state": "ON", "linkquality": 87}"#,
        )
        .unwrap();
        match event {
            BusEvent::Report { device, report } => {
                assert_eq!(device, "porch");
                assert_eq!(report.state, Some(PowerState::On));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn should_skip_command_echoes_and_bridge_internals() {
        assert!(decode_publish("zigbee2mqtt", "zigbee2mqtt/porch/set", b"{}").is_none());
        assert!(decode_publish("zigbee2mqtt", "zigbee2mqtt/bridge/logging", b"{}").is_none());
        assert!(decode_publish("zigbee2mqtt", "otherprefix/porch", b"{}").is_none());
    }

    #[test]
    fn should_drop_malformed_payload() {
        assert!(decode_publish("zigbee2mqtt", "zigbee2mqtt/porch", b"not json").is_none());
    }

    #[test]
    fn should_decode_bridge_state_in_both_formats() {
        assert_eq!(
            decode_publish("zigbee2mqtt", "zigbee2mqtt/bridge/state", b"online"),
            Some(BusEvent::BridgeConnected)
        );
        assert_eq!(
            decode_publish(
                "zigbee2mqtt",
                "zigbee2mqtt/bridge/state",
                br#"{"state": "offline"}"#
            ),
            Some(BusEvent::BridgeDisconnected)
        );
        assert!(decode_publish("zigbee2mqtt", "zigbee2mqtt/bridge/state", b"rebooting").is_none());
    }

    #[test]
    fn should_keep_device_names_with_spaces() {
        let event = decode_publish(
            "zigbee2mqtt",
            "zigbee2mqtt/living room lamp",
            br#"{"state": "OFF"}"#,
        )
        .unwrap();
        match event {
            BusEvent::Report { device, .. } => assert_eq!(device, "living room lamp"),
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
