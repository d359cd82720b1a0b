//! MQTT broker configuration.

use serde::Deserialize;

/// Configuration for the broker connection.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    /// Broker hostname or IP address.
    pub host: String,
    /// Broker port.
    pub port: u16,
    /// MQTT client identifier.
    pub client_id: String,
    /// Topic prefix the bridge publishes device reports under.
    pub base_topic: String,
    /// Optional broker username.
    pub username: Option<String>,
    /// Optional broker password.
    pub password: Option<String>,
    /// Keep-alive interval in seconds.
    pub keep_alive_secs: u16,
    /// Upper bound on a single publish, in seconds. A stalled broker
    /// connection fails the publish instead of blocking the caller.
    pub publish_timeout_secs: u16,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 1883,
            client_id: "hearth".to_string(),
            base_topic: "zigbee2mqtt".to_string(),
            username: None,
            password: None,
            keep_alive_secs: 30,
            publish_timeout_secs: 5,
        }
    }
}
