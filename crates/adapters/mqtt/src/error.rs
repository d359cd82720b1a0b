//! MQTT adapter error types.

use hearth_domain::error::HearthError;

/// Errors specific to the MQTT adapter.
#[derive(Debug, thiserror::Error)]
pub enum MqttError {
    /// The rumqttc client returned an error.
    #[error("MQTT client error")]
    Client(#[source] rumqttc::ClientError),

    /// A publish did not complete within the configured bound.
    #[error("MQTT publish timed out")]
    PublishTimeout,

    /// Failed to encode an outgoing command payload.
    #[error("failed to encode MQTT payload")]
    PayloadEncode(#[source] serde_json::Error),
}

impl MqttError {
    /// Convert into a [`HearthError::Bus`] for propagation across the port
    /// boundary.
    #[must_use]
    pub fn into_domain(self) -> HearthError {
        HearthError::Bus(Box::new(self))
    }
}

impl From<MqttError> for HearthError {
    fn from(err: MqttError) -> Self {
        err.into_domain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_display_publish_timeout() {
        let err = MqttError::PublishTimeout;
        assert_eq!(err.to_string(), "MQTT publish timed out");
    }

    #[test]
    fn should_convert_to_bus_error() {
        let err: HearthError = MqttError::PublishTimeout.into();
        assert!(matches!(err, HearthError::Bus(_)));
    }
}
