//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`HearthError`]
//! at the port boundary (adapters wrap their library errors into the `Bus`,
//! `Storage`, or `Notify` variants).

/// Top-level error crossing port boundaries.
#[derive(Debug, thiserror::Error)]
pub enum HearthError {
    /// A domain invariant was violated.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// A referenced object does not exist.
    #[error("not found")]
    NotFound(#[from] NotFoundError),

    /// The message bus (broker) failed or is unreachable.
    #[error("bus error")]
    Bus(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The sample store failed.
    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The notifier transport failed.
    #[error("notification error")]
    Notify(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The control loop is no longer running.
    #[error("control loop has shut down")]
    Shutdown,
}

/// Domain invariant violations.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// A device friendly name was empty.
    #[error("device name must not be empty")]
    EmptyName,

    /// Two configured devices share a friendly name.
    #[error("duplicate device name: {0}")]
    DuplicateName(String),

    /// Brightness outside the 0..=254 range accepted by the bridge.
    #[error("brightness {0} out of range (0..=254)")]
    BrightnessOutOfRange(u16),

    /// Latitude/longitude outside the valid range.
    #[error("invalid coordinates: lat={lat}, lon={lon}")]
    InvalidCoordinates { lat: f64, lon: f64 },

    /// A power state other than on/off.
    #[error("invalid power state: {0:?}")]
    InvalidPowerState(String),

    /// A time-of-day string could not be parsed.
    #[error("invalid time of day: {0:?}")]
    InvalidTimeOfDay(String),

    /// An unknown trigger mode keyword.
    #[error("invalid trigger mode: {0:?}")]
    InvalidTriggerMode(String),
}

/// A referenced object does not exist.
#[derive(Debug, thiserror::Error)]
#[error("{entity} not found: {name}")]
pub struct NotFoundError {
    /// The kind of object looked up (e.g. `"Device"`).
    pub entity: &'static str,
    /// The identifier that missed.
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_display_duplicate_name() {
        let err = ValidationError::DuplicateName("porch".into());
        assert_eq!(err.to_string(), "duplicate device name: porch");
    }

    #[test]
    fn should_convert_validation_into_hearth_error() {
        let err: HearthError = ValidationError::EmptyName.into();
        assert!(matches!(err, HearthError::Validation(_)));
    }

    #[test]
    fn should_display_not_found() {
        let err = NotFoundError {
            entity: "Device",
            name: "porch".into(),
        };
        assert_eq!(err.to_string(), "Device not found: porch");
    }
}
