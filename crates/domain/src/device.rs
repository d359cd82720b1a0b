//! Devices — bulbs, outlets, and sensors addressed by friendly name.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::time::Timestamp;

/// What kind of device this is. Dispatch is by explicit matching on this
/// tag plus the capability flags, never by trait objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Bulb,
    Outlet,
    Sensor,
}

impl std::fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bulb => f.write_str("bulb"),
            Self::Outlet => f.write_str("outlet"),
            Self::Sensor => f.write_str("sensor"),
        }
    }
}

/// Capability flags derived from the device kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Accepts `{"state": ...}` set commands.
    pub switchable: bool,
    /// Accepts `{"brightness": ...}` set commands.
    pub dimmable: bool,
    /// Reports metric readings (temperature, humidity, ...).
    pub reports_metrics: bool,
}

impl Capabilities {
    #[must_use]
    pub fn for_kind(kind: DeviceKind) -> Self {
        match kind {
            DeviceKind::Bulb => Self {
                switchable: true,
                dimmable: true,
                reports_metrics: false,
            },
            DeviceKind::Outlet => Self {
                switchable: true,
                dimmable: false,
                reports_metrics: false,
            },
            DeviceKind::Sensor => Self {
                switchable: false,
                dimmable: false,
                reports_metrics: true,
            },
        }
    }
}

/// Discrete power state of a switchable device.
///
/// Serialized uppercase to match the bridge wire format (`"ON"`/`"OFF"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PowerState {
    On,
    Off,
    #[default]
    Unknown,
}

impl std::fmt::Display for PowerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::On => f.write_str("on"),
            Self::Off => f.write_str("off"),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}

impl std::str::FromStr for PowerState {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "on" => Ok(Self::On),
            "off" => Ok(Self::Off),
            _ => Err(()),
        }
    }
}

/// A configured device with its last-known and desired state.
///
/// Devices are created from configuration at startup; the set never grows at
/// runtime, which bounds memory against foreign traffic on the bus.
#[derive(Debug, Clone, Serialize)]
pub struct Device {
    /// Unique human-assigned friendly name, also the bridge topic segment.
    pub name: String,
    pub kind: DeviceKind,
    pub capabilities: Capabilities,
    /// Last state confirmation received from the bus.
    pub observed: PowerState,
    /// State of the command most recently issued, applied optimistically.
    pub desired: Option<PowerState>,
    /// When the desired state was last published without confirmation yet.
    pub pending_since: Option<Timestamp>,
    /// Last time any message arrived for this device.
    pub last_seen: Option<Timestamp>,
    /// Cleared when desired and observed state diverge past the
    /// reconciliation timeout.
    pub reachable: bool,
}

impl Device {
    /// Create a device in the unknown state.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyName`] for an empty friendly name.
    pub fn new(name: impl Into<String>, kind: DeviceKind) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        Ok(Self {
            name,
            kind,
            capabilities: Capabilities::for_kind(kind),
            observed: PowerState::Unknown,
            desired: None,
            pending_since: None,
            last_seen: None,
            reachable: true,
        })
    }

    /// Record a state confirmation observed on the bus.
    ///
    /// Confirmation of the desired state closes the reconciliation window
    /// and restores reachability.
    pub fn observe(&mut self, state: PowerState, at: Timestamp) {
        self.observed = state;
        self.last_seen = Some(at);
        self.reachable = true;
        if self.desired == Some(state) {
            self.pending_since = None;
        }
    }

    /// Record bus traffic that carried no power state (e.g. a sensor report).
    pub fn touch(&mut self, at: Timestamp) {
        self.last_seen = Some(at);
        self.reachable = true;
    }

    /// Apply a desired state optimistically after publishing a command.
    pub fn set_desired(&mut self, state: PowerState, at: Timestamp) {
        self.desired = Some(state);
        if self.observed != state {
            self.pending_since = Some(at);
        }
    }

    /// Whether desired and observed state have diverged longer than `timeout`.
    #[must_use]
    pub fn is_stale(&self, now: Timestamp, timeout: chrono::Duration) -> bool {
        self.pending_since
            .is_some_and(|since| now - since > timeout)
    }

    /// The state to report outward: desired while pending, observed otherwise.
    #[must_use]
    pub fn effective_state(&self) -> PowerState {
        if self.pending_since.is_some() {
            self.desired.unwrap_or(self.observed)
        } else {
            self.observed
        }
    }
}

/// Payload published to `<prefix>/<name>/set`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetCommand {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<PowerState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brightness: Option<u8>,
}

impl SetCommand {
    #[must_use]
    pub fn power(state: PowerState) -> Self {
        Self {
            state: Some(state),
            brightness: None,
        }
    }

    #[must_use]
    pub fn brightness(value: u8) -> Self {
        Self {
            state: None,
            brightness: Some(value),
        }
    }
}
