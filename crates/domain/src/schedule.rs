//! Schedule triggers — fixed wall-clock or sun-relative daily transitions.

use std::str::FromStr;

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use crate::device::PowerState;
use crate::error::ValidationError;
use crate::solar::SunTimes;
use crate::time::{TimeOfDay, Timestamp};

/// A switchable device group driven by one on/off timer pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceGroup {
    Bulbs,
    Outlets,
}

impl DeviceGroup {
    pub const ALL: [Self; 2] = [Self::Bulbs, Self::Outlets];
}

impl std::fmt::Display for DeviceGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bulbs => f.write_str("bulbs"),
            Self::Outlets => f.write_str("outlets"),
        }
    }
}

/// When a transition should fire each day.
///
/// Parsed from configuration and API strings: `"dusk"`, `"dawn"`, or a fixed
/// `"HH:MM"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TriggerMode {
    Fixed(TimeOfDay),
    Dusk,
    Dawn,
}

impl TriggerMode {
    /// Resolve the next occurrence strictly after `now`.
    ///
    /// Sun-relative modes pick today's solar time when still ahead,
    /// otherwise tomorrow's; `sun` must hold both days for that reason.
    #[must_use]
    pub fn next_after(
        self,
        now: Timestamp,
        offset: FixedOffset,
        today: &SunTimes,
        tomorrow: &SunTimes,
    ) -> Timestamp {
        match self {
            Self::Fixed(time) => time.next_after(now, offset),
            Self::Dusk => {
                if today.dusk > now {
                    today.dusk
                } else {
                    tomorrow.dusk
                }
            }
            Self::Dawn => {
                if today.dawn > now {
                    today.dawn
                } else {
                    tomorrow.dawn
                }
            }
        }
    }
}

impl std::fmt::Display for TriggerMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fixed(time) => time.fmt(f),
            Self::Dusk => f.write_str("dusk"),
            Self::Dawn => f.write_str("dawn"),
        }
    }
}

impl FromStr for TriggerMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dusk" => Ok(Self::Dusk),
            "dawn" => Ok(Self::Dawn),
            other if other.contains(':') => Ok(Self::Fixed(other.parse()?)),
            other => Err(ValidationError::InvalidTriggerMode(other.to_string())),
        }
    }
}

impl TryFrom<String> for TriggerMode {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TriggerMode> for String {
    fn from(value: TriggerMode) -> Self {
        value.to_string()
    }
}

/// A queued daily transition: switch one group on or off.
///
/// Instances are owned exclusively by the scheduler and replaced, never
/// mutated, on each firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScheduledEvent {
    pub group: DeviceGroup,
    pub action: PowerState,
    pub mode: TriggerMode,
    pub trigger_time: Timestamp,
}
