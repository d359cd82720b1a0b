//! Time and timestamp helpers.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, FixedOffset, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// UTC timestamp used for `last_seen`, sample times, trigger times, etc.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// A wall-clock time of day (`HH:MM`), used for fixed schedule triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay {
    hour: u32,
    minute: u32,
}

impl TimeOfDay {
    pub const MIDNIGHT: Self = Self { hour: 0, minute: 0 };
    pub const LAST_MINUTE: Self = Self {
        hour: 23,
        minute: 59,
    };

    /// Build a time of day, rejecting out-of-range components.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidTimeOfDay`] when `hour >= 24` or
    /// `minute >= 60`.
    pub fn new(hour: u32, minute: u32) -> Result<Self, ValidationError> {
        if hour >= 24 || minute >= 60 {
            return Err(ValidationError::InvalidTimeOfDay(format!(
                "{hour}:{minute:02}"
            )));
        }
        Ok(Self { hour, minute })
    }

    #[must_use]
    pub fn hour(self) -> u32 {
        self.hour
    }

    #[must_use]
    pub fn minute(self) -> u32 {
        self.minute
    }

    /// The next UTC instant at which this local wall-clock time occurs,
    /// strictly after `now`.
    ///
    /// Today's occurrence is used when it is still ahead; otherwise
    /// tomorrow's. Matches the home convention of "23:59 means tonight".
    #[must_use]
    pub fn next_after(self, now: Timestamp, offset: FixedOffset) -> Timestamp {
        let local_now = now.with_timezone(&offset);
        let time = NaiveTime::from_hms_opt(self.hour, self.minute, 0)
            .unwrap_or(NaiveTime::MIN);
        let mut candidate = local_now.date_naive().and_time(time);
        let mut resolved = resolve_local(offset, candidate);
        if resolved <= now {
            candidate += Duration::days(1);
            resolved = resolve_local(offset, candidate);
        }
        resolved
    }
}

/// Map a naive local datetime onto UTC through a fixed offset.
///
/// A fixed offset has no gaps or folds, so the conversion is exact.
fn resolve_local(offset: FixedOffset, local: chrono::NaiveDateTime) -> Timestamp {
    let utc_naive = local - Duration::seconds(i64::from(offset.local_minus_utc()));
    Utc.from_utc_datetime(&utc_naive)
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for TimeOfDay {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (h, m) = s
            .split_once(':')
            .ok_or_else(|| ValidationError::InvalidTimeOfDay(s.to_string()))?;
        let hour = h
            .parse()
            .map_err(|_| ValidationError::InvalidTimeOfDay(s.to_string()))?;
        let minute = m
            .parse()
            .map_err(|_| ValidationError::InvalidTimeOfDay(s.to_string()))?;
        Self::new(hour, minute)
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeOfDay> for String {
    fn from(value: TimeOfDay) -> Self {
        value.to_string()
    }
}
