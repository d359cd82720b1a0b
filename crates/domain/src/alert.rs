//! Alert rules and the flood-suppression state machine.
//!
//! Continuous metrics (temperature, humidity) use a latch with a recovery
//! margin: once a rule fires it stays active, and no further notification is
//! produced until the value re-enters the recovery band. A per-rule cooldown
//! additionally suppresses the notification of a fresh crossing that follows
//! the last fired one too closely — the latch still sets, so state remains
//! truthful even when the notification is swallowed.
//!
//! Binary alarms (water leak, low battery) are discrete signals and bypass
//! all of this: single-fire on `false → true`, auto-clear on `true → false`.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::sample::Metric;
use crate::time::Timestamp;

/// Default recovery margin for temperature rules, in °C.
pub const TEMPERATURE_MARGIN: f64 = 1.0;
/// Default recovery margin for humidity rules, in %RH.
pub const HUMIDITY_MARGIN: f64 = 2.0;

/// Which side of the threshold is alarming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparator {
    /// Alarm when the value falls below the threshold.
    Below,
    /// Alarm when the value rises above the threshold.
    Above,
}

/// A threshold rule over one continuous metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRule {
    /// Stable human-readable rule name, used in notification subjects.
    pub name: String,
    pub metric: Metric,
    pub comparator: Comparator,
    pub threshold: f64,
    /// Width of the recovery band beyond the threshold.
    pub margin: f64,
    /// Minimum gap between two fired notifications, in seconds.
    pub cooldown_secs: i64,
}

impl AlertRule {
    /// Whether `value` is on the alarming side of the threshold.
    #[must_use]
    pub fn is_breached(&self, value: f64) -> bool {
        match self.comparator {
            Comparator::Below => value < self.threshold,
            Comparator::Above => value > self.threshold,
        }
    }

    /// Whether `value` is back inside the recovery band. The band edge
    /// itself recovers: threshold 10.0 with margin 1.0 clears at exactly
    /// 11.0.
    #[must_use]
    pub fn is_recovered(&self, value: f64) -> bool {
        match self.comparator {
            Comparator::Below => value >= self.threshold + self.margin,
            Comparator::Above => value <= self.threshold - self.margin,
        }
    }
}

/// Mutable evaluation state kept per rule.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RuleState {
    pub active: bool,
    pub last_fired_at: Option<Timestamp>,
}

/// Outcome of feeding one sample through a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Threshold crossed; a notification should be dispatched.
    Fired,
    /// Threshold crossed within the cooldown window; latch set, no
    /// notification.
    FiredSuppressed,
    /// Value re-entered the recovery band; a recovery notification should be
    /// dispatched.
    Cleared,
}

impl RuleState {
    /// Feed one value through the rule.
    ///
    /// Values between the threshold and the recovery band leave the latch
    /// untouched in either direction (hysteresis).
    pub fn evaluate(
        &mut self,
        rule: &AlertRule,
        value: f64,
        now: Timestamp,
    ) -> Option<Transition> {
        if !self.active && rule.is_breached(value) {
            self.active = true;
            let in_cooldown = self.last_fired_at.is_some_and(|fired| {
                now - fired < Duration::seconds(rule.cooldown_secs)
            });
            if in_cooldown {
                return Some(Transition::FiredSuppressed);
            }
            self.last_fired_at = Some(now);
            return Some(Transition::Fired);
        }
        if self.active && rule.is_recovered(value) {
            self.active = false;
            return Some(Transition::Cleared);
        }
        None
    }
}

/// Latch for a binary alarm signal — no hysteresis, no cooldown.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlarmLatch {
    pub active: bool,
}

/// Outcome of feeding a binary alarm flag through a latch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmTransition {
    Raised,
    Cleared,
}

impl AlarmLatch {
    /// Feed one reading; transitions only on edges.
    pub fn update(&mut self, reading: bool) -> Option<AlarmTransition> {
        match (self.active, reading) {
            (false, true) => {
                self.active = true;
                Some(AlarmTransition::Raised)
            }
            (true, false) => {
                self.active = false;
                Some(AlarmTransition::Cleared)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn low_temp_rule() -> AlertRule {
        AlertRule {
            name: "low temperature".into(),
            metric: Metric::Temperature,
            comparator: Comparator::Below,
            threshold: 10.0,
            margin: TEMPERATURE_MARGIN,
            cooldown_secs: 600,
        }
    }

    fn at(minute: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2024, 1, 15, 8, minute, 0).unwrap()
    }

    #[test]
    fn should_fire_once_and_recover_once_for_dip_sequence() {
        // 12.0, 9.5, 8.0, 11.0 against a 10.0 threshold produces exactly
        // one alert and one recovery.
        let rule = low_temp_rule();
        let mut state = RuleState::default();
        assert_eq!(state.evaluate(&rule, 12.0, at(0)), None);
        assert_eq!(state.evaluate(&rule, 9.5, at(1)), Some(Transition::Fired));
        assert_eq!(state.evaluate(&rule, 8.0, at(2)), None);
        assert_eq!(state.evaluate(&rule, 11.0, at(3)), Some(Transition::Cleared));
        assert!(!state.active);
    }

    #[test]
    fn should_clear_exactly_at_the_band_edge() {
        let rule = low_temp_rule();
        let mut state = RuleState::default();
        assert_eq!(state.evaluate(&rule, 9.0, at(0)), Some(Transition::Fired));
        // threshold + margin exactly: the edge recovers.
        assert_eq!(state.evaluate(&rule, 11.0, at(1)), Some(Transition::Cleared));
        assert!(!state.active);
    }

    #[test]
    fn should_hold_latch_inside_hysteresis_band() {
        // 10.5 is above the threshold but below threshold + margin, so an
        // active rule does not clear.
        let rule = low_temp_rule();
        let mut state = RuleState::default();
        state.evaluate(&rule, 9.0, at(0));
        assert_eq!(state.evaluate(&rule, 10.5, at(1)), None);
        assert!(state.active);
    }

    #[test]
    fn should_suppress_refire_inside_cooldown() {
        let rule = low_temp_rule();
        let mut state = RuleState::default();
        assert_eq!(state.evaluate(&rule, 9.0, at(0)), Some(Transition::Fired));
        assert_eq!(state.evaluate(&rule, 12.0, at(2)), Some(Transition::Cleared));
        // Second crossing 2 minutes after the first fire, cooldown is 10
        // minutes: latch sets but the notification is suppressed.
        assert_eq!(
            state.evaluate(&rule, 9.0, at(4)),
            Some(Transition::FiredSuppressed)
        );
        assert!(state.active);
    }

    #[test]
    fn should_refire_after_cooldown_expires() {
        let rule = AlertRule {
            cooldown_secs: 60,
            ..low_temp_rule()
        };
        let mut state = RuleState::default();
        assert_eq!(state.evaluate(&rule, 9.0, at(0)), Some(Transition::Fired));
        assert_eq!(state.evaluate(&rule, 12.0, at(1)), Some(Transition::Cleared));
        assert_eq!(state.evaluate(&rule, 9.0, at(5)), Some(Transition::Fired));
    }

    #[test]
    fn should_evaluate_above_comparator_for_humidity() {
        let rule = AlertRule {
            name: "high humidity".into(),
            metric: Metric::Humidity,
            comparator: Comparator::Above,
            threshold: 85.0,
            margin: HUMIDITY_MARGIN,
            cooldown_secs: 600,
        };
        let mut state = RuleState::default();
        assert_eq!(state.evaluate(&rule, 84.0, at(0)), None);
        assert_eq!(state.evaluate(&rule, 86.0, at(1)), Some(Transition::Fired));
        // 84.0 is inside the band (above 85 - 2), no clear yet.
        assert_eq!(state.evaluate(&rule, 84.0, at(2)), None);
        assert_eq!(state.evaluate(&rule, 82.0, at(3)), Some(Transition::Cleared));
    }

    #[test]
    fn should_latch_binary_alarm_on_edges_only() {
        let mut latch = AlarmLatch::default();
        assert_eq!(latch.update(false), None);
        assert_eq!(latch.update(true), Some(AlarmTransition::Raised));
        // Repeated true readings do not re-fire.
        assert_eq!(latch.update(true), None);
        assert_eq!(latch.update(true), None);
        assert_eq!(latch.update(false), Some(AlarmTransition::Cleared));
        // A fresh edge fires again.
        assert_eq!(latch.update(true), Some(AlarmTransition::Raised));
    }
}
