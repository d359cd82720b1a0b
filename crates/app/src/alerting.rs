//! Alerting engine: threshold rules and binary alarms over sensor reports.
//!
//! The engine is pure state-machine bookkeeping — it turns samples into
//! [`Notification`] values and leaves dispatch to the control loop, which
//! owns the notifier port. Rule state is tracked per device so two sensors
//! dipping independently each produce their own alert and recovery.

use std::collections::HashMap;

use hearth_domain::alert::{
    AlarmLatch, AlarmTransition, AlertRule, Comparator, RuleState, Transition,
    HUMIDITY_MARGIN, TEMPERATURE_MARGIN,
};
use hearth_domain::sample::{AlarmKind, Metric, SensorSample};
use hearth_domain::time::Timestamp;

pub const LOW_TEMPERATURE_RULE: &str = "low temperature";
pub const HIGH_HUMIDITY_RULE: &str = "high humidity";
pub const FREEZING_RULE: &str = "freezing";

/// A message ready for the notifier port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub subject: String,
    pub body: String,
}

/// Configurable alerting thresholds; the freezing rule is fixed at 0 °C.
#[derive(Debug, Clone, Copy)]
pub struct Thresholds {
    pub low_temperature: f64,
    pub high_humidity: f64,
    pub cooldown_secs: i64,
}

pub struct AlertingEngine {
    rules: Vec<AlertRule>,
    /// Evaluation state keyed by (device, rule name).
    rule_states: HashMap<(String, String), RuleState>,
    /// Binary alarm latches keyed by (device, alarm kind).
    latches: HashMap<(String, AlarmKind), AlarmLatch>,
}

impl AlertingEngine {
    #[must_use]
    pub fn new(thresholds: Thresholds) -> Self {
        let rules = vec![
            AlertRule {
                name: FREEZING_RULE.to_string(),
                metric: Metric::Temperature,
                comparator: Comparator::Below,
                threshold: 0.0,
                margin: TEMPERATURE_MARGIN,
                cooldown_secs: thresholds.cooldown_secs,
            },
            AlertRule {
                name: LOW_TEMPERATURE_RULE.to_string(),
                metric: Metric::Temperature,
                comparator: Comparator::Below,
                threshold: thresholds.low_temperature,
                margin: TEMPERATURE_MARGIN,
                cooldown_secs: thresholds.cooldown_secs,
            },
            AlertRule {
                name: HIGH_HUMIDITY_RULE.to_string(),
                metric: Metric::Humidity,
                comparator: Comparator::Above,
                threshold: thresholds.high_humidity,
                margin: HUMIDITY_MARGIN,
                cooldown_secs: thresholds.cooldown_secs,
            },
        ];
        Self {
            rules,
            rule_states: HashMap::new(),
            latches: HashMap::new(),
        }
    }

    /// Feed the metric samples of one report through every matching rule.
    ///
    /// Rules are evaluated independently; a reading below 0 °C breaches
    /// both the freezing rule and a low-temperature rule set above it.
    pub fn evaluate_samples(
        &mut self,
        samples: &[SensorSample],
        now: Timestamp,
    ) -> Vec<Notification> {
        let mut out = Vec::new();
        for sample in samples {
            for rule in &self.rules {
                if rule.metric != sample.metric {
                    continue;
                }
                let state = self
                    .rule_states
                    .entry((sample.device.clone(), rule.name.clone()))
                    .or_default();
                match state.evaluate(rule, sample.value, now) {
                    Some(Transition::Fired) => out.push(breach_notification(rule, sample)),
                    Some(Transition::Cleared) => out.push(recovery_notification(rule, sample)),
                    Some(Transition::FiredSuppressed) => {
                        tracing::info!(
                            rule = %rule.name,
                            device = %sample.device,
                            value = sample.value,
                            "alert re-fired within cooldown, notification suppressed"
                        );
                    }
                    None => {}
                }
            }
        }
        out
    }

    /// Feed one device's binary alarm flags through their latches.
    ///
    /// Water leaks notify on both edges; a low battery notifies once when
    /// raised and resets silently, since replacement is the only recovery.
    pub fn evaluate_alarms(
        &mut self,
        device: &str,
        alarms: impl Iterator<Item = (AlarmKind, bool)>,
    ) -> Vec<Notification> {
        let mut out = Vec::new();
        for (kind, reading) in alarms {
            let latch = self
                .latches
                .entry((device.to_string(), kind))
                .or_default();
            match (latch.update(reading), kind) {
                (Some(AlarmTransition::Raised), _) => out.push(Notification {
                    subject: format!("{kind} on {device}"),
                    body: format!("Device {device} reports {kind}."),
                }),
                (Some(AlarmTransition::Cleared), AlarmKind::WaterLeak) => {
                    out.push(Notification {
                        subject: format!("{kind} cleared on {device}"),
                        body: format!("Device {device} no longer reports {kind}."),
                    });
                }
                _ => {}
            }
        }
        out
    }

    /// A device stopped confirming commands; worth a message of its own.
    #[must_use]
    pub fn unreachable_notification(device: &str) -> Notification {
        Notification {
            subject: format!("device unreachable: {device}"),
            body: format!(
                "Device {device} has not confirmed its last command within the \
                 reconciliation timeout."
            ),
        }
    }

    /// Update the configurable thresholds; the freezing rule is untouched
    /// and rule state survives so an active alert still recovers against
    /// the new band.
    pub fn set_thresholds(&mut self, low_temperature: Option<f64>, high_humidity: Option<f64>) {
        for rule in &mut self.rules {
            match rule.name.as_str() {
                LOW_TEMPERATURE_RULE => {
                    if let Some(value) = low_temperature {
                        rule.threshold = value;
                        tracing::info!(rule = %rule.name, threshold = value, "threshold updated");
                    }
                }
                HIGH_HUMIDITY_RULE => {
                    if let Some(value) = high_humidity {
                        rule.threshold = value;
                        tracing::info!(rule = %rule.name, threshold = value, "threshold updated");
                    }
                }
                _ => {}
            }
        }
    }

    /// Current thresholds, for status reporting.
    #[must_use]
    pub fn thresholds(&self) -> (f64, f64) {
        let low = self
            .rules
            .iter()
            .find(|rule| rule.name == LOW_TEMPERATURE_RULE)
            .map_or(0.0, |rule| rule.threshold);
        let high = self
            .rules
            .iter()
            .find(|rule| rule.name == HIGH_HUMIDITY_RULE)
            .map_or(100.0, |rule| rule.threshold);
        (low, high)
    }

    /// Names of rules currently latched active, sorted, for status.
    #[must_use]
    pub fn active_alerts(&self) -> Vec<String> {
        let mut active: Vec<String> = self
            .rule_states
            .iter()
            .filter(|(_, state)| state.active)
            .map(|((device, rule), _)| format!("{rule} ({device})"))
            .collect();
        active.extend(
            self.latches
                .iter()
                .filter(|(_, latch)| latch.active)
                .map(|((device, kind), _)| format!("{kind} ({device})")),
        );
        active.sort();
        active
    }
}

fn breach_notification(rule: &AlertRule, sample: &SensorSample) -> Notification {
    Notification {
        subject: format!("{} on {}", rule.name, sample.device),
        body: format!(
            "{} reported {:.1}{} on {} (threshold {:.1}{}).",
            sample.metric,
            sample.value,
            sample.metric.unit(),
            sample.device,
            rule.threshold,
            sample.metric.unit(),
        ),
    }
}

fn recovery_notification(rule: &AlertRule, sample: &SensorSample) -> Notification {
    Notification {
        subject: format!("{} recovered on {}", rule.name, sample.device),
        body: format!(
            "{} is back to {:.1}{} on {}.",
            sample.metric,
            sample.value,
            sample.metric.unit(),
            sample.device,
        ),
    }
}
