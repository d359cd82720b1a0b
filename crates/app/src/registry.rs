//! Device registry: the single in-memory source of truth for device state.
//!
//! Owned exclusively by the control loop. Reports from the bus mutate it,
//! commands consult it for targets, and the periodic tick reconciles desired
//! against observed state. Reads from the interface arrive as snapshots
//! copied out through the status channel.

use std::collections::HashMap;

use chrono::Duration;

use hearth_domain::device::{Device, DeviceKind, PowerState, SetCommand};
use hearth_domain::error::{NotFoundError, ValidationError};
use hearth_domain::sample::{DeviceReport, Metric, SensorSample};
use hearth_domain::schedule::DeviceGroup;
use hearth_domain::time::Timestamp;

/// Latest metric readings per device, refreshed on every report.
pub type Readings = HashMap<Metric, f64>;

#[derive(Debug)]
pub struct DeviceRegistry {
    devices: HashMap<String, Device>,
    readings: HashMap<String, Readings>,
    reconcile_timeout: Duration,
}

impl DeviceRegistry {
    /// Build the registry from the configured device name lists.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyName`] or
    /// [`ValidationError::DuplicateName`] for bad configuration; the set is
    /// fixed at startup and never grows at runtime.
    pub fn new(
        bulbs: &[String],
        outlets: &[String],
        sensors: &[String],
        reconcile_timeout: Duration,
    ) -> Result<Self, ValidationError> {
        let mut devices = HashMap::new();
        let groups = [
            (DeviceKind::Bulb, bulbs),
            (DeviceKind::Outlet, outlets),
            (DeviceKind::Sensor, sensors),
        ];
        for (kind, names) in groups {
            for name in names {
                let device = Device::new(name.clone(), kind)?;
                if devices.insert(device.name.clone(), device).is_some() {
                    return Err(ValidationError::DuplicateName(name.clone()));
                }
            }
        }
        Ok(Self {
            devices,
            readings: HashMap::new(),
            reconcile_timeout,
        })
    }

    /// Apply one decoded bridge report.
    ///
    /// Returns the metric samples it carried, timestamped at `now`, for the
    /// caller to keep as the device's latest readings and feed into alerting.
    ///
    /// # Errors
    ///
    /// Returns [`NotFoundError`] for a device name not in the configured
    /// set; callers drop and log such reports, keeping memory bounded
    /// against foreign bus traffic.
    pub fn apply_report(
        &mut self,
        name: &str,
        report: &DeviceReport,
        now: Timestamp,
    ) -> Result<Vec<SensorSample>, NotFoundError> {
        let device = self.devices.get_mut(name).ok_or_else(|| NotFoundError {
            entity: "device",
            name: name.to_string(),
        })?;
        match report.state {
            Some(state) => device.observe(state, now),
            None => device.touch(now),
        }
        let samples: Vec<SensorSample> = report
            .metrics()
            .map(|(metric, value)| SensorSample {
                device: name.to_string(),
                metric,
                value,
                timestamp: now,
            })
            .collect();
        if !samples.is_empty() {
            let latest = self.readings.entry(name.to_string()).or_default();
            for sample in &samples {
                latest.insert(sample.metric, sample.value);
            }
        }
        Ok(samples)
    }

    /// Record a desired state for every switchable device in `group` and
    /// return the commands to publish.
    pub fn set_group_power(
        &mut self,
        group: DeviceGroup,
        state: PowerState,
        now: Timestamp,
    ) -> Vec<(String, SetCommand)> {
        let kind = kind_of(group);
        let mut commands = Vec::new();
        for device in self.devices.values_mut() {
            if device.kind == kind && device.capabilities.switchable {
                device.set_desired(state, now);
                commands.push((device.name.clone(), SetCommand::power(state)));
            }
        }
        commands.sort_by(|a, b| a.0.cmp(&b.0));
        commands
    }

    /// Brightness commands for every dimmable device; brightness carries no
    /// desired-state bookkeeping because the bridge does not echo it back.
    pub fn brightness_commands(&self, value: u8) -> Vec<(String, SetCommand)> {
        let mut commands: Vec<(String, SetCommand)> = self
            .devices
            .values()
            .filter(|device| device.capabilities.dimmable)
            .map(|device| (device.name.clone(), SetCommand::brightness(value)))
            .collect();
        commands.sort_by(|a, b| a.0.cmp(&b.0));
        commands
    }

    /// Mark devices whose pending window outlived the timeout as
    /// unreachable. Returns the names that newly flipped, for logging and
    /// notification.
    pub fn reconcile(&mut self, now: Timestamp) -> Vec<String> {
        let mut flipped = Vec::new();
        for device in self.devices.values_mut() {
            if device.reachable && device.is_stale(now, self.reconcile_timeout) {
                device.reachable = false;
                flipped.push(device.name.clone());
            }
        }
        flipped.sort();
        flipped
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Device> {
        self.devices.get(name)
    }

    /// Current metric samples across all sensors, for periodic recording.
    #[must_use]
    pub fn sample_snapshot(&self, now: Timestamp) -> Vec<SensorSample> {
        let mut samples: Vec<SensorSample> = self
            .readings
            .iter()
            .flat_map(|(name, latest)| {
                latest.iter().map(move |(metric, value)| SensorSample {
                    device: name.clone(),
                    metric: *metric,
                    value: *value,
                    timestamp: now,
                })
            })
            .collect();
        samples.sort_by(|a, b| a.device.cmp(&b.device));
        samples
    }

    /// All devices sorted by name, for status reporting.
    #[must_use]
    pub fn devices(&self) -> Vec<&Device> {
        let mut all: Vec<&Device> = self.devices.values().collect();
        all.sort_by_key(|device| device.name.as_str());
        all
    }

    /// The aggregate effective state of a group: `On` when any member is
    /// effectively on.
    #[must_use]
    pub fn group_state(&self, group: DeviceGroup) -> PowerState {
        let kind = kind_of(group);
        let mut seen = false;
        for device in self.devices.values() {
            if device.kind != kind {
                continue;
            }
            seen = true;
            if device.effective_state() == PowerState::On {
                return PowerState::On;
            }
        }
        if seen { PowerState::Off } else { PowerState::Unknown }
    }
}

fn kind_of(group: DeviceGroup) -> DeviceKind {
    match group {
        DeviceGroup::Bulbs => DeviceKind::Bulb,
        DeviceGroup::Outlets => DeviceKind::Outlet,
    }
}
