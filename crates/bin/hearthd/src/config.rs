//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `hearth.toml` in the working directory (override the path with
//! `HEARTH_CONFIG`). Every field has a default so the file is optional for a
//! local run; environment variables take precedence over file values.
//!
//! Validation policy: coordinates and the listener port are fatal when
//! invalid, everything else degrades to its default with a logged warning so
//! a typo in a timer string never keeps the house dark.

use std::time::Duration as StdDuration;

use chrono::{Duration, FixedOffset, Offset as _};
use serde::Deserialize;

use hearth_adapter_mqtt::MqttConfig;
use hearth_adapter_smtp::SmtpConfig;
use hearth_app::alerting::Thresholds;
use hearth_app::control_loop::ControlSettings;
use hearth_app::scheduler::{GroupSchedule, Location};
use hearth_domain::schedule::TriggerMode;
use hearth_domain::solar;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// MQTT broker settings.
    pub broker: MqttConfig,
    /// SMTP notification settings.
    pub smtp: SmtpConfig,
    /// Configured device names by kind.
    pub devices: DevicesConfig,
    /// Geographic location for sun-relative triggers.
    pub location: LocationConfig,
    /// Per-group timer settings.
    pub timers: TimersConfig,
    /// Alert thresholds.
    pub alerts: AlertsConfig,
    /// Sample storage settings.
    pub storage: StorageConfig,
    /// Control-loop timing settings.
    pub control: ControlConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// Device name lists. Names double as bridge topic segments.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DevicesConfig {
    pub bulbs: Vec<String>,
    pub outlets: Vec<String>,
    pub sensors: Vec<String>,
    /// Brightness published to bulbs at startup (0..=254).
    pub brightness: u16,
}

/// Geographic location and timezone offset.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    pub latitude: f64,
    pub longitude: f64,
    /// Local offset from UTC in minutes (e.g. `-300` for UTC-5). A fixed
    /// offset, so DST shifts require a config change.
    pub utc_offset_minutes: i32,
}

/// One group's timer pair.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TimerConfig {
    /// On trigger: `"dusk"`, `"dawn"`, or `"HH:MM"`.
    pub on: String,
    /// Off trigger.
    pub off: String,
    /// Whether the timer actually switches the group.
    pub enabled: bool,
}

/// Timer settings per device group.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TimersConfig {
    pub bulbs: TimerConfig,
    pub outlets: TimerConfig,
}

/// Alert thresholds and notification cooldown.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AlertsConfig {
    /// Low-temperature threshold in °C.
    pub low_temperature: f64,
    /// High-humidity threshold in %RH.
    pub high_humidity: f64,
    /// Minimum gap between two fired notifications, in seconds.
    pub cooldown_secs: i64,
}

/// Sample storage configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// `SQLite` connection URL or file path.
    pub url: String,
    /// How long samples are kept before pruning, in days.
    pub retention_days: i64,
}

/// Control-loop timing.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Scheduler tick period in seconds.
    pub tick_secs: u64,
    /// Sensor sample recording period in seconds.
    pub sample_period_secs: i64,
    /// Desired-vs-observed reconciliation timeout in seconds.
    pub reconcile_timeout_secs: i64,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

impl Config {
    /// Load configuration from `hearth.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but is malformed, or if a fatal
    /// field (coordinates, port) fails validation.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("HEARTH_CONFIG").unwrap_or_else(|_| "hearth.toml".to_string());
        let mut config = Self::from_file(&path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("HEARTH_BIND") {
            if let Some((host, port)) = val.rsplit_once(':') {
                self.server.host = host.to_string();
                if let Ok(port) = port.parse() {
                    self.server.port = port;
                }
            }
        }
        if let Ok(val) = std::env::var("HEARTH_DATABASE_URL") {
            self.storage.url = val;
        }
        if let Ok(val) = std::env::var("HEARTH_BROKER_HOST") {
            self.broker.host = val;
        }
        if let Ok(val) = std::env::var("HEARTH_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&mut self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        solar::validate_coordinates(self.location.latitude, self.location.longitude)
            .map_err(|err| ConfigError::Validation(err.to_string()))?;
        if self.location.utc_offset_minutes.abs() > 14 * 60 {
            return Err(ConfigError::Validation(format!(
                "utc_offset_minutes {} out of range",
                self.location.utc_offset_minutes
            )));
        }
        if self.devices.brightness > 254 {
            tracing::error!(
                brightness = self.devices.brightness,
                "brightness out of range, clamping to 254"
            );
            self.devices.brightness = 254;
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// The configured location as scheduler input.
    #[must_use]
    pub fn location(&self) -> Location {
        // Range-checked in validate(); east_opt only rejects out-of-range.
        let offset = FixedOffset::east_opt(self.location.utc_offset_minutes * 60)
            .unwrap_or_else(|| chrono::Utc.fix());
        Location {
            latitude: self.location.latitude,
            longitude: self.location.longitude,
            utc_offset: offset,
        }
    }

    /// Group schedules parsed from the timer strings.
    ///
    /// An unparseable trigger string falls back to a fixed 23:59 with a
    /// logged warning.
    #[must_use]
    pub fn group_schedules(
        &self,
    ) -> std::collections::HashMap<hearth_domain::schedule::DeviceGroup, GroupSchedule> {
        use hearth_domain::schedule::DeviceGroup;
        let mut groups = std::collections::HashMap::new();
        groups.insert(DeviceGroup::Bulbs, schedule_of(&self.timers.bulbs));
        groups.insert(DeviceGroup::Outlets, schedule_of(&self.timers.outlets));
        groups
    }

    /// Alerting thresholds.
    #[must_use]
    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            low_temperature: self.alerts.low_temperature,
            high_humidity: self.alerts.high_humidity,
            cooldown_secs: self.alerts.cooldown_secs,
        }
    }

    /// Control-loop settings.
    #[must_use]
    pub fn control_settings(&self) -> ControlSettings {
        ControlSettings {
            tick: StdDuration::from_secs(self.control.tick_secs),
            retention: Duration::days(self.storage.retention_days),
            brightness: u8::try_from(self.devices.brightness).unwrap_or(254),
        }
    }

    /// Sample recording period.
    #[must_use]
    pub fn sample_period(&self) -> Duration {
        Duration::seconds(self.control.sample_period_secs)
    }

    /// Reconciliation timeout.
    #[must_use]
    pub fn reconcile_timeout(&self) -> Duration {
        Duration::seconds(self.control.reconcile_timeout_secs)
    }
}

fn schedule_of(timer: &TimerConfig) -> GroupSchedule {
    GroupSchedule {
        on_mode: parse_trigger(&timer.on),
        off_mode: parse_trigger(&timer.off),
        enabled: timer.enabled,
    }
}

fn parse_trigger(raw: &str) -> TriggerMode {
    raw.parse().unwrap_or_else(|err| {
        tracing::warn!(%raw, %err, "unparseable trigger time, using 23:59");
        TriggerMode::Fixed(hearth_domain::time::TimeOfDay::LAST_MINUTE)
    })
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            latitude: 0.0,
            longitude: 0.0,
            utc_offset_minutes: 0,
        }
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            on: "dusk".to_string(),
            off: "23:59".to_string(),
            enabled: true,
        }
    }
}

impl Default for TimersConfig {
    fn default() -> Self {
        Self {
            bulbs: TimerConfig::default(),
            // Outlets stay manual until explicitly enabled.
            outlets: TimerConfig {
                enabled: false,
                ..TimerConfig::default()
            },
        }
    }
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            low_temperature: 10.0,
            high_humidity: 85.0,
            cooldown_secs: 600,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:hearth.db?mode=rwc".to_string(),
            retention_days: 365,
        }
    }
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            tick_secs: 10,
            sample_period_secs: 300,
            reconcile_timeout_secs: 120,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "hearthd=info,hearth=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for DevicesConfig {
    fn default() -> Self {
        Self {
            bulbs: Vec::new(),
            outlets: Vec::new(),
            sensors: Vec::new(),
            brightness: 254,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
