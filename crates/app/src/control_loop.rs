//! The control loop: one task owning all mutable state.
//!
//! Registry, scheduler, and alerting engine are plain (non-`Sync`) values
//! owned by this task; everything else talks to it over channels. Commands
//! arrive on an mpsc channel from the control surface, decoded bus events
//! on another from the bridge adapter, and a periodic tick drives the
//! scheduler. State flows back out through a watch channel carrying
//! [`StatusSnapshot`] values, so readers never contend with the writer.
//!
//! Every handler takes an explicit `now` so tests can drive the loop
//! without a real clock.

use std::collections::HashMap;
use std::time::Duration as StdDuration;

use chrono::Duration;
use serde::Serialize;
use tokio::sync::{mpsc, watch};

use hearth_domain::device::{Device, PowerState, SetCommand};
use hearth_domain::error::HearthError;
use hearth_domain::schedule::{DeviceGroup, ScheduledEvent, TriggerMode};
use hearth_domain::time::{self, Timestamp};

use crate::alerting::{AlertingEngine, Notification};
use crate::ports::{BusEvent, CommandBus, Notifier, SampleSink};
use crate::registry::DeviceRegistry;
use crate::scheduler::{Scheduler, Slot};

const COMMAND_BUFFER: usize = 32;
const EVENT_BUFFER: usize = 256;

/// Create the channel the bridge adapter feeds decoded events into.
///
/// Built here so the adapter can be constructed with the sender before the
/// loop takes ownership of the receiver.
#[must_use]
pub fn bus_channel() -> (mpsc::Sender<BusEvent>, mpsc::Receiver<BusEvent>) {
    mpsc::channel(EVENT_BUFFER)
}

/// A request from the control surface.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetGroupPower {
        group: DeviceGroup,
        state: PowerState,
    },
    SetBrightness(u8),
    SetTimerEnabled {
        group: DeviceGroup,
        enabled: bool,
    },
    SetTimerMode {
        group: DeviceGroup,
        on_mode: TriggerMode,
        off_mode: TriggerMode,
    },
    SetAlertThresholds {
        low_temperature: Option<f64>,
        high_humidity: Option<f64>,
    },
}

/// Per-group slice of the status snapshot.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GroupStatus {
    pub group: DeviceGroup,
    pub state: PowerState,
    pub timer_enabled: bool,
    pub on_mode: TriggerMode,
    pub off_mode: TriggerMode,
}

/// Self-contained copy of the loop's state, published after every mutation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatusSnapshot {
    pub devices: Vec<Device>,
    pub groups: Vec<GroupStatus>,
    pub pending_events: Vec<ScheduledEvent>,
    pub active_alerts: Vec<String>,
    pub low_temperature_threshold: f64,
    pub high_humidity_threshold: f64,
    pub brightness: u8,
    pub bridge_connected: bool,
    pub solar_degraded: bool,
}

/// Cloneable handle given to the control surface.
#[derive(Debug, Clone)]
pub struct ControlHandle {
    commands: mpsc::Sender<Command>,
    status: watch::Receiver<StatusSnapshot>,
}

impl ControlHandle {
    /// Queue a command for the loop.
    ///
    /// # Errors
    ///
    /// Returns [`HearthError::Shutdown`] when the loop has exited.
    pub async fn send(&self, command: Command) -> Result<(), HearthError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| HearthError::Shutdown)
    }

    /// The latest published snapshot.
    #[must_use]
    pub fn status(&self) -> StatusSnapshot {
        self.status.borrow().clone()
    }
}

/// The loop's owned state machines, built from configuration.
pub struct Engine {
    pub registry: DeviceRegistry,
    pub scheduler: Scheduler,
    pub alerts: AlertingEngine,
}

/// Loop timing and startup parameters, resolved from configuration.
#[derive(Debug, Clone, Copy)]
pub struct ControlSettings {
    /// Scheduler tick period.
    pub tick: StdDuration,
    /// Sample retention horizon for pruning.
    pub retention: Duration,
    /// Brightness published to every dimmable device at startup.
    pub brightness: u8,
}

pub struct ControlLoop<B, S, N> {
    bus: B,
    sink: S,
    notifier: N,
    registry: DeviceRegistry,
    scheduler: Scheduler,
    alerts: AlertingEngine,
    settings: ControlSettings,
    /// Commands whose publish failed, retried on the next tick.
    retry: HashMap<String, SetCommand>,
    bridge_connected: bool,
    commands_rx: mpsc::Receiver<Command>,
    events_rx: mpsc::Receiver<BusEvent>,
    status_tx: watch::Sender<StatusSnapshot>,
}

impl<B, S, N> ControlLoop<B, S, N>
where
    B: CommandBus,
    S: SampleSink,
    N: Notifier,
{
    /// Wire up the loop around the receiving end of a [`bus_channel`].
    /// Returns the loop itself and the handle for the control surface.
    pub fn new(
        bus: B,
        sink: S,
        notifier: N,
        engine: Engine,
        settings: ControlSettings,
        events_rx: mpsc::Receiver<BusEvent>,
    ) -> (Self, ControlHandle) {
        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_BUFFER);
        let (status_tx, status_rx) = watch::channel(StatusSnapshot::default());
        let this = Self {
            bus,
            sink,
            notifier,
            registry: engine.registry,
            scheduler: engine.scheduler,
            alerts: engine.alerts,
            settings,
            retry: HashMap::new(),
            bridge_connected: false,
            commands_rx,
            events_rx,
            status_tx,
        };
        let handle = ControlHandle {
            commands: commands_tx,
            status: status_rx,
        };
        (this, handle)
    }

    /// Run until `shutdown` flips or every command sender is dropped.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let now = time::now();
        self.startup(now).await;
        let mut ticker = tokio::time::interval(self.settings.tick);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.on_tick(time::now()).await;
                }
                command = self.commands_rx.recv() => {
                    match command {
                        Some(command) => self.on_command(command, time::now()).await,
                        None => break,
                    }
                }
                event = self.events_rx.recv() => {
                    match event {
                        Some(event) => self.on_bus_event(event, time::now()).await,
                        None => {
                            tracing::warn!("bridge event channel closed");
                            break;
                        }
                    }
                }
                _ = shutdown.changed() => {
                    tracing::info!("control loop shutting down");
                    break;
                }
            }
        }
    }

    /// Initial publishes: brightness to every dimmable device, then each
    /// group's starting state. Groups with timer control disabled start
    /// off, so a restart never leaves an outlet running unattended.
    pub async fn startup(&mut self, now: Timestamp) {
        self.scheduler.start(now);
        let brightness = self.registry.brightness_commands(self.settings.brightness);
        for (device, command) in brightness {
            self.publish(&device, command).await;
        }
        for group in DeviceGroup::ALL {
            let Some(schedule) = self.scheduler.group(group) else {
                continue;
            };
            let action = if schedule.enabled {
                self.scheduler.initial_action(group, now)
            } else {
                PowerState::Off
            };
            tracing::info!(%group, %action, "applying startup state");
            self.apply_group(group, action, now).await;
        }
        self.publish_status();
    }

    /// One scheduler tick: fire due events, retry failed publishes, and
    /// reconcile desired against observed state.
    pub async fn on_tick(&mut self, now: Timestamp) {
        for firing in self.scheduler.tick(now) {
            match firing.slot {
                Slot::Transition { group, action } => {
                    let enabled = self
                        .scheduler
                        .group(group)
                        .is_some_and(|schedule| schedule.enabled);
                    if enabled {
                        tracing::info!(%group, %action, "timer transition");
                        self.apply_group(group, action, now).await;
                    } else {
                        tracing::debug!(%group, %action, "timer transition skipped, control disabled");
                    }
                }
                Slot::RecordSamples => self.record_samples(now).await,
            }
        }
        let pending: Vec<(String, SetCommand)> = self.retry.drain().collect();
        for (device, command) in pending {
            self.publish(&device, command).await;
        }
        for device in self.registry.reconcile(now) {
            tracing::warn!(%device, "device unreachable");
            self.dispatch(vec![AlertingEngine::unreachable_notification(&device)])
                .await;
        }
        self.publish_status();
    }

    /// Apply one decoded bus event.
    pub async fn on_bus_event(&mut self, event: BusEvent, now: Timestamp) {
        match event {
            BusEvent::Report { device, report } => {
                match self.registry.apply_report(&device, &report, now) {
                    Ok(samples) => {
                        let mut notifications = self.alerts.evaluate_samples(&samples, now);
                        notifications
                            .extend(self.alerts.evaluate_alarms(&device, report.alarms()));
                        self.dispatch(notifications).await;
                    }
                    Err(err) => {
                        tracing::debug!(%err, "dropping report for unconfigured device");
                    }
                }
            }
            BusEvent::BridgeConnected => {
                tracing::info!("bridge online");
                self.bridge_connected = true;
            }
            BusEvent::BridgeDisconnected => {
                tracing::warn!("bridge offline");
                self.bridge_connected = false;
            }
        }
        self.publish_status();
    }

    /// Apply one command from the control surface.
    pub async fn on_command(&mut self, command: Command, now: Timestamp) {
        match command {
            Command::SetGroupPower { group, state } => {
                tracing::info!(%group, %state, "manual group switch");
                self.apply_group(group, state, now).await;
            }
            Command::SetBrightness(value) => {
                self.settings.brightness = value;
                let commands = self.registry.brightness_commands(value);
                for (device, command) in commands {
                    self.publish(&device, command).await;
                }
            }
            Command::SetTimerEnabled { group, enabled } => {
                self.scheduler.set_enabled(group, enabled);
            }
            Command::SetTimerMode {
                group,
                on_mode,
                off_mode,
            } => {
                self.scheduler.reconfigure(group, on_mode, off_mode, now);
            }
            Command::SetAlertThresholds {
                low_temperature,
                high_humidity,
            } => {
                self.alerts.set_thresholds(low_temperature, high_humidity);
            }
        }
        self.publish_status();
    }

    async fn apply_group(&mut self, group: DeviceGroup, state: PowerState, now: Timestamp) {
        let commands = self.registry.set_group_power(group, state, now);
        for (device, command) in commands {
            self.publish(&device, command).await;
        }
    }

    /// Publish one command; a failure is remembered and retried on the next
    /// tick rather than propagated.
    async fn publish(&mut self, device: &str, command: SetCommand) {
        if let Err(err) = self.bus.publish_set(device, command).await {
            tracing::warn!(%device, %err, "publish failed, queued for retry");
            self.retry.insert(device.to_string(), command);
        }
    }

    async fn record_samples(&mut self, now: Timestamp) {
        let samples = self.registry.sample_snapshot(now);
        if !samples.is_empty() {
            let count = samples.len();
            if let Err(err) = self.sink.append(samples).await {
                tracing::error!(%err, "failed to persist samples");
            } else {
                tracing::debug!(count, "samples recorded");
            }
        }
        let cutoff = now - self.settings.retention;
        match self.sink.prune_older_than(cutoff).await {
            Ok(0) => {}
            Ok(removed) => tracing::info!(removed, %cutoff, "pruned expired samples"),
            Err(err) => tracing::error!(%err, "failed to prune samples"),
        }
    }

    /// Delivery failures are logged and dropped; alert state has already
    /// transitioned, so retrying would produce duplicates on recovery.
    async fn dispatch(&self, notifications: Vec<Notification>) {
        for notification in notifications {
            if let Err(err) = self
                .notifier
                .send(&notification.subject, &notification.body)
                .await
            {
                tracing::error!(%err, subject = %notification.subject, "notification delivery failed");
            }
        }
    }

    fn publish_status(&mut self) {
        let (low, high) = self.alerts.thresholds();
        let groups = DeviceGroup::ALL
            .into_iter()
            .filter_map(|group| {
                self.scheduler.group(group).map(|schedule| GroupStatus {
                    group,
                    state: self.registry.group_state(group),
                    timer_enabled: schedule.enabled,
                    on_mode: schedule.on_mode,
                    off_mode: schedule.off_mode,
                })
            })
            .collect();
        let snapshot = StatusSnapshot {
            devices: self.registry.devices().into_iter().cloned().collect(),
            groups,
            pending_events: self.scheduler.pending_events(),
            active_alerts: self.alerts.active_alerts(),
            low_temperature_threshold: low,
            high_humidity_threshold: high,
            brightness: self.settings.brightness,
            bridge_connected: self.bridge_connected,
            solar_degraded: self.scheduler.is_degraded(),
        };
        // Send even without receivers; the surface may attach later.
        let _ = self.status_tx.send(snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap as Map;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    use chrono::{FixedOffset, TimeZone, Utc};

    use hearth_domain::sample::{DeviceReport, SensorSample};
    use hearth_domain::time::Timestamp;

    use crate::alerting::Thresholds;
    use crate::scheduler::{GroupSchedule, Location};

    #[derive(Default, Clone)]
    struct SpyBus {
        published: Arc<Mutex<Vec<(String, SetCommand)>>>,
        failing: Arc<AtomicBool>,
    }

    impl CommandBus for SpyBus {
        async fn publish_set(&self, device: &str, command: SetCommand) -> Result<(), HearthError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(HearthError::Bus("broker unavailable".into()));
            }
            self.published
                .lock()
                .unwrap()
                .push((device.to_string(), command));
            Ok(())
        }
    }

    impl SpyBus {
        fn published(&self) -> Vec<(String, SetCommand)> {
            self.published.lock().unwrap().clone()
        }

        fn clear(&self) {
            self.published.lock().unwrap().clear();
        }
    }

    #[derive(Default, Clone)]
    struct SpySink {
        appended: Arc<Mutex<Vec<SensorSample>>>,
        pruned_before: Arc<Mutex<Vec<Timestamp>>>,
    }

    impl SampleSink for SpySink {
        async fn append(&self, samples: Vec<SensorSample>) -> Result<(), HearthError> {
            self.appended.lock().unwrap().extend(samples);
            Ok(())
        }

        async fn prune_older_than(&self, cutoff: Timestamp) -> Result<u64, HearthError> {
            self.pruned_before.lock().unwrap().push(cutoff);
            Ok(0)
        }
    }

    #[derive(Default, Clone)]
    struct SpyNotifier {
        sent: Arc<Mutex<Vec<String>>>,
        failing: Arc<AtomicBool>,
    }

    impl Notifier for SpyNotifier {
        async fn send(&self, subject: &str, _body: &str) -> Result<(), HearthError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(HearthError::Notify("smtp down".into()));
            }
            self.sent.lock().unwrap().push(subject.to_string());
            Ok(())
        }
    }

    fn utc(d: u32, h: u32, m: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2024, 6, d, h, m, 0).unwrap()
    }

    fn fixed(s: &str) -> TriggerMode {
        s.parse().unwrap()
    }

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    struct Fixture {
        bus: SpyBus,
        sink: SpySink,
        notifier: SpyNotifier,
        control: ControlLoop<SpyBus, SpySink, SpyNotifier>,
    }

    fn fixture(bulbs_enabled: bool, outlets_enabled: bool) -> Fixture {
        let bus = SpyBus::default();
        let sink = SpySink::default();
        let notifier = SpyNotifier::default();
        let registry = DeviceRegistry::new(
            &names(&["porch"]),
            &names(&["fan"]),
            &names(&["basement"]),
            Duration::minutes(2),
        )
        .unwrap();
        let mut groups = Map::new();
        groups.insert(
            DeviceGroup::Bulbs,
            GroupSchedule {
                on_mode: fixed("18:00"),
                off_mode: fixed("23:00"),
                enabled: bulbs_enabled,
            },
        );
        groups.insert(
            DeviceGroup::Outlets,
            GroupSchedule {
                on_mode: fixed("18:00"),
                off_mode: fixed("23:00"),
                enabled: outlets_enabled,
            },
        );
        let scheduler = Scheduler::new(
            groups,
            Duration::minutes(5),
            Location {
                latitude: 42.33,
                longitude: -83.05,
                utc_offset: FixedOffset::west_opt(5 * 3600).unwrap(),
            },
        );
        let alerts = AlertingEngine::new(Thresholds {
            low_temperature: 10.0,
            high_humidity: 85.0,
            cooldown_secs: 600,
        });
        let settings = ControlSettings {
            tick: StdDuration::from_secs(1),
            retention: Duration::days(365),
            brightness: 254,
        };
        let (_events_tx, events_rx) = bus_channel();
        let (control, _handle) = ControlLoop::new(
            bus.clone(),
            sink.clone(),
            notifier.clone(),
            Engine {
                registry,
                scheduler,
                alerts,
            },
            settings,
            events_rx,
        );
        Fixture {
            bus,
            sink,
            notifier,
            control,
        }
    }

    #[tokio::test]
    async fn should_publish_brightness_and_initial_states_at_startup() {
        let mut f = fixture(true, false);
        // 10:00 local, outside the 18:00-23:00 window.
        f.control.startup(utc(1, 15, 0)).await;
        let published = f.bus.published();
        assert!(published.contains(&("porch".to_string(), SetCommand::brightness(254))));
        // Bulbs outside the window start off; outlets are disabled and
        // forced off.
        assert!(published.contains(&("porch".to_string(), SetCommand::power(PowerState::Off))));
        assert!(published.contains(&("fan".to_string(), SetCommand::power(PowerState::Off))));
    }

    #[tokio::test]
    async fn should_start_bulbs_on_inside_window() {
        let mut f = fixture(true, false);
        // 20:00 local, inside the window.
        f.control.startup(utc(2, 1, 0)).await;
        assert!(f
            .bus
            .published()
            .contains(&("porch".to_string(), SetCommand::power(PowerState::On))));
    }

    #[tokio::test]
    async fn should_switch_group_when_timer_fires() {
        let mut f = fixture(true, false);
        f.control.startup(utc(1, 15, 0)).await;
        f.bus.clear();
        // 18:00 local = 23:00 UTC.
        f.control.on_tick(utc(1, 23, 0)).await;
        assert!(f
            .bus
            .published()
            .contains(&("porch".to_string(), SetCommand::power(PowerState::On))));
    }

    #[tokio::test]
    async fn should_keep_chain_alive_but_skip_disabled_group() {
        let mut f = fixture(true, false);
        f.control.startup(utc(1, 15, 0)).await;
        f.bus.clear();
        f.control.on_tick(utc(1, 23, 0)).await;
        let published = f.bus.published();
        // No outlet command despite its timer firing at the same instant.
        assert!(!published.iter().any(|(device, _)| device == "fan"));
    }

    #[tokio::test]
    async fn should_retry_failed_publish_on_next_tick() {
        let mut f = fixture(true, false);
        f.control.startup(utc(1, 15, 0)).await;
        f.bus.clear();
        f.bus.failing.store(true, Ordering::SeqCst);
        f.control
            .on_command(
                Command::SetGroupPower {
                    group: DeviceGroup::Bulbs,
                    state: PowerState::On,
                },
                utc(1, 16, 0),
            )
            .await;
        assert!(f.bus.published().is_empty());

        f.bus.failing.store(false, Ordering::SeqCst);
        f.control.on_tick(utc(1, 16, 1)).await;
        assert!(f
            .bus
            .published()
            .contains(&("porch".to_string(), SetCommand::power(PowerState::On))));
    }

    #[tokio::test]
    async fn should_record_and_prune_samples_on_schedule() {
        let mut f = fixture(true, false);
        f.control.startup(utc(1, 12, 0)).await;
        let report: DeviceReport = serde_json::from_str(r#"{"temperature": 18.5}"#).unwrap();
        f.control
            .on_bus_event(
                BusEvent::Report {
                    device: "basement".to_string(),
                    report,
                },
                utc(1, 12, 1),
            )
            .await;
        // Sample recording fires 5 minutes after startup.
        f.control.on_tick(utc(1, 12, 5)).await;
        let appended = f.sink.appended.lock().unwrap().clone();
        assert_eq!(appended.len(), 1);
        assert_eq!(appended[0].device, "basement");
        let cutoffs = f.sink.pruned_before.lock().unwrap().clone();
        assert_eq!(cutoffs, vec![utc(1, 12, 5) - Duration::days(365)]);
    }

    #[tokio::test]
    async fn should_notify_on_alert_and_survive_notifier_failure() {
        let mut f = fixture(true, false);
        f.control.startup(utc(1, 12, 0)).await;
        f.notifier.failing.store(true, Ordering::SeqCst);
        let report: DeviceReport = serde_json::from_str(r#"{"temperature": 8.0}"#).unwrap();
        f.control
            .on_bus_event(
                BusEvent::Report {
                    device: "basement".to_string(),
                    report: report.clone(),
                },
                utc(1, 12, 1),
            )
            .await;
        // Delivery failed but the latch set: state is truthful.
        assert!(f.notifier.sent.lock().unwrap().is_empty());

        f.notifier.failing.store(false, Ordering::SeqCst);
        let recovery: DeviceReport = serde_json::from_str(r#"{"temperature": 12.0}"#).unwrap();
        f.control
            .on_bus_event(
                BusEvent::Report {
                    device: "basement".to_string(),
                    report: recovery,
                },
                utc(1, 12, 6),
            )
            .await;
        let sent = f.notifier.sent.lock().unwrap().clone();
        assert_eq!(sent, vec!["low temperature recovered on basement"]);
    }

    #[tokio::test]
    async fn should_drop_report_from_unconfigured_device() {
        let mut f = fixture(true, false);
        f.control.startup(utc(1, 12, 0)).await;
        f.bus.clear();
        let report: DeviceReport = serde_json::from_str(r#"{"state": "ON"}"#).unwrap();
        f.control
            .on_bus_event(
                BusEvent::Report {
                    device: "intruder".to_string(),
                    report,
                },
                utc(1, 12, 1),
            )
            .await;
        // Nothing published, nothing notified, nothing recorded.
        assert!(f.bus.published().is_empty());
        assert!(f.notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_notify_unreachable_device_after_timeout() {
        let mut f = fixture(true, false);
        f.control.startup(utc(1, 15, 0)).await;
        f.control
            .on_command(
                Command::SetGroupPower {
                    group: DeviceGroup::Bulbs,
                    state: PowerState::On,
                },
                utc(1, 16, 0),
            )
            .await;
        // No confirmation arrives; the 2 minute reconcile timeout passes.
        f.control.on_tick(utc(1, 16, 3)).await;
        let sent = f.notifier.sent.lock().unwrap().clone();
        assert!(sent.contains(&"device unreachable: porch".to_string()));
    }

    #[tokio::test]
    async fn should_reflect_commands_in_status_snapshot() {
        let bus = SpyBus::default();
        let sink = SpySink::default();
        let notifier = SpyNotifier::default();
        let registry = DeviceRegistry::new(
            &names(&["porch"]),
            &[],
            &[],
            Duration::minutes(2),
        )
        .unwrap();
        let mut groups = Map::new();
        groups.insert(
            DeviceGroup::Bulbs,
            GroupSchedule {
                on_mode: fixed("18:00"),
                off_mode: fixed("23:00"),
                enabled: true,
            },
        );
        let scheduler = Scheduler::new(
            groups,
            Duration::minutes(5),
            Location {
                latitude: 42.33,
                longitude: -83.05,
                utc_offset: FixedOffset::west_opt(5 * 3600).unwrap(),
            },
        );
        let alerts = AlertingEngine::new(Thresholds {
            low_temperature: 10.0,
            high_humidity: 85.0,
            cooldown_secs: 600,
        });
        let settings = ControlSettings {
            tick: StdDuration::from_secs(1),
            retention: Duration::days(365),
            brightness: 254,
        };
        let (_events_tx, events_rx) = bus_channel();
        let (mut control, handle) = ControlLoop::new(
            bus,
            sink,
            notifier,
            Engine {
                registry,
                scheduler,
                alerts,
            },
            settings,
            events_rx,
        );
        control.startup(utc(1, 12, 0)).await;

        control
            .on_command(
                Command::SetAlertThresholds {
                    low_temperature: Some(12.5),
                    high_humidity: None,
                },
                utc(1, 12, 1),
            )
            .await;
        control
            .on_command(Command::SetBrightness(100), utc(1, 12, 2))
            .await;
        control
            .on_command(
                Command::SetTimerEnabled {
                    group: DeviceGroup::Bulbs,
                    enabled: false,
                },
                utc(1, 12, 3),
            )
            .await;

        let status = handle.status();
        assert_eq!(status.low_temperature_threshold, 12.5);
        assert_eq!(status.high_humidity_threshold, 85.0);
        assert_eq!(status.brightness, 100);
        assert_eq!(status.groups.len(), 1);
        assert!(!status.groups[0].timer_enabled);
        assert!(!status.pending_events.is_empty());
    }
}
