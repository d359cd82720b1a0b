//! Timed-action scheduler: a min-priority-queue of daily transitions.
//!
//! Invalidation strategy: every queue entry carries a sequence token, and a
//! per-slot map records the only token considered live. `reconfigure` bumps
//! the token and inserts a fresh entry; superseded entries stay in the heap
//! and are discarded when they surface at pop time. Chosen over direct
//! removal because it keeps `tick` cheap and the heap never holds more than
//! a handful of live entries plus a few stale ones.
//!
//! The scheduler is mutated only by the control loop; reconfiguration
//! requests from the interface thread arrive as commands on the loop's
//! channel.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use chrono::{Duration, FixedOffset, NaiveDate};

use hearth_domain::device::PowerState;
use hearth_domain::schedule::{DeviceGroup, ScheduledEvent, TriggerMode};
use hearth_domain::solar::{self, SunTimes};
use hearth_domain::time::{TimeOfDay, Timestamp};

/// What a queue entry does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// Switch a device group on or off.
    Transition {
        group: DeviceGroup,
        action: PowerState,
    },
    /// Append the current sensor readings to the sample sink.
    RecordSamples,
}

/// A due action returned by [`Scheduler::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Firing {
    pub slot: Slot,
    /// The trigger time the entry was queued for (≤ the tick's `now`).
    pub scheduled_for: Timestamp,
}

/// Timer pair for one device group.
#[derive(Debug, Clone, Copy)]
pub struct GroupSchedule {
    pub on_mode: TriggerMode,
    pub off_mode: TriggerMode,
    /// When disabled, due transitions reschedule without publishing.
    pub enabled: bool,
}

/// Scheduler location context for sun-relative triggers.
#[derive(Debug, Clone, Copy)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub utc_offset: FixedOffset,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    fire_at: Timestamp,
    seq: u64,
    slot: Slot,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        (self.fire_at, self.seq) == (other.fire_at, other.seq)
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.fire_at, self.seq).cmp(&(other.fire_at, other.seq))
    }
}

/// Min-priority-queue of timed actions with lazy token invalidation.
pub struct Scheduler {
    heap: BinaryHeap<Reverse<Entry>>,
    /// Live token per slot; heap entries with any other token are stale.
    live: HashMap<Slot, u64>,
    next_seq: u64,
    groups: HashMap<DeviceGroup, GroupSchedule>,
    sample_period: Duration,
    location: Location,
    /// Last successfully computed solar times, for the fallback chain.
    last_sun: Option<(NaiveDate, SunTimes)>,
    /// Set when a sun-relative trigger had to fall back.
    degraded: bool,
}

impl Scheduler {
    #[must_use]
    pub fn new(
        groups: HashMap<DeviceGroup, GroupSchedule>,
        sample_period: Duration,
        location: Location,
    ) -> Self {
        Self {
            heap: BinaryHeap::new(),
            live: HashMap::new(),
            next_seq: 0,
            groups,
            sample_period,
            location,
            last_sun: None,
            degraded: false,
        }
    }

    /// Seed the queue: one on and one off transition per group, plus the
    /// recurring sample-recording event.
    pub fn start(&mut self, now: Timestamp) {
        for group in DeviceGroup::ALL {
            if self.groups.contains_key(&group) {
                self.schedule_transitions(group, now);
            }
        }
        self.insert(Slot::RecordSamples, now + self.sample_period);
    }

    /// Pop and return every live entry due at `now`, rescheduling each for
    /// its next occurrence (always strictly after `now`).
    pub fn tick(&mut self, now: Timestamp) -> Vec<Firing> {
        let mut due = Vec::new();
        while let Some(Reverse(entry)) = self.heap.peek().copied() {
            if entry.fire_at > now {
                break;
            }
            self.heap.pop();
            if self.live.get(&entry.slot) != Some(&entry.seq) {
                // Superseded by a reconfiguration; discard silently.
                continue;
            }
            let next = match entry.slot {
                Slot::Transition { group, action } => self.next_transition(group, action, now),
                Slot::RecordSamples => now + self.sample_period,
            };
            self.insert(entry.slot, next);
            tracing::debug!(slot = ?entry.slot, next = %next, "event fired, rescheduled");
            due.push(Firing {
                slot: entry.slot,
                scheduled_for: entry.fire_at,
            });
        }
        due
    }

    /// Replace a group's timer pair and requeue both transitions.
    ///
    /// Bumping the slot tokens invalidates anything already queued for the
    /// group, so the next tick observes only the new times.
    pub fn reconfigure(
        &mut self,
        group: DeviceGroup,
        on_mode: TriggerMode,
        off_mode: TriggerMode,
        now: Timestamp,
    ) {
        if let Some(schedule) = self.groups.get_mut(&group) {
            schedule.on_mode = on_mode;
            schedule.off_mode = off_mode;
        } else {
            return;
        }
        self.schedule_transitions(group, now);
        tracing::info!(%group, on = %on_mode, off = %off_mode, "timer reconfigured");
    }

    /// Enable or disable timer control for a group; the transition chain
    /// keeps running either way.
    pub fn set_enabled(&mut self, group: DeviceGroup, enabled: bool) {
        if let Some(schedule) = self.groups.get_mut(&group) {
            schedule.enabled = enabled;
            tracing::info!(%group, enabled, "timer control toggled");
        }
    }

    #[must_use]
    pub fn group(&self, group: DeviceGroup) -> Option<&GroupSchedule> {
        self.groups.get(&group)
    }

    /// Whether a sun-relative trigger is currently running on fallback
    /// values.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// The state a group should start in: on when the current instant falls
    /// inside the on-window (the next off fires before the next on).
    pub fn initial_action(&mut self, group: DeviceGroup, now: Timestamp) -> PowerState {
        let Some(schedule) = self.groups.get(&group).copied() else {
            return PowerState::Off;
        };
        let next_on = self.resolve(schedule.on_mode, now);
        let next_off = self.resolve(schedule.off_mode, now);
        if next_off < next_on {
            PowerState::On
        } else {
            PowerState::Off
        }
    }

    /// Live queued transitions, soonest first, for status reporting.
    #[must_use]
    pub fn pending_events(&self) -> Vec<ScheduledEvent> {
        let mut events: Vec<ScheduledEvent> = self
            .heap
            .iter()
            .filter_map(|Reverse(entry)| {
                if self.live.get(&entry.slot) != Some(&entry.seq) {
                    return None;
                }
                let Slot::Transition { group, action } = entry.slot else {
                    return None;
                };
                let schedule = self.groups.get(&group)?;
                let mode = if action == PowerState::On {
                    schedule.on_mode
                } else {
                    schedule.off_mode
                };
                Some(ScheduledEvent {
                    group,
                    action,
                    mode,
                    trigger_time: entry.fire_at,
                })
            })
            .collect();
        events.sort_by_key(|event| event.trigger_time);
        events
    }

    fn schedule_transitions(&mut self, group: DeviceGroup, now: Timestamp) {
        let Some(schedule) = self.groups.get(&group).copied() else {
            return;
        };
        let on_at = self.resolve(schedule.on_mode, now);
        let off_at = self.resolve(schedule.off_mode, now);
        self.insert(
            Slot::Transition {
                group,
                action: PowerState::On,
            },
            on_at,
        );
        self.insert(
            Slot::Transition {
                group,
                action: PowerState::Off,
            },
            off_at,
        );
    }

    fn insert(&mut self, slot: Slot, fire_at: Timestamp) {
        self.next_seq += 1;
        let seq = self.next_seq;
        self.live.insert(slot, seq);
        self.heap.push(Reverse(Entry { fire_at, seq, slot }));
    }

    fn next_transition(
        &mut self,
        group: DeviceGroup,
        action: PowerState,
        now: Timestamp,
    ) -> Timestamp {
        // Only slots inserted for configured groups ever reach here.
        let schedule = self.groups.get(&group).copied().unwrap_or(GroupSchedule {
            on_mode: TriggerMode::Fixed(TimeOfDay::MIDNIGHT),
            off_mode: TriggerMode::Fixed(TimeOfDay::MIDNIGHT),
            enabled: false,
        });
        let mode = if action == PowerState::On {
            schedule.on_mode
        } else {
            schedule.off_mode
        };
        self.resolve(mode, now)
    }

    /// Resolve a trigger mode to its next occurrence strictly after `now`.
    fn resolve(&mut self, mode: TriggerMode, now: Timestamp) -> Timestamp {
        if let TriggerMode::Fixed(time) = mode {
            return time.next_after(now, self.location.utc_offset);
        }
        let local_date = now.with_timezone(&self.location.utc_offset).date_naive();
        let today = self.sun_for(local_date);
        let tomorrow = self.sun_for(local_date + Duration::days(1));
        mode.next_after(now, self.location.utc_offset, &today, &tomorrow)
    }

    /// Solar times for a date, with the documented fallback chain:
    /// last valid value shifted to the requested date, else fixed
    /// sentinels (dusk 17:00, dawn 08:00 local).
    fn sun_for(&mut self, date: NaiveDate) -> SunTimes {
        match solar::sun_times(self.location.latitude, self.location.longitude, date) {
            Ok(times) => {
                self.last_sun = Some((date, times));
                self.degraded = false;
                times
            }
            Err(err) => {
                self.degraded = true;
                if let Some((valid_date, times)) = self.last_sun {
                    let shift = Duration::days(date.signed_duration_since(valid_date).num_days());
                    tracing::warn!(%err, %date, "solar calculation undefined, reusing last valid times");
                    SunTimes {
                        dawn: times.dawn + shift,
                        dusk: times.dusk + shift,
                    }
                } else {
                    tracing::warn!(%err, %date, "solar calculation undefined, using sentinel times");
                    self.sentinel_sun(date)
                }
            }
        }
    }

    fn sentinel_sun(&self, date: NaiveDate) -> SunTimes {
        let offset_secs = i64::from(self.location.utc_offset.local_minus_utc());
        let base = date
            .and_hms_opt(0, 0, 0)
            .map_or_else(Timestamp::default, |naive| naive.and_utc())
            - Duration::seconds(offset_secs);
        SunTimes {
            dawn: base + Duration::hours(8),
            dusk: base + Duration::hours(17),
        }
    }
}
