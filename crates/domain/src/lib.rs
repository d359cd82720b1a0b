//! # hearth-domain
//!
//! Pure domain model for the hearth home automation controller.
//!
//! ## Responsibilities
//! - Foundational types: timestamps, times of day, error conventions
//! - Define **Devices** (bulbs, outlets, sensors) and their power state
//! - Define **Sensor samples** and the report payload shared with the bridge
//! - Define **Alert rules** and the hysteresis/cooldown state machine
//! - Define **Schedule triggers** (fixed, dusk, dawn) and next-occurrence math
//! - Compute **dusk/dawn** for a location and date (solar calculator)
//!
//! ## Dependency rule
//! This crate has **no internal dependencies** and performs no IO.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod alert;
pub mod device;
pub mod error;
pub mod sample;
pub mod schedule;
pub mod solar;
pub mod time;
