//! # hearth-app
//!
//! Application layer for hearth: the scheduling, device-state, and alerting
//! engine, plus the port traits adapters implement.
//!
//! ## Responsibilities
//! - **Ports**: `CommandBus` (publish/subscribe bridge), `SampleSink` /
//!   `SampleQuery` (sensor persistence), `Notifier` (alert dispatch)
//! - **Scheduler**: priority queue of daily transitions with lazy
//!   invalidation and sun-relative trigger resolution
//! - **Device registry**: last-known/desired state cache with
//!   desired-vs-observed reconciliation
//! - **Alerting engine**: threshold evaluation with flood suppression
//! - **Control loop**: the single task that owns all of the above and
//!   consumes ticks, bus events, and commands
//!
//! ## Dependency rule
//! Depends only on `hearth-domain`. Adapters depend on this crate and
//! implement its ports; they are injected at construction by the binary.

pub mod alerting;
pub mod control_loop;
pub mod ports;
pub mod registry;
pub mod scheduler;
