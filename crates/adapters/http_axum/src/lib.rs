//! # hearth-adapter-http-axum
//!
//! HTTP control surface built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve a JSON API for status, group switching, brightness, timer, and
//!   alert-threshold control
//! - Map HTTP requests into control-loop commands (driving adapter)
//! - Map loop snapshots and stored samples into JSON responses
//!
//! Handlers never touch engine state directly: mutations go through the
//! loop's command channel and reads come from the status watch channel and
//! the sample query port, so the single-writer model holds.
//!
//! ## Dependency rule
//! Depends on `hearth-app` (for the handle and port traits) and
//! `hearth-domain` (for types used in request/response mapping). Never leaks
//! axum types into the domain.

pub mod api;
mod error;
mod router;
mod state;

pub use error::ApiError;
pub use router::build;
pub use state::AppState;
