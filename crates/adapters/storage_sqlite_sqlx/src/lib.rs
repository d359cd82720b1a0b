//! # hearth-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the `SampleSink` / `SampleQuery` ports from `hearth-app`
//! - Manage the `SQLite` connection pool lifecycle
//! - Run database migrations (sqlx embedded migrations)
//! - Map between domain types and database rows
//!
//! ## Dependency rule
//! Depends on `hearth-app` (for port traits) and `hearth-domain` (for domain
//! types). The `app` and `domain` crates must never reference this adapter.

mod error;
mod pool;
mod sample_repo;

pub use error::StorageError;
pub use pool::Database;
pub use sample_repo::SqliteSampleStore;
