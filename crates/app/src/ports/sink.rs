//! Sample persistence ports. Schema and file layout are owned by the
//! storage adapter; the core only appends and prunes.

use std::future::Future;

use hearth_domain::error::HearthError;
use hearth_domain::sample::SensorSample;
use hearth_domain::time::Timestamp;

/// Append-only sink for sensor samples.
pub trait SampleSink: Send + Sync {
    /// Append a batch of samples.
    fn append(
        &self,
        samples: Vec<SensorSample>,
    ) -> impl Future<Output = Result<(), HearthError>> + Send;

    /// Delete samples recorded before `cutoff`. Returns the number removed.
    fn prune_older_than(
        &self,
        cutoff: Timestamp,
    ) -> impl Future<Output = Result<u64, HearthError>> + Send;
}

/// Read side used by the control surface; kept separate so the engine only
/// ever holds the write half.
pub trait SampleQuery: Send + Sync {
    /// The most recent samples, newest first.
    fn recent(
        &self,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<SensorSample>, HearthError>> + Send;
}
