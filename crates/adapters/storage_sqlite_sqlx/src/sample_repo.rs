//! `SQLite` implementation of the sample sink and query ports.

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use hearth_app::ports::{SampleQuery, SampleSink};
use hearth_domain::error::HearthError;
use hearth_domain::sample::{Metric, SensorSample};
use hearth_domain::time::Timestamp;

use crate::error::StorageError;

/// Wrapper for converting database rows into domain types without polluting
/// domain structs with database concerns.
struct Wrapper(SensorSample);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let device: String = row.try_get("device")?;
        let metric_str: String = row.try_get("metric")?;
        let value: f64 = row.try_get("value")?;
        let recorded_at_str: String = row.try_get("recorded_at")?;

        let metric: Metric = serde_json::from_str(&format!("\"{metric_str}\""))
            .map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        let timestamp = chrono::DateTime::parse_from_rfc3339(&recorded_at_str)
            .map_err(|err| sqlx::Error::Decode(Box::new(err)))?
            .to_utc();

        Ok(Self(SensorSample {
            device,
            metric,
            value,
            timestamp,
        }))
    }
}

const INSERT: &str = r"
    INSERT INTO samples (device, metric, value, recorded_at)
    VALUES (?, ?, ?, ?)
";

const SELECT_RECENT: &str = r"
    SELECT device, metric, value, recorded_at FROM samples
    ORDER BY recorded_at DESC, id DESC
    LIMIT ?
";

const DELETE_BEFORE: &str = "DELETE FROM samples WHERE recorded_at < ?";

/// `SQLite`-backed sample store.
#[derive(Clone)]
pub struct SqliteSampleStore {
    pool: SqlitePool,
}

impl SqliteSampleStore {
    /// Create a new store using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl SampleSink for SqliteSampleStore {
    async fn append(&self, samples: Vec<SensorSample>) -> Result<(), HearthError> {
        let mut tx = self.pool.begin().await.map_err(StorageError::from)?;
        for sample in samples {
            sqlx::query(INSERT)
                .bind(&sample.device)
                .bind(sample.metric.to_string())
                .bind(sample.value)
                .bind(sample.timestamp.to_rfc3339())
                .execute(&mut *tx)
                .await
                .map_err(StorageError::from)?;
        }
        tx.commit().await.map_err(StorageError::from)?;
        Ok(())
    }

    async fn prune_older_than(&self, cutoff: Timestamp) -> Result<u64, HearthError> {
        let result = sqlx::query(DELETE_BEFORE)
            .bind(cutoff.to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(result.rows_affected())
    }
}

impl SampleQuery for SqliteSampleStore {
    async fn recent(&self, limit: u32) -> Result<Vec<SensorSample>, HearthError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_RECENT)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(|w| w.0).collect())
    }
}
