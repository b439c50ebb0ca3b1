//! PostgreSQL implementation of the persistence layer.

use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;

use super::models::SnapshotRow;
use crate::config::GatewayConfig;
use crate::domain::{PoolEvent, RegistrySnapshot};
use crate::error::GatewayError;

fn db_error(e: impl std::fmt::Display) -> GatewayError {
    GatewayError::PersistenceError(e.to_string())
}

/// PostgreSQL-backed persistence layer using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresPersistence {
    pool: PgPool,
}

impl PostgresPersistence {
    /// Creates a new persistence layer with the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects using the database settings of `config` and applies the
    /// bundled migrations.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] if the connection or a
    /// migration fails.
    pub async fn connect(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect(&config.database_url)
            .await
            .map_err(db_error)?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(db_error)?;
        Ok(Self::new(pool))
    }

    /// Appends an event to the event log.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on database failure.
    pub async fn save_event(&self, event: &PoolEvent) -> Result<i64, GatewayError> {
        let pool_id = event
            .pool_id()
            .map(|id| i64::try_from(id.get()))
            .transpose()
            .map_err(db_error)?;
        let block_height = i64::try_from(event.block_height()).map_err(db_error)?;
        let payload = serde_json::to_value(event).map_err(db_error)?;

        sqlx::query_scalar::<_, i64>(
            "INSERT INTO events (pool_id, event_type, block_height, payload) \
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(pool_id)
        .bind(event.event_type_str())
        .bind(block_height)
        .bind(payload)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)
    }

    /// Saves a registry snapshot.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on database failure.
    pub async fn save_snapshot(&self, snapshot: &RegistrySnapshot) -> Result<i64, GatewayError> {
        let pool_count = i64::try_from(snapshot.next_pool_id).map_err(db_error)?;
        sqlx::query_scalar::<_, i64>(
            "INSERT INTO registry_snapshots (pool_count, snapshot) VALUES ($1, $2) RETURNING id",
        )
        .bind(pool_count)
        .bind(Json(snapshot))
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)
    }

    /// Loads the most recent snapshot, if any.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on database failure or
    /// if the stored image cannot be decoded.
    pub async fn load_latest_snapshot(&self) -> Result<Option<SnapshotRow>, GatewayError> {
        let row = sqlx::query_as::<_, (i64, i64, Json<RegistrySnapshot>, DateTime<Utc>)>(
            "SELECT id, pool_count, snapshot, snapshot_at FROM registry_snapshots \
             ORDER BY snapshot_at DESC, id DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(row.map(|(id, pool_count, Json(snapshot), snapshot_at)| SnapshotRow {
            id,
            pool_count,
            snapshot,
            snapshot_at,
        }))
    }

    /// Deletes snapshots older than the given number of days, always
    /// keeping the newest one.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on database failure.
    pub async fn delete_old_snapshots(&self, before_days: u64) -> Result<u64, GatewayError> {
        let cutoff = i64::try_from(before_days)
            .ok()
            .and_then(chrono::Duration::try_days)
            .and_then(|age| Utc::now().checked_sub_signed(age))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);

        let result = sqlx::query(
            "DELETE FROM registry_snapshots WHERE snapshot_at < $1 \
             AND id <> (SELECT id FROM registry_snapshots ORDER BY snapshot_at DESC, id DESC LIMIT 1)",
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(result.rows_affected())
    }
}
