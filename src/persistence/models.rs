//! Database models for registry snapshots.

use chrono::{DateTime, Utc};

use crate::domain::RegistrySnapshot;

/// A row from the `registry_snapshots` table.
#[derive(Debug, Clone)]
pub struct SnapshotRow {
    /// Auto-increment row ID.
    pub id: i64,
    /// Pools created at snapshot time.
    pub pool_count: i64,
    /// The registry image.
    pub snapshot: RegistrySnapshot,
    /// Snapshot timestamp.
    pub snapshot_at: DateTime<Utc>,
}
