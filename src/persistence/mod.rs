//! Persistence layer: PostgreSQL event log and registry snapshots.
//!
//! The registry stays in memory; PostgreSQL holds an append-only event log
//! and periodic whole-registry snapshots, the latest of which is restored
//! at startup. Both background tasks are spawned by [`spawn_background_tasks`].

pub mod models;
pub mod postgres;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

pub use postgres::PostgresPersistence;

use crate::config::GatewayConfig;
use crate::domain::EventBus;
use crate::service::PoolService;

/// Subscribes to the event bus and appends every event to the event log.
///
/// The task ends when the bus is closed. Lagged events are logged and
/// skipped; a failed insert is logged and does not stop the task.
pub fn spawn_event_logger(persistence: PostgresPersistence, event_bus: &EventBus) -> JoinHandle<()> {
    let mut rx = event_bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if let Err(e) = persistence.save_event(&event).await {
                        tracing::error!(
                            error = %e,
                            event_type = event.event_type_str(),
                            "failed to persist event"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "event logger lagged behind event bus");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        tracing::debug!("event logger stopped");
    })
}

/// Periodically snapshots the registry and prunes snapshots older than
/// `cleanup_after_days` (0 keeps everything).
pub fn spawn_snapshotter(
    persistence: PostgresPersistence,
    pool_service: Arc<PoolService>,
    interval: Duration,
    cleanup_after_days: u64,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let snapshot = pool_service.snapshot().await;
            match persistence.save_snapshot(&snapshot).await {
                Ok(id) => tracing::debug!(snapshot_id = id, pools = snapshot.pools.len(), "snapshot saved"),
                Err(e) => tracing::error!(error = %e, "failed to save snapshot"),
            }
            if cleanup_after_days > 0 {
                match persistence.delete_old_snapshots(cleanup_after_days).await {
                    Ok(0) => {}
                    Ok(n) => tracing::info!(deleted = n, "old snapshots pruned"),
                    Err(e) => tracing::error!(error = %e, "failed to prune snapshots"),
                }
            }
        }
    })
}

/// Spawns the enabled persistence tasks according to `config`.
pub fn spawn_background_tasks(
    persistence: &PostgresPersistence,
    pool_service: &Arc<PoolService>,
    config: &GatewayConfig,
) -> Vec<JoinHandle<()>> {
    let mut handles = Vec::new();
    if config.event_log_enabled {
        handles.push(spawn_event_logger(
            persistence.clone(),
            pool_service.event_bus(),
        ));
    }
    if config.snapshot_interval_secs > 0 {
        handles.push(spawn_snapshotter(
            persistence.clone(),
            Arc::clone(pool_service),
            Duration::from_secs(config.snapshot_interval_secs),
            config.cleanup_after_days,
        ));
    }
    handles
}
