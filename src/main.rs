//! yield-pool-gateway server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints.

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use yield_pool_gateway::api;
use yield_pool_gateway::app_state::AppState;
use yield_pool_gateway::config::{GatewayConfig, LogFormat};
use yield_pool_gateway::domain::{AuthoritySet, EventBus, InMemoryLedger, PoolRegistry};
use yield_pool_gateway::persistence::{self, PostgresPersistence};
use yield_pool_gateway::service::{ChainClock, PoolService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = GatewayConfig::from_env()?;
    init_tracing(config.log_format);
    tracing::info!(addr = %config.listen_addr, "starting yield-pool-gateway");

    // Build domain layer, restoring the latest snapshot when persistence is on
    let store = if config.persistence_enabled {
        Some(PostgresPersistence::connect(&config).await?)
    } else {
        None
    };
    let registry = build_registry(&config, store.as_ref()).await?;
    let event_bus = EventBus::new(config.event_bus_capacity);
    let clock = ChainClock::resume(config.initial_block_height, &registry);
    tracing::info!(
        pools = registry.pool_count(),
        block_height = clock.height(),
        event_bus_capacity = event_bus.capacity(),
        persistence = config.persistence_enabled,
        "registry ready"
    );

    // Build service layer
    let pool_service = Arc::new(PoolService::new(registry, clock, event_bus));
    bootstrap_governance(&config, &pool_service).await?;

    let background = store
        .as_ref()
        .map(|p| persistence::spawn_background_tasks(p, &pool_service, &config))
        .unwrap_or_default();

    // Build router
    let app = api::build_app(AppState::new(Arc::clone(&pool_service)));

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    for handle in background {
        handle.abort();
    }
    if let Some(store) = store {
        let id = store
            .save_snapshot(&pool_service.snapshot().await)
            .await?;
        tracing::info!(snapshot_id = id, "final snapshot saved");
    }

    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

async fn build_registry(
    config: &GatewayConfig,
    persistence: Option<&PostgresPersistence>,
) -> anyhow::Result<PoolRegistry> {
    let authorities = Box::new(AuthoritySet::new(config.authorities.iter().cloned()));
    let ledger = Box::new(InMemoryLedger::new());

    if let Some(persistence) = persistence
        && let Some(row) = persistence.load_latest_snapshot().await?
    {
        tracing::info!(
            snapshot_id = row.id,
            pool_count = row.pool_count,
            taken_at = %row.snapshot_at,
            "restoring registry from snapshot"
        );
        return Ok(PoolRegistry::restore(row.snapshot, authorities, ledger)?);
    }

    Ok(PoolRegistry::new(config.registry_settings(), authorities, ledger))
}

async fn bootstrap_governance(
    config: &GatewayConfig,
    pool_service: &PoolService,
) -> anyhow::Result<()> {
    let Some(address) = config.governance_address.clone() else {
        return Ok(());
    };
    match pool_service.governance().await.governance_address {
        None => pool_service.set_governance_address(address).await?,
        Some(current) if current == address => {}
        Some(current) => {
            tracing::warn!(
                %current,
                configured = %address,
                "governance address already set, ignoring GOVERNANCE_ADDRESS"
            );
        }
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
