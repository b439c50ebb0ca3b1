//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::domain::EventBus;
use crate::service::PoolService;

/// Handles shared by the REST and WebSocket layers via Axum's `State`
/// extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Single writer over the pool registry.
    pub pool_service: Arc<PoolService>,
    /// Event bus that WebSocket connections subscribe to.
    pub event_bus: EventBus,
}

impl AppState {
    /// Builds the state around `pool_service`, sharing its event bus.
    #[must_use]
    pub fn new(pool_service: Arc<PoolService>) -> Self {
        let event_bus = pool_service.event_bus().clone();
        Self {
            pool_service,
            event_bus,
        }
    }
}
