//! System endpoints: health check and the pool enumeration catalog.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;
use crate::domain::{Currency, DefiProtocol, PoolType};
use crate::domain::pool::{
    MAX_INTEREST_RATE, MAX_LOCK_PERIOD, MAX_PENALTY, MAX_THRESHOLD, MAX_YIELD_RATE,
};

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
}

/// `GET /health` — Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health status, version, and current timestamp.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// Accepted values and bounds for pool creation.
#[derive(Debug, Serialize, ToSchema)]
pub struct PoolCatalog {
    pool_types: Vec<&'static str>,
    currencies: Vec<&'static str>,
    defi_protocols: Vec<&'static str>,
    max_yield_rate: u32,
    max_penalty: u32,
    max_threshold: u32,
    max_interest_rate: u32,
    max_lock_period: u64,
}

/// `GET /config/pool-types` — Accepted pool enumerations and bounds.
#[utoipa::path(
    get,
    path = "/config/pool-types",
    tag = "System",
    summary = "List accepted pool parameters",
    description = "Returns the closed sets of pool types, currencies and DeFi protocols, and the upper bounds of the numeric pool terms.",
    responses(
        (status = 200, description = "Pool catalog", body = PoolCatalog),
    )
)]
pub async fn pool_types_handler() -> impl IntoResponse {
    let catalog = PoolCatalog {
        pool_types: PoolType::ALL.iter().map(|t| t.as_str()).collect(),
        currencies: Currency::ALL.iter().map(|c| c.as_str()).collect(),
        defi_protocols: DefiProtocol::ALL.iter().map(|p| p.as_str()).collect(),
        max_yield_rate: MAX_YIELD_RATE,
        max_penalty: MAX_PENALTY,
        max_threshold: MAX_THRESHOLD,
        max_interest_rate: MAX_INTEREST_RATE,
        max_lock_period: MAX_LOCK_PERIOD,
    };
    (StatusCode::OK, Json(catalog))
}

/// System routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/config/pool-types", get(pool_types_handler))
}
