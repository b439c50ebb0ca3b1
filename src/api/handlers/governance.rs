//! Governance handlers: one-time address bootstrap and creation fee.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};

use crate::api::dto::{
    GovernanceResponse, SetCreationFeeRequest, SetGovernanceAddressRequest, parse_amount,
};
use crate::app_state::AppState;
use crate::domain::Principal;
use crate::error::{ErrorResponse, GatewayError};

/// `GET /governance` — Governance scalars and counters.
#[utoipa::path(
    get,
    path = "/api/v1/governance",
    tag = "Governance",
    summary = "Get governance state",
    responses(
        (status = 200, description = "Governance state", body = GovernanceResponse),
    )
)]
pub async fn get_governance(State(state): State<AppState>) -> impl IntoResponse {
    Json(GovernanceResponse::from(state.pool_service.governance().await))
}

/// `POST /governance/address` — Set the governance address once.
///
/// # Errors
///
/// Returns [`GatewayError`] if the address is the burn address or the
/// governance address was already set.
#[utoipa::path(
    post,
    path = "/api/v1/governance/address",
    tag = "Governance",
    summary = "Set the governance address",
    description = "One-shot. The address receives every pool creation fee.",
    request_body = SetGovernanceAddressRequest,
    responses(
        (status = 201, description = "Governance address set", body = GovernanceResponse),
        (status = 400, description = "Burn address", body = ErrorResponse),
        (status = 409, description = "Already set", body = ErrorResponse),
    )
)]
pub async fn set_governance_address(
    State(state): State<AppState>,
    Json(req): Json<SetGovernanceAddressRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let address = req.address.trim();
    if address.is_empty() {
        return Err(GatewayError::InvalidRequest("address must not be empty".into()));
    }
    state
        .pool_service
        .set_governance_address(Principal::new(address))
        .await?;
    let info = state.pool_service.governance().await;
    Ok((StatusCode::CREATED, Json(GovernanceResponse::from(info))))
}

/// `PUT /governance/fee` — Change the pool creation fee.
///
/// # Errors
///
/// Returns [`GatewayError`] if no governance address is configured.
#[utoipa::path(
    put,
    path = "/api/v1/governance/fee",
    tag = "Governance",
    summary = "Set the creation fee",
    request_body = SetCreationFeeRequest,
    responses(
        (status = 200, description = "Fee updated", body = GovernanceResponse),
        (status = 400, description = "Invalid fee", body = ErrorResponse),
        (status = 422, description = "Governance not configured", body = ErrorResponse),
    )
)]
pub async fn set_creation_fee(
    State(state): State<AppState>,
    Json(req): Json<SetCreationFeeRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let fee = parse_amount("fee", &req.fee)?;
    state.pool_service.set_creation_fee(fee).await?;
    let info = state.pool_service.governance().await;
    Ok(Json(GovernanceResponse::from(info)))
}

/// Governance routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/governance", get(get_governance))
        .route("/governance/address", post(set_governance_address))
        .route("/governance/fee", put(set_creation_fee))
}
