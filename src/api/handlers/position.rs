//! Participant position handlers: deposit, withdraw, deploy, claim, shares.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{
    ClaimResponse, DepositRequest, DeployResponse, ShareResponse, WithdrawResponse, parse_amount,
};
use crate::api::extract::Caller;
use crate::app_state::AppState;
use crate::domain::{PoolId, Principal};
use crate::error::{ErrorResponse, GatewayError};

/// `POST /pools/{id}/deposit` — Join a pool.
///
/// # Errors
///
/// Returns [`GatewayError`] if the pool is inactive, full, the amount is
/// out of range or the caller already holds a position.
#[utoipa::path(
    post,
    path = "/api/v1/pools/{id}/deposit",
    tag = "Positions",
    summary = "Deposit into a pool",
    description = "Mints shares 1:1 with the deposited amount and starts the lock period.",
    request_body = DepositRequest,
    params(
        ("id" = u64, Path, description = "Pool id"),
        ("x-principal" = String, Header, description = "Caller identity"),
    ),
    responses(
        (status = 200, description = "Position opened", body = ShareResponse),
        (status = 400, description = "Invalid amount", body = ErrorResponse),
        (status = 404, description = "Pool not found", body = ErrorResponse),
        (status = 409, description = "Already in pool", body = ErrorResponse),
        (status = 422, description = "Pool inactive or full", body = ErrorResponse),
    )
)]
pub async fn deposit(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<u64>,
    Json(req): Json<DepositRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let pool_id = PoolId::new(id);
    let amount = parse_amount("amount", &req.amount)?;
    let share = state.pool_service.deposit(&caller, pool_id, amount).await?;
    Ok(Json(ShareResponse::from_share(pool_id, &caller, &share)))
}

/// `POST /pools/{id}/withdraw` — Leave a pool.
///
/// # Errors
///
/// Returns [`GatewayError`] if the caller holds no position or funds are
/// still locked.
#[utoipa::path(
    post,
    path = "/api/v1/pools/{id}/withdraw",
    tag = "Positions",
    summary = "Withdraw from a pool",
    description = "Burns the whole position and pays it out minus the pool's penalty.",
    params(
        ("id" = u64, Path, description = "Pool id"),
        ("x-principal" = String, Header, description = "Caller identity"),
    ),
    responses(
        (status = 200, description = "Withdrawal paid", body = WithdrawResponse),
        (status = 404, description = "Pool not found or no position", body = ErrorResponse),
        (status = 422, description = "Funds locked or pool inactive", body = ErrorResponse),
    )
)]
pub async fn withdraw(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<u64>,
) -> Result<impl IntoResponse, GatewayError> {
    let pool_id = PoolId::new(id);
    let withdrawal = state.pool_service.withdraw(&caller, pool_id).await?;
    Ok(Json(WithdrawResponse::from_withdrawal(pool_id, &withdrawal)))
}

/// `POST /pools/{id}/deploy` — Acknowledge deployment to the pool's protocol.
///
/// # Errors
///
/// Returns [`GatewayError`] if the caller is not the creator or the
/// deposits are below the threshold.
#[utoipa::path(
    post,
    path = "/api/v1/pools/{id}/deploy",
    tag = "Positions",
    summary = "Deploy pool funds",
    description = "Creator-only threshold check. Moves no funds.",
    params(
        ("id" = u64, Path, description = "Pool id"),
        ("x-principal" = String, Header, description = "Caller identity"),
    ),
    responses(
        (status = 200, description = "Deployment acknowledged", body = DeployResponse),
        (status = 403, description = "Caller is not the creator", body = ErrorResponse),
        (status = 404, description = "Pool not found", body = ErrorResponse),
        (status = 422, description = "Threshold not met", body = ErrorResponse),
    )
)]
pub async fn deploy(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<u64>,
) -> Result<impl IntoResponse, GatewayError> {
    let pool_id = PoolId::new(id);
    state.pool_service.deploy_to_defi(&caller, pool_id).await?;
    Ok(Json(DeployResponse {
        pool_id: id,
        deployed: true,
    }))
}

/// `POST /pools/{id}/claim` — Claim accrued yield.
///
/// # Errors
///
/// Returns [`GatewayError`] if the pool is inactive or the caller holds
/// no position.
#[utoipa::path(
    post,
    path = "/api/v1/pools/{id}/claim",
    tag = "Positions",
    summary = "Claim yield",
    description = "Pays yield accrued linearly since the last claim and resets the claim height.",
    params(
        ("id" = u64, Path, description = "Pool id"),
        ("x-principal" = String, Header, description = "Caller identity"),
    ),
    responses(
        (status = 200, description = "Yield paid", body = ClaimResponse),
        (status = 404, description = "Pool not found or no position", body = ErrorResponse),
        (status = 422, description = "Pool inactive", body = ErrorResponse),
    )
)]
pub async fn claim(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<u64>,
) -> Result<impl IntoResponse, GatewayError> {
    let pool_id = PoolId::new(id);
    let amount = state.pool_service.claim_yield(&caller, pool_id).await?;
    let share = state.pool_service.user_share(pool_id, &caller).await?;
    Ok(Json(ClaimResponse {
        pool_id: id,
        amount: amount.to_string(),
        claimed_at_block: share.last_claim,
    }))
}

/// `GET /pools/{id}/shares/{principal}` — Position of a participant.
///
/// # Errors
///
/// Returns [`GatewayError`] if the pool does not exist or the participant
/// holds no position.
#[utoipa::path(
    get,
    path = "/api/v1/pools/{id}/shares/{principal}",
    tag = "Positions",
    summary = "Get a participant's position",
    params(
        ("id" = u64, Path, description = "Pool id"),
        ("principal" = String, Path, description = "Participant identity"),
    ),
    responses(
        (status = 200, description = "Position", body = ShareResponse),
        (status = 404, description = "Pool not found or no position", body = ErrorResponse),
    )
)]
pub async fn get_share(
    State(state): State<AppState>,
    Path((id, principal)): Path<(u64, String)>,
) -> Result<impl IntoResponse, GatewayError> {
    let pool_id = PoolId::new(id);
    let participant = Principal::new(principal);
    let share = state.pool_service.user_share(pool_id, &participant).await?;
    Ok(Json(ShareResponse::from_share(pool_id, &participant, &share)))
}

/// Position routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/pools/{id}/deposit", post(deposit))
        .route("/pools/{id}/withdraw", post(withdraw))
        .route("/pools/{id}/deploy", post(deploy))
        .route("/pools/{id}/claim", post(claim))
        .route("/pools/{id}/shares/{principal}", get(get_share))
}
