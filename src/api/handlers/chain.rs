//! Chain clock handlers.
//!
//! The registry has no clock of its own; these endpoints move the block
//! height that every mutation is stamped with.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::api::dto::{ChainResponse, SetBlockHeightRequest};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, GatewayError};

/// Request body for `POST /chain/advance`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AdvanceBlocksRequest {
    /// Number of blocks to move forward.
    pub blocks: u64,
}

async fn chain_state(state: &AppState) -> ChainResponse {
    ChainResponse {
        block_height: state.pool_service.clock().height(),
        reserve: state.pool_service.reserve().await.to_string(),
    }
}

/// `GET /chain` — Current block height and simulated reserve.
#[utoipa::path(
    get,
    path = "/api/v1/chain",
    tag = "Chain",
    summary = "Get chain state",
    responses(
        (status = 200, description = "Chain state", body = ChainResponse),
    )
)]
pub async fn get_chain(State(state): State<AppState>) -> impl IntoResponse {
    Json(chain_state(&state).await)
}

/// `POST /chain/height` — Move the clock to an absolute height.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] if the height would decrease.
#[utoipa::path(
    post,
    path = "/api/v1/chain/height",
    tag = "Chain",
    summary = "Set block height",
    request_body = SetBlockHeightRequest,
    responses(
        (status = 200, description = "Chain state", body = ChainResponse),
        (status = 400, description = "Height would decrease", body = ErrorResponse),
    )
)]
pub async fn set_height(
    State(state): State<AppState>,
    Json(req): Json<SetBlockHeightRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let height = state.pool_service.clock().set_height(req.height)?;
    tracing::debug!(height, "block height set");
    Ok(Json(chain_state(&state).await))
}

/// `POST /chain/advance` — Move the clock forward.
#[utoipa::path(
    post,
    path = "/api/v1/chain/advance",
    tag = "Chain",
    summary = "Advance block height",
    request_body = AdvanceBlocksRequest,
    responses(
        (status = 200, description = "Chain state", body = ChainResponse),
    )
)]
pub async fn advance(
    State(state): State<AppState>,
    Json(req): Json<AdvanceBlocksRequest>,
) -> impl IntoResponse {
    let height = state.pool_service.clock().advance(req.blocks);
    tracing::debug!(height, blocks = req.blocks, "block height advanced");
    Json(chain_state(&state).await)
}

/// Chain clock routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/chain", get(get_chain))
        .route("/chain/height", post(set_height))
        .route("/chain/advance", post(advance))
}
