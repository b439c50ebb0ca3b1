//! Pool lifecycle handlers: create, list, get, update, status and lookups.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};

use crate::api::dto::{
    CreatePoolRequest, CreatePoolResponse, PaginationMeta, PoolCountResponse, PoolDetailResponse,
    PoolExistenceResponse, PoolListParams, PoolListResponse, PoolSummaryDto, PoolUpdateResponse,
    SetPoolStatusRequest, UpdatePoolRequest, parse_amount,
};
use crate::api::extract::Caller;
use crate::app_state::AppState;
use crate::domain::{PoolId, PoolType};
use crate::error::{ErrorResponse, GatewayError};

/// `POST /pools` — Create a new pool.
///
/// # Errors
///
/// Returns [`GatewayError`] on any validation, governance or fee failure.
#[utoipa::path(
    post,
    path = "/api/v1/pools",
    tag = "Pools",
    summary = "Create a pool",
    description = "Validates the pool terms, charges the creation fee to the governance address and registers the pool under the next id.",
    request_body = CreatePoolRequest,
    params(("x-principal" = String, Header, description = "Caller identity")),
    responses(
        (status = 201, description = "Pool created", body = CreatePoolResponse),
        (status = 400, description = "Invalid pool terms", body = ErrorResponse),
        (status = 403, description = "Caller is not an authority", body = ErrorResponse),
        (status = 409, description = "Name taken", body = ErrorResponse),
        (status = 422, description = "Registry full, governance unset or fee refused", body = ErrorResponse),
    )
)]
pub async fn create_pool(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Json(req): Json<CreatePoolRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let args = req.into_new_pool()?;
    let (pool_id, created_at_block) = state.pool_service.create_pool(&caller, &args).await?;

    let response = CreatePoolResponse {
        pool_id: pool_id.get(),
        name: args.name,
        created_at_block,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// `GET /pools` — List pools with pagination and optional type filter.
///
/// # Errors
///
/// Returns [`GatewayError`] if the `pool_type` filter is not a known type.
#[utoipa::path(
    get,
    path = "/api/v1/pools",
    tag = "Pools",
    summary = "List pools",
    description = "Returns a paginated list of pools in id order, optionally filtered by type.",
    params(PoolListParams),
    responses(
        (status = 200, description = "Paginated pool list", body = PoolListResponse),
        (status = 400, description = "Unknown pool type filter", body = ErrorResponse),
    )
)]
pub async fn list_pools(
    State(state): State<AppState>,
    Query(params): Query<PoolListParams>,
) -> Result<impl IntoResponse, GatewayError> {
    let params = params.clamped();
    let filter = params
        .pool_type
        .as_deref()
        .map(str::parse::<PoolType>)
        .transpose()?;
    let pools = state.pool_service.list_pools(filter).await;

    let total = u32::try_from(pools.len()).unwrap_or(u32::MAX);
    let per_page = params.per_page;
    let page = params.page;
    let total_pages = if total == 0 {
        0
    } else {
        total.div_ceil(per_page)
    };

    let start = ((page - 1) as usize).saturating_mul(per_page as usize);
    let data: Vec<PoolSummaryDto> = pools
        .iter()
        .skip(start)
        .take(per_page as usize)
        .map(|(id, pool)| PoolSummaryDto::from_pool(*id, pool))
        .collect();

    Ok(Json(PoolListResponse {
        data,
        pagination: PaginationMeta {
            page,
            per_page,
            total,
            total_pages,
        },
    }))
}

/// `GET /pools/count` — Number of pools ever created.
#[utoipa::path(
    get,
    path = "/api/v1/pools/count",
    tag = "Pools",
    summary = "Count pools",
    responses(
        (status = 200, description = "Pool count", body = PoolCountResponse),
    )
)]
pub async fn pool_count(State(state): State<AppState>) -> impl IntoResponse {
    Json(PoolCountResponse {
        count: state.pool_service.pool_count().await,
    })
}

/// `GET /pools/by-name/{name}` — Check whether a name is registered.
#[utoipa::path(
    get,
    path = "/api/v1/pools/by-name/{name}",
    tag = "Pools",
    summary = "Look up a pool by name",
    params(("name" = String, Path, description = "Pool name")),
    responses(
        (status = 200, description = "Name lookup result", body = PoolExistenceResponse),
    )
)]
pub async fn find_by_name(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    let pool_id = state.pool_service.find_by_name(&name).await;
    Json(PoolExistenceResponse {
        name,
        exists: pool_id.is_some(),
        pool_id: pool_id.map(PoolId::get),
    })
}

/// `GET /pools/{id}` — Get pool details.
///
/// # Errors
///
/// Returns [`GatewayError`] with code 107 if the pool does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/pools/{id}",
    tag = "Pools",
    summary = "Get pool details",
    params(("id" = u64, Path, description = "Pool id")),
    responses(
        (status = 200, description = "Pool details", body = PoolDetailResponse),
        (status = 404, description = "Pool not found", body = ErrorResponse),
    )
)]
pub async fn get_pool(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<impl IntoResponse, GatewayError> {
    let pool_id = PoolId::new(id);
    let pool = state.pool_service.get_pool(pool_id).await?;
    Ok(Json(PoolDetailResponse::from_pool(pool_id, &pool)))
}

/// `PUT /pools/{id}` — Rename and resize a pool.
///
/// # Errors
///
/// Returns [`GatewayError`] if the caller is not the creator or the new
/// terms are invalid.
#[utoipa::path(
    put,
    path = "/api/v1/pools/{id}",
    tag = "Pools",
    summary = "Update a pool",
    description = "Creator-only. Changes name, minimum deposit and capacity, and records an audit entry.",
    request_body = UpdatePoolRequest,
    params(
        ("id" = u64, Path, description = "Pool id"),
        ("x-principal" = String, Header, description = "Caller identity"),
    ),
    responses(
        (status = 200, description = "Updated pool", body = PoolDetailResponse),
        (status = 400, description = "Invalid terms", body = ErrorResponse),
        (status = 403, description = "Caller is not the creator", body = ErrorResponse),
        (status = 404, description = "Pool not found", body = ErrorResponse),
    )
)]
pub async fn update_pool(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<u64>,
    Json(req): Json<UpdatePoolRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let pool_id = PoolId::new(id);
    let min_deposit = parse_amount("min_deposit", &req.min_deposit)?;
    let max_deposit = parse_amount("max_deposit", &req.max_deposit)?;
    let pool = state
        .pool_service
        .update_pool(&caller, pool_id, &req.name, min_deposit, max_deposit)
        .await?;
    Ok(Json(PoolDetailResponse::from_pool(pool_id, &pool)))
}

/// `PUT /pools/{id}/status` — Enable or disable a pool.
///
/// # Errors
///
/// Returns [`GatewayError`] if the caller is not the creator.
#[utoipa::path(
    put,
    path = "/api/v1/pools/{id}/status",
    tag = "Pools",
    summary = "Set pool status",
    description = "Creator-only. A disabled pool rejects deposits, withdrawals and claims.",
    request_body = SetPoolStatusRequest,
    params(
        ("id" = u64, Path, description = "Pool id"),
        ("x-principal" = String, Header, description = "Caller identity"),
    ),
    responses(
        (status = 200, description = "Updated pool", body = PoolDetailResponse),
        (status = 403, description = "Caller is not the creator", body = ErrorResponse),
        (status = 404, description = "Pool not found", body = ErrorResponse),
    )
)]
pub async fn set_pool_status(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<u64>,
    Json(req): Json<SetPoolStatusRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let pool_id = PoolId::new(id);
    state
        .pool_service
        .set_pool_status(&caller, pool_id, req.active)
        .await?;
    let pool = state.pool_service.get_pool(pool_id).await?;
    Ok(Json(PoolDetailResponse::from_pool(pool_id, &pool)))
}

/// `GET /pools/{id}/last-update` — Most recent update record.
///
/// Responds with `null` when the pool has never been updated.
///
/// # Errors
///
/// Returns [`GatewayError`] with code 107 if the pool does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/pools/{id}/last-update",
    tag = "Pools",
    summary = "Get the last update record",
    params(("id" = u64, Path, description = "Pool id")),
    responses(
        (status = 200, description = "Last update, or null", body = Option<PoolUpdateResponse>),
        (status = 404, description = "Pool not found", body = ErrorResponse),
    )
)]
pub async fn last_update(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<impl IntoResponse, GatewayError> {
    let pool_id = PoolId::new(id);
    let update = state.pool_service.last_update(pool_id).await?;
    Ok(Json(
        update.map(|u| PoolUpdateResponse::from_update(pool_id, &u)),
    ))
}

/// Pool routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/pools", post(create_pool).get(list_pools))
        .route("/pools/count", get(pool_count))
        .route("/pools/by-name/{name}", get(find_by_name))
        .route("/pools/{id}", get(get_pool).put(update_pool))
        .route("/pools/{id}/status", put(set_pool_status))
        .route("/pools/{id}/last-update", get(last_update))
}
