//! Pool-related DTOs for create, get, update and list operations.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::common_dto::{PaginationMeta, parse_amount};
use crate::domain::{NewPool, Pool, PoolId, PoolUpdate};
use crate::error::GatewayError;

/// Request body for `POST /pools`.
///
/// Enumerated fields are passed through as strings and validated by the
/// registry in its fixed order.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePoolRequest {
    /// Unique pool name (1–100 characters).
    pub name: String,
    /// Minimum single deposit (string-encoded u128).
    pub min_deposit: String,
    /// Pool capacity (string-encoded u128).
    pub max_deposit: String,
    /// Yield rate in percent (0–100).
    pub yield_rate: u32,
    /// Nominal lifetime.
    pub duration: u64,
    /// Withdrawal penalty in percent (0–50).
    pub penalty: u32,
    /// Deployment threshold (1–100).
    pub threshold: u32,
    /// `lending`, `staking` or `yield-farming`.
    pub pool_type: String,
    /// Interest rate (0–20).
    pub interest_rate: u32,
    /// Lock period in blocks (0–365).
    pub lock_period: u64,
    /// `STX` or `BTC`.
    pub currency: String,
    /// `alex`, `arkadiko` or `velar`.
    pub defi_protocol: String,
}

impl CreatePoolRequest {
    /// Converts the request into registry creation arguments.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] if an amount is not a
    /// non-negative integer.
    pub fn into_new_pool(self) -> Result<NewPool, GatewayError> {
        Ok(NewPool {
            min_deposit: parse_amount("min_deposit", &self.min_deposit)?,
            max_deposit: parse_amount("max_deposit", &self.max_deposit)?,
            name: self.name,
            yield_rate: self.yield_rate,
            duration: self.duration,
            penalty: self.penalty,
            threshold: self.threshold,
            pool_type: self.pool_type,
            interest_rate: self.interest_rate,
            lock_period: self.lock_period,
            currency: self.currency,
            defi_protocol: self.defi_protocol,
        })
    }
}

/// Response body for `POST /pools` (201 Created).
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreatePoolResponse {
    /// Allocated pool id.
    pub pool_id: u64,
    /// Pool name echoed from request.
    pub name: String,
    /// Block height of creation.
    pub created_at_block: u64,
}

/// Request body for `PUT /pools/{id}`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePoolRequest {
    /// New name.
    pub name: String,
    /// New minimum deposit (string-encoded u128).
    pub min_deposit: String,
    /// New capacity (string-encoded u128).
    pub max_deposit: String,
}

/// Request body for `PUT /pools/{id}/status`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SetPoolStatusRequest {
    /// `false` disables deposits, withdrawals and claims.
    pub active: bool,
}

/// Full pool state for `GET /pools/{id}`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PoolDetailResponse {
    /// Pool identifier.
    pub pool_id: u64,
    /// Pool name.
    pub name: String,
    /// Minimum single deposit.
    pub min_deposit: String,
    /// Capacity.
    pub max_deposit: String,
    /// Yield rate in percent.
    pub yield_rate: u32,
    /// Nominal lifetime.
    pub duration: u64,
    /// Withdrawal penalty in percent.
    pub penalty: u32,
    /// Deployment threshold.
    pub threshold: u32,
    /// Block height of creation or last rename.
    pub timestamp: u64,
    /// Creator identity.
    pub creator: String,
    /// Pool type.
    pub pool_type: String,
    /// Interest rate.
    pub interest_rate: u32,
    /// Lock period in blocks.
    pub lock_period: u64,
    /// Currency tag.
    pub currency: String,
    /// DeFi protocol.
    pub defi_protocol: String,
    /// Whether the pool is active.
    pub status: bool,
    /// Total deposited.
    pub total_deposited: String,
    /// Total shares.
    pub total_shares: String,
}

impl PoolDetailResponse {
    /// Builds the response from a registry pool.
    #[must_use]
    pub fn from_pool(pool_id: PoolId, pool: &Pool) -> Self {
        Self {
            pool_id: pool_id.get(),
            name: pool.name.clone(),
            min_deposit: pool.min_deposit.to_string(),
            max_deposit: pool.max_deposit.to_string(),
            yield_rate: pool.yield_rate,
            duration: pool.duration,
            penalty: pool.penalty,
            threshold: pool.threshold,
            timestamp: pool.timestamp,
            creator: pool.creator.to_string(),
            pool_type: pool.pool_type.to_string(),
            interest_rate: pool.interest_rate,
            lock_period: pool.lock_period,
            currency: pool.currency.to_string(),
            defi_protocol: pool.defi_protocol.to_string(),
            status: pool.status,
            total_deposited: pool.total_deposited.to_string(),
            total_shares: pool.total_shares.to_string(),
        }
    }
}

/// Pool summary for list responses.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PoolSummaryDto {
    /// Pool identifier.
    pub pool_id: u64,
    /// Pool name.
    pub name: String,
    /// Pool type.
    pub pool_type: String,
    /// Currency tag.
    pub currency: String,
    /// Whether the pool is active.
    pub status: bool,
    /// Total deposited.
    pub total_deposited: String,
    /// Capacity.
    pub max_deposit: String,
}

impl PoolSummaryDto {
    /// Builds the summary from a registry pool.
    #[must_use]
    pub fn from_pool(pool_id: PoolId, pool: &Pool) -> Self {
        Self {
            pool_id: pool_id.get(),
            name: pool.name.clone(),
            pool_type: pool.pool_type.to_string(),
            currency: pool.currency.to_string(),
            status: pool.status,
            total_deposited: pool.total_deposited.to_string(),
            max_deposit: pool.max_deposit.to_string(),
        }
    }
}

/// Paginated list response for `GET /pools`.
#[derive(Debug, Serialize, ToSchema)]
pub struct PoolListResponse {
    /// Pool summaries.
    pub data: Vec<PoolSummaryDto>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}

/// Response body for `GET /pools/count`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PoolCountResponse {
    /// Number of pools ever created.
    pub count: u64,
}

/// Response body for `GET /pools/by-name/{name}`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PoolExistenceResponse {
    /// Queried name.
    pub name: String,
    /// Whether a pool currently has this name.
    pub exists: bool,
    /// Id of that pool, if any.
    pub pool_id: Option<u64>,
}

/// Response body for `GET /pools/{id}/last-update`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PoolUpdateResponse {
    /// Pool identifier.
    pub pool_id: u64,
    /// Name after the update.
    pub name: String,
    /// Minimum deposit after the update.
    pub min_deposit: String,
    /// Capacity after the update.
    pub max_deposit: String,
    /// Block height of the update.
    pub updated_at_block: u64,
    /// Account that performed it.
    pub updater: String,
}

impl PoolUpdateResponse {
    /// Builds the response from an audit record.
    #[must_use]
    pub fn from_update(pool_id: PoolId, update: &PoolUpdate) -> Self {
        Self {
            pool_id: pool_id.get(),
            name: update.update_name.clone(),
            min_deposit: update.update_min_deposit.to_string(),
            max_deposit: update.update_max_deposit.to_string(),
            updated_at_block: update.update_timestamp,
            updater: update.updater.to_string(),
        }
    }
}
