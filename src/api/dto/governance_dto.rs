//! Governance and chain-clock DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::service::GovernanceInfo;

/// Request body for `POST /governance/address`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SetGovernanceAddressRequest {
    /// Governance address; cannot be the burn address.
    pub address: String,
}

/// Request body for `PUT /governance/fee`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SetCreationFeeRequest {
    /// New creation fee (string-encoded u128).
    pub fee: String,
}

/// Response body for `GET /governance`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GovernanceResponse {
    /// Governance address, once set.
    pub governance_address: Option<String>,
    /// Current creation fee.
    pub creation_fee: String,
    /// Registry capacity.
    pub max_pools: u64,
    /// Pools created so far.
    pub pool_count: u64,
}

impl From<GovernanceInfo> for GovernanceResponse {
    fn from(info: GovernanceInfo) -> Self {
        Self {
            governance_address: info.governance_address.map(|a| a.to_string()),
            creation_fee: info.creation_fee.to_string(),
            max_pools: info.max_pools,
            pool_count: info.pool_count,
        }
    }
}

/// Request body for `POST /chain/height`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SetBlockHeightRequest {
    /// New block height; must not be below the current one.
    pub height: u64,
}

/// Response body for the chain endpoints.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChainResponse {
    /// Current block height.
    pub block_height: u64,
    /// Simulated contract reserve (string-encoded i128).
    pub reserve: String,
}
