//! Participant position DTOs: deposit, withdraw, claim, deploy.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{PoolId, Principal, UserShare, Withdrawal};

/// Request body for `POST /pools/{id}/deposit`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct DepositRequest {
    /// Amount to deposit (string-encoded u128).
    pub amount: String,
}

/// A participant's position, returned by deposit and share lookups.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ShareResponse {
    /// Pool identifier.
    pub pool_id: u64,
    /// Position holder.
    pub participant: String,
    /// Shares held (string-encoded u128).
    pub shares: String,
    /// Block height of the deposit.
    pub deposit_time: u64,
    /// Block height of the last claim.
    pub last_claim: u64,
}

impl ShareResponse {
    /// Builds the response from a registry position.
    #[must_use]
    pub fn from_share(pool_id: PoolId, participant: &Principal, share: &UserShare) -> Self {
        Self {
            pool_id: pool_id.get(),
            participant: participant.to_string(),
            shares: share.shares.to_string(),
            deposit_time: share.deposit_time,
            last_claim: share.last_claim,
        }
    }
}

/// Response body for `POST /pools/{id}/withdraw`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WithdrawResponse {
    /// Pool identifier.
    pub pool_id: u64,
    /// Shares burned.
    pub shares: String,
    /// Penalty retained by the contract.
    pub penalty: String,
    /// Amount paid out.
    pub payout: String,
}

impl WithdrawResponse {
    /// Builds the response from a registry withdrawal.
    #[must_use]
    pub fn from_withdrawal(pool_id: PoolId, withdrawal: &Withdrawal) -> Self {
        Self {
            pool_id: pool_id.get(),
            shares: withdrawal.shares.to_string(),
            penalty: withdrawal.penalty.to_string(),
            payout: withdrawal.payout.to_string(),
        }
    }
}

/// Response body for `POST /pools/{id}/claim`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ClaimResponse {
    /// Pool identifier.
    pub pool_id: u64,
    /// Yield paid (string-encoded u128).
    pub amount: String,
    /// Block height the claim was recorded at.
    pub claimed_at_block: u64,
}

/// Response body for `POST /pools/{id}/deploy`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeployResponse {
    /// Pool identifier.
    pub pool_id: u64,
    /// Always `true` on success.
    pub deployed: bool,
}
