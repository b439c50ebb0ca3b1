//! Domain events reflecting registry state mutations.
//!
//! Every successful mutation emits a [`PoolEvent`] through the
//! [`super::EventBus`]. Events are broadcast to WebSocket subscribers and
//! optionally appended to the PostgreSQL event log.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{PoolId, Principal};

/// Domain event emitted after every committed mutation.
///
/// Amounts are stored as `String` to preserve u128 precision when
/// serialized to JSON. `block_height` is the registry time the mutation
/// ran at; `timestamp` is wall-clock time stamped by the service.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum PoolEvent {
    /// Emitted when the governance address is configured.
    GovernanceAddressSet {
        /// The new governance address.
        address: Principal,
        /// Registry time.
        block_height: u64,
        /// Wall-clock time.
        timestamp: DateTime<Utc>,
    },

    /// Emitted when the creation fee changes.
    CreationFeeUpdated {
        /// The new fee.
        fee: String,
        /// Registry time.
        block_height: u64,
        /// Wall-clock time.
        timestamp: DateTime<Utc>,
    },

    /// Emitted when a new pool is created.
    PoolCreated {
        /// Pool identifier.
        pool_id: PoolId,
        /// Pool name.
        name: String,
        /// Creator.
        creator: Principal,
        /// Creation fee charged.
        fee: String,
        /// Fee recipient.
        fee_recipient: Principal,
        /// Registry time.
        block_height: u64,
        /// Wall-clock time.
        timestamp: DateTime<Utc>,
    },

    /// Emitted after a rename/resize.
    PoolUpdated {
        /// Pool identifier.
        pool_id: PoolId,
        /// New name.
        name: String,
        /// New minimum deposit.
        min_deposit: String,
        /// New capacity.
        max_deposit: String,
        /// Registry time.
        block_height: u64,
        /// Wall-clock time.
        timestamp: DateTime<Utc>,
    },

    /// Emitted when a pool is enabled or disabled.
    PoolStatusChanged {
        /// Pool identifier.
        pool_id: PoolId,
        /// New status.
        active: bool,
        /// Registry time.
        block_height: u64,
        /// Wall-clock time.
        timestamp: DateTime<Utc>,
    },

    /// Emitted after a deposit.
    Deposited {
        /// Pool identifier.
        pool_id: PoolId,
        /// Depositor.
        participant: Principal,
        /// Amount deposited (equal to shares minted).
        amount: String,
        /// Pool total after the deposit.
        total_deposited: String,
        /// Registry time.
        block_height: u64,
        /// Wall-clock time.
        timestamp: DateTime<Utc>,
    },

    /// Emitted after a full withdrawal.
    Withdrawn {
        /// Pool identifier.
        pool_id: PoolId,
        /// Withdrawing participant.
        participant: Principal,
        /// Shares burned.
        shares: String,
        /// Penalty retained.
        penalty: String,
        /// Amount paid out.
        payout: String,
        /// Registry time.
        block_height: u64,
        /// Wall-clock time.
        timestamp: DateTime<Utc>,
    },

    /// Emitted when the creator deploys funds to the DeFi protocol.
    DeployedToDefi {
        /// Pool identifier.
        pool_id: PoolId,
        /// Target protocol wire name.
        protocol: String,
        /// Amount deposited at deployment.
        total_deposited: String,
        /// Registry time.
        block_height: u64,
        /// Wall-clock time.
        timestamp: DateTime<Utc>,
    },

    /// Emitted after a yield claim.
    YieldClaimed {
        /// Pool identifier.
        pool_id: PoolId,
        /// Claiming participant.
        participant: Principal,
        /// Yield paid.
        amount: String,
        /// Registry time.
        block_height: u64,
        /// Wall-clock time.
        timestamp: DateTime<Utc>,
    },
}

impl PoolEvent {
    /// Returns the pool this event concerns, or `None` for governance
    /// events.
    #[must_use]
    pub fn pool_id(&self) -> Option<PoolId> {
        match self {
            Self::GovernanceAddressSet { .. } | Self::CreationFeeUpdated { .. } => None,
            Self::PoolCreated { pool_id, .. }
            | Self::PoolUpdated { pool_id, .. }
            | Self::PoolStatusChanged { pool_id, .. }
            | Self::Deposited { pool_id, .. }
            | Self::Withdrawn { pool_id, .. }
            | Self::DeployedToDefi { pool_id, .. }
            | Self::YieldClaimed { pool_id, .. } => Some(*pool_id),
        }
    }

    /// Block height the mutation ran at.
    #[must_use]
    pub const fn block_height(&self) -> u64 {
        match self {
            Self::GovernanceAddressSet { block_height, .. }
            | Self::CreationFeeUpdated { block_height, .. }
            | Self::PoolCreated { block_height, .. }
            | Self::PoolUpdated { block_height, .. }
            | Self::PoolStatusChanged { block_height, .. }
            | Self::Deposited { block_height, .. }
            | Self::Withdrawn { block_height, .. }
            | Self::DeployedToDefi { block_height, .. }
            | Self::YieldClaimed { block_height, .. } => *block_height,
        }
    }

    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::GovernanceAddressSet { .. } => "governance_address_set",
            Self::CreationFeeUpdated { .. } => "creation_fee_updated",
            Self::PoolCreated { .. } => "pool_created",
            Self::PoolUpdated { .. } => "pool_updated",
            Self::PoolStatusChanged { .. } => "pool_status_changed",
            Self::Deposited { .. } => "deposited",
            Self::Withdrawn { .. } => "withdrawn",
            Self::DeployedToDefi { .. } => "deployed_to_defi",
            Self::YieldClaimed { .. } => "yield_claimed",
        }
    }
}
