//! Service layer: business logic orchestration.
//!
//! [`PoolService`] serializes registry mutations, supplies block height
//! from the [`ChainClock`], and emits events through the
//! [`super::domain::EventBus`].

pub mod chain_clock;
pub mod pool_service;

pub use chain_clock::ChainClock;
pub use pool_service::{GovernanceInfo, PoolService};
