//! Pool service: serializes registry mutations and emits events.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::RwLock;

use super::ChainClock;
use crate::domain::{
    EventBus, NewPool, Pool, PoolEvent, PoolId, PoolRegistry, PoolType, PoolUpdate, Principal,
    RegistrySnapshot, UserShare, Withdrawal,
};
use crate::error::{GatewayError, PoolError};

/// Governance scalars and counters of the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GovernanceInfo {
    /// Governance address, once set.
    pub governance_address: Option<Principal>,
    /// Current creation fee.
    pub creation_fee: u128,
    /// Registry capacity.
    pub max_pools: u64,
    /// Pools created so far.
    pub pool_count: u64,
}

/// Orchestration layer for all registry operations.
///
/// Owns the registry behind a single `RwLock`: mutations are serialized,
/// reads run concurrently. Every mutation method follows the pattern:
/// acquire write lock → sample clock → call registry → release lock →
/// emit event → log.
#[derive(Debug, Clone)]
pub struct PoolService {
    registry: Arc<RwLock<PoolRegistry>>,
    clock: ChainClock,
    event_bus: EventBus,
}

impl PoolService {
    /// Creates a new `PoolService`.
    #[must_use]
    pub fn new(registry: PoolRegistry, clock: ChainClock, event_bus: EventBus) -> Self {
        Self {
            registry: Arc::new(RwLock::new(registry)),
            clock,
            event_bus,
        }
    }

    /// Returns a reference to the inner [`EventBus`].
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Returns a reference to the block-height clock.
    #[must_use]
    pub fn clock(&self) -> &ChainClock {
        &self.clock
    }

    // ── Governance ──────────────────────────────────────────────────────

    /// Sets the one-time governance address.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] wrapping the registry rejection.
    pub async fn set_governance_address(&self, address: Principal) -> Result<(), GatewayError> {
        let mut registry = self.registry.write().await;
        let now = self.clock.height();
        registry
            .set_governance_address(address.clone())
            .map_err(|e| rejected("set_governance_address", None, e))?;
        drop(registry);

        self.event_bus.publish(PoolEvent::GovernanceAddressSet {
            address: address.clone(),
            block_height: now,
            timestamp: Utc::now(),
        });
        tracing::info!(%address, "governance address set");
        Ok(())
    }

    /// Overwrites the creation fee.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] if no governance address is set.
    pub async fn set_creation_fee(&self, fee: u128) -> Result<(), GatewayError> {
        let mut registry = self.registry.write().await;
        let now = self.clock.height();
        registry
            .set_creation_fee(fee)
            .map_err(|e| rejected("set_creation_fee", None, e))?;
        drop(registry);

        self.event_bus.publish(PoolEvent::CreationFeeUpdated {
            fee: fee.to_string(),
            block_height: now,
            timestamp: Utc::now(),
        });
        tracing::info!(fee = %fee, "creation fee updated");
        Ok(())
    }

    /// Returns the governance scalars.
    pub async fn governance(&self) -> GovernanceInfo {
        let registry = self.registry.read().await;
        GovernanceInfo {
            governance_address: registry.governance_address().cloned(),
            creation_fee: registry.creation_fee(),
            max_pools: registry.max_pools(),
            pool_count: registry.pool_count(),
        }
    }

    // ── Pool lifecycle ──────────────────────────────────────────────────

    /// Creates a pool on behalf of `caller` and returns its id together
    /// with the block height stamped on it.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] wrapping the registry rejection.
    pub async fn create_pool(
        &self,
        caller: &Principal,
        args: &NewPool,
    ) -> Result<(PoolId, u64), GatewayError> {
        let mut registry = self.registry.write().await;
        let now = self.clock.height();
        let fee = registry.creation_fee();
        let pool_id = registry
            .create_pool(caller, now, args)
            .map_err(|e| rejected("create_pool", Some(caller), e))?;
        let fee_recipient = registry
            .governance_address()
            .cloned()
            .ok_or_else(|| GatewayError::Internal("pool created without governance".to_string()))?;
        drop(registry);

        self.event_bus.publish(PoolEvent::PoolCreated {
            pool_id,
            name: args.name.clone(),
            creator: caller.clone(),
            fee: fee.to_string(),
            fee_recipient,
            block_height: now,
            timestamp: Utc::now(),
        });
        tracing::info!(%pool_id, %caller, name = %args.name, fee = %fee, "pool created");
        Ok((pool_id, now))
    }

    /// Renames/resizes a pool and returns its new state.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] wrapping the registry rejection.
    pub async fn update_pool(
        &self,
        caller: &Principal,
        pool_id: PoolId,
        name: &str,
        min_deposit: u128,
        max_deposit: u128,
    ) -> Result<Pool, GatewayError> {
        let mut registry = self.registry.write().await;
        let now = self.clock.height();
        registry
            .update_pool(caller, now, pool_id, name, min_deposit, max_deposit)
            .map_err(|e| rejected("update_pool", Some(caller), e))?;
        let pool = registry
            .get_pool(pool_id)
            .cloned()
            .ok_or(PoolError::PoolNotFound)?;
        drop(registry);

        self.event_bus.publish(PoolEvent::PoolUpdated {
            pool_id,
            name: name.to_string(),
            min_deposit: min_deposit.to_string(),
            max_deposit: max_deposit.to_string(),
            block_height: now,
            timestamp: Utc::now(),
        });
        tracing::info!(%pool_id, %caller, %name, "pool updated");
        Ok(pool)
    }

    /// Enables or disables a pool.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] wrapping the registry rejection.
    pub async fn set_pool_status(
        &self,
        caller: &Principal,
        pool_id: PoolId,
        active: bool,
    ) -> Result<(), GatewayError> {
        let mut registry = self.registry.write().await;
        let now = self.clock.height();
        registry
            .set_pool_status(caller, pool_id, active)
            .map_err(|e| rejected("set_pool_status", Some(caller), e))?;
        drop(registry);

        self.event_bus.publish(PoolEvent::PoolStatusChanged {
            pool_id,
            active,
            block_height: now,
            timestamp: Utc::now(),
        });
        tracing::info!(%pool_id, %caller, active, "pool status changed");
        Ok(())
    }

    /// Deposits into a pool and returns the new position.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] wrapping the registry rejection.
    pub async fn deposit(
        &self,
        caller: &Principal,
        pool_id: PoolId,
        amount: u128,
    ) -> Result<UserShare, GatewayError> {
        let mut registry = self.registry.write().await;
        let now = self.clock.height();
        registry
            .add_to_pool(caller, now, pool_id, amount)
            .map_err(|e| rejected("deposit", Some(caller), e))?;
        let share = registry
            .user_share(pool_id, caller)
            .copied()
            .ok_or(PoolError::NotInPool)?;
        let total = registry
            .get_pool(pool_id)
            .map(|p| p.total_deposited)
            .unwrap_or_default();
        drop(registry);

        self.event_bus.publish(PoolEvent::Deposited {
            pool_id,
            participant: caller.clone(),
            amount: amount.to_string(),
            total_deposited: total.to_string(),
            block_height: now,
            timestamp: Utc::now(),
        });
        tracing::info!(%pool_id, %caller, amount = %amount, "deposit accepted");
        Ok(share)
    }

    /// Withdraws the caller's whole position.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] wrapping the registry rejection.
    pub async fn withdraw(
        &self,
        caller: &Principal,
        pool_id: PoolId,
    ) -> Result<Withdrawal, GatewayError> {
        let mut registry = self.registry.write().await;
        let now = self.clock.height();
        let withdrawal = registry
            .remove_from_pool(caller, now, pool_id)
            .map_err(|e| rejected("withdraw", Some(caller), e))?;
        drop(registry);

        self.event_bus.publish(PoolEvent::Withdrawn {
            pool_id,
            participant: caller.clone(),
            shares: withdrawal.shares.to_string(),
            penalty: withdrawal.penalty.to_string(),
            payout: withdrawal.payout.to_string(),
            block_height: now,
            timestamp: Utc::now(),
        });
        tracing::info!(
            %pool_id,
            %caller,
            payout = %withdrawal.payout,
            penalty = %withdrawal.penalty,
            "withdrawal paid"
        );
        Ok(withdrawal)
    }

    /// Acknowledges deployment of a pool's funds.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] wrapping the registry rejection.
    pub async fn deploy_to_defi(
        &self,
        caller: &Principal,
        pool_id: PoolId,
    ) -> Result<(), GatewayError> {
        // Read lock only: deployment does not mutate the registry.
        let registry = self.registry.read().await;
        let now = self.clock.height();
        registry
            .deploy_to_defi(caller, pool_id)
            .map_err(|e| rejected("deploy_to_defi", Some(caller), e))?;
        let (protocol, total) = registry
            .get_pool(pool_id)
            .map(|p| (p.defi_protocol, p.total_deposited))
            .ok_or(PoolError::PoolNotFound)?;
        drop(registry);

        self.event_bus.publish(PoolEvent::DeployedToDefi {
            pool_id,
            protocol: protocol.to_string(),
            total_deposited: total.to_string(),
            block_height: now,
            timestamp: Utc::now(),
        });
        tracing::info!(%pool_id, %caller, %protocol, "funds deployed");
        Ok(())
    }

    /// Claims accrued yield and returns the amount paid.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] wrapping the registry rejection.
    pub async fn claim_yield(
        &self,
        caller: &Principal,
        pool_id: PoolId,
    ) -> Result<u128, GatewayError> {
        let mut registry = self.registry.write().await;
        let now = self.clock.height();
        let amount = registry
            .claim_yield(caller, now, pool_id)
            .map_err(|e| rejected("claim_yield", Some(caller), e))?;
        drop(registry);

        self.event_bus.publish(PoolEvent::YieldClaimed {
            pool_id,
            participant: caller.clone(),
            amount: amount.to_string(),
            block_height: now,
            timestamp: Utc::now(),
        });
        tracing::info!(%pool_id, %caller, amount = %amount, "yield claimed");
        Ok(amount)
    }

    // ── Reads ───────────────────────────────────────────────────────────

    /// Returns a copy of a pool.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::PoolNotFound`] if the pool does not exist.
    pub async fn get_pool(&self, pool_id: PoolId) -> Result<Pool, GatewayError> {
        let registry = self.registry.read().await;
        registry
            .get_pool(pool_id)
            .cloned()
            .ok_or(GatewayError::Pool(PoolError::PoolNotFound))
    }

    /// Number of pools ever created.
    pub async fn pool_count(&self) -> u64 {
        self.registry.read().await.pool_count()
    }

    /// Resolves a pool name; `None` if no pool has it.
    pub async fn find_by_name(&self, name: &str) -> Option<PoolId> {
        self.registry.read().await.pool_id_by_name(name)
    }

    /// Last rename/resize record of a pool.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::PoolNotFound`] if the pool does not exist.
    pub async fn last_update(&self, pool_id: PoolId) -> Result<Option<PoolUpdate>, GatewayError> {
        let registry = self.registry.read().await;
        if registry.get_pool(pool_id).is_none() {
            return Err(PoolError::PoolNotFound.into());
        }
        Ok(registry.last_update(pool_id).cloned())
    }

    /// Position of `participant` in a pool.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::PoolNotFound`] or [`PoolError::NotInPool`].
    pub async fn user_share(
        &self,
        pool_id: PoolId,
        participant: &Principal,
    ) -> Result<UserShare, GatewayError> {
        let registry = self.registry.read().await;
        if registry.get_pool(pool_id).is_none() {
            return Err(PoolError::PoolNotFound.into());
        }
        registry
            .user_share(pool_id, participant)
            .copied()
            .ok_or(GatewayError::Pool(PoolError::NotInPool))
    }

    /// All pools in id order, optionally filtered by pool type.
    pub async fn list_pools(&self, pool_type_filter: Option<PoolType>) -> Vec<(PoolId, Pool)> {
        let registry = self.registry.read().await;
        registry
            .pools()
            .filter(|(_, pool)| pool_type_filter.is_none_or(|t| pool.pool_type == t))
            .map(|(id, pool)| (id, pool.clone()))
            .collect()
    }

    /// Simulated contract reserve.
    pub async fn reserve(&self) -> i128 {
        self.registry.read().await.reserve()
    }

    /// Captures a snapshot of the registry tables, stamped with the
    /// current block height.
    pub async fn snapshot(&self) -> RegistrySnapshot {
        let registry = self.registry.read().await;
        let mut snapshot = registry.snapshot();
        snapshot.block_height = snapshot.block_height.max(self.clock.height());
        snapshot
    }
}

/// Logs a rejected mutation and lifts it into a [`GatewayError`].
fn rejected(operation: &'static str, caller: Option<&Principal>, err: PoolError) -> GatewayError {
    match caller {
        Some(caller) => {
            tracing::warn!(operation, %caller, code = err.code(), error = %err, "operation rejected");
        }
        None => tracing::warn!(operation, code = err.code(), error = %err, "operation rejected"),
    }
    GatewayError::Pool(err)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::RegistrySettings;

    fn alpha() -> NewPool {
        NewPool {
            name: "AlphaPool".to_string(),
            min_deposit: 100,
            max_deposit: 10_000,
            yield_rate: 5,
            duration: 30,
            penalty: 2,
            threshold: 50,
            pool_type: "lending".to_string(),
            interest_rate: 10,
            lock_period: 7,
            currency: "STX".to_string(),
            defi_protocol: "alex".to_string(),
        }
    }

    fn creator() -> Principal {
        Principal::new("ST1TEST")
    }

    fn make_service() -> PoolService {
        let registry = PoolRegistry::in_memory(RegistrySettings::default(), [creator()]);
        PoolService::new(registry, ChainClock::default(), EventBus::new(1000))
    }

    async fn service_with_pool() -> PoolService {
        let service = make_service();
        let Ok(()) = service
            .set_governance_address(Principal::new("ST2TEST"))
            .await
        else {
            panic!("governance setup failed");
        };
        let Ok(_) = service.create_pool(&creator(), &alpha()).await else {
            panic!("pool creation failed");
        };
        service
    }

    #[tokio::test]
    async fn create_pool_emits_event() {
        let service = make_service();
        let mut rx = service.event_bus().subscribe();
        let _ = service
            .set_governance_address(Principal::new("ST2TEST"))
            .await;
        let _ = rx.recv().await;

        service.clock().advance(9);
        let result = service.create_pool(&creator(), &alpha()).await;
        assert_eq!(result.ok(), Some((PoolId::new(0), 9)));
        assert_eq!(
            service.get_pool(PoolId::new(0)).await.ok().map(|p| p.timestamp),
            Some(9)
        );

        let Ok(event) = rx.recv().await else {
            panic!("expected event");
        };
        assert_eq!(event.event_type_str(), "pool_created");
    }

    #[tokio::test]
    async fn snapshot_carries_clock_height() {
        let service = service_with_pool().await;
        service.clock().advance(40);
        assert_eq!(service.snapshot().await.block_height, 40);
    }

    #[tokio::test]
    async fn rejected_mutation_emits_nothing() {
        let service = make_service();
        let mut rx = service.event_bus().subscribe();

        let result = service.create_pool(&creator(), &alpha()).await;
        let Err(GatewayError::Pool(err)) = result else {
            panic!("expected a registry error");
        };
        assert_eq!(err, PoolError::DefiNotConfigured);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn operations_use_clock_height() {
        let service = service_with_pool().await;
        let pool_id = PoolId::new(0);

        service.clock().advance(3);
        let Ok(share) = service.deposit(&creator(), pool_id, 500).await else {
            panic!("deposit failed");
        };
        assert_eq!(share.deposit_time, 3);

        let locked = service.withdraw(&creator(), pool_id).await;
        assert!(matches!(
            locked,
            Err(GatewayError::Pool(PoolError::FundsLocked))
        ));

        let _ = service.clock().set_height(10);
        let Ok(withdrawal) = service.withdraw(&creator(), pool_id).await else {
            panic!("withdraw failed");
        };
        assert_eq!(withdrawal.payout, 490);
    }

    #[tokio::test]
    async fn claim_yield_after_one_day() {
        let service = service_with_pool().await;
        let pool_id = PoolId::new(0);
        let _ = service.deposit(&creator(), pool_id, 500).await;
        let _ = service.clock().set_height(144);

        assert_eq!(service.claim_yield(&creator(), pool_id).await.ok(), Some(25));
        let Ok(share) = service.user_share(pool_id, &creator()).await else {
            panic!("share missing");
        };
        assert_eq!(share.last_claim, 144);
        assert_eq!(service.reserve().await, 475);
    }

    #[tokio::test]
    async fn concurrent_deposits_respect_capacity() {
        let service = service_with_pool().await;
        let pool_id = PoolId::new(0);

        let mut handles = Vec::new();
        for i in 0..40 {
            let service = service.clone();
            handles.push(tokio::spawn(async move {
                service
                    .deposit(&Principal::new(format!("ST{i}")), pool_id, 600)
                    .await
                    .is_ok()
            }));
        }
        let mut accepted = 0;
        for handle in handles {
            if matches!(handle.await, Ok(true)) {
                accepted += 1;
            }
        }

        let Ok(pool) = service.get_pool(pool_id).await else {
            panic!("pool missing");
        };
        assert_eq!(accepted, 16);
        assert_eq!(pool.total_deposited, 9_600);
        assert_eq!(pool.total_shares, pool.total_deposited);
    }

    #[tokio::test]
    async fn list_filters_by_type() {
        let service = service_with_pool().await;
        let staking = NewPool {
            name: "Stake".to_string(),
            pool_type: "staking".to_string(),
            ..alpha()
        };
        let _ = service.create_pool(&creator(), &staking).await;

        assert_eq!(service.list_pools(None).await.len(), 2);
        let only_staking = service.list_pools(Some(PoolType::Staking)).await;
        assert_eq!(only_staking.len(), 1);
        assert_eq!(only_staking.first().map(|(id, _)| *id), Some(PoolId::new(1)));
    }

    #[tokio::test]
    async fn last_update_distinguishes_missing_pool() {
        let service = service_with_pool().await;
        assert!(matches!(service.last_update(PoolId::new(0)).await, Ok(None)));
        assert!(service.last_update(PoolId::new(9)).await.is_err());
    }

    #[tokio::test]
    async fn governance_info_reflects_state() {
        let service = service_with_pool().await;
        let _ = service.set_creation_fee(1_000).await;
        let info = service.governance().await;
        assert_eq!(info.governance_address, Some(Principal::new("ST2TEST")));
        assert_eq!(info.creation_fee, 1_000);
        assert_eq!(info.pool_count, 1);
        assert_eq!(info.max_pools, 500);
    }
}
