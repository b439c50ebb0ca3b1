//! The pool registry: all persistent state and every state transition.
//!
//! [`PoolRegistry`] is a single owned aggregate holding the four logical
//! tables (pools by id, last-update audit by id, name index, shares by
//! pool and participant) plus the governance scalars. Every mutating
//! operation is a function of `(state, caller, now, arguments)`: it runs
//! all checks first and only then applies its writes, so a returned
//! [`PoolError`] always means nothing changed.
//!
//! The registry is synchronous and never reads a clock. Callers that share
//! it across tasks must serialize mutations, see
//! [`crate::service::PoolService`].

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use super::ledger::{AuthorityOracle, AuthoritySet, InMemoryLedger, Ledger, Transfer};
use super::pool::{NewPool, Pool, PoolUpdate, UserShare, validate_name};
use super::{PoolId, Principal};
use crate::error::PoolError;

/// Blocks over which one percent of yield accrues in full.
pub const BLOCKS_PER_DAY: u128 = 144;

/// Default registry capacity.
pub const DEFAULT_MAX_POOLS: u64 = 500;

/// Default pool creation fee.
pub const DEFAULT_CREATION_FEE: u128 = 500;

/// Registry-wide limits chosen at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistrySettings {
    /// Maximum number of pools ever created.
    pub max_pools: u64,
    /// Initial creation fee.
    pub creation_fee: u128,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            max_pools: DEFAULT_MAX_POOLS,
            creation_fee: DEFAULT_CREATION_FEE,
        }
    }
}

/// Result of a full withdrawal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Withdrawal {
    /// Shares burned; equal to the original deposit.
    pub shares: u128,
    /// Amount retained by the contract.
    pub penalty: u128,
    /// Amount paid out to the participant.
    pub payout: u128,
}

/// One row of the share table in a [`RegistrySnapshot`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareRecord {
    /// Pool the position belongs to.
    pub pool_id: PoolId,
    /// Holder of the position.
    pub participant: Principal,
    /// The position itself.
    pub share: UserShare,
}

/// Serializable image of the registry tables and governance scalars.
///
/// Collaborators (authority oracle, ledger) are not part of the image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    /// Next id to allocate.
    pub next_pool_id: u64,
    /// Registry capacity.
    pub max_pools: u64,
    /// Current creation fee.
    pub creation_fee: u128,
    /// Governance address, once set.
    pub governance_address: Option<Principal>,
    /// Pool table.
    pub pools: BTreeMap<PoolId, Pool>,
    /// Last-update audit table.
    pub pool_updates: BTreeMap<PoolId, PoolUpdate>,
    /// Name index.
    pub pools_by_name: BTreeMap<String, PoolId>,
    /// Share table.
    pub user_shares: Vec<ShareRecord>,
    /// Highest block height the registry had seen. Older images without
    /// this field fall back to the heights recorded in the tables.
    #[serde(default)]
    pub block_height: u64,
}

/// Inconsistency found while restoring a [`RegistrySnapshot`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SnapshotError {
    /// A name index entry points to a pool that does not exist or has
    /// another name.
    #[error("name index entry {0:?} does not match pool {1}")]
    NameMismatch(String, PoolId),
    /// A pool is missing from the name index.
    #[error("pool {0} is not indexed by name")]
    UnindexedPool(PoolId),
    /// A pool id was never allocated by the counter.
    #[error("pool {0} is at or above next_pool_id")]
    IdAboveCounter(PoolId),
    /// A share references a missing pool.
    #[error("share of {1} references missing pool {0}")]
    OrphanShare(PoolId, Principal),
}

/// Owned aggregate of all pool state.
///
/// # Invariants
///
/// - `pools_by_name` maps exactly the current pool names to their ids.
/// - `next_pool_id` equals the number of pools ever created.
/// - For every pool, `total_shares == total_deposited <= max_deposit`.
/// - `governance_address`, once `Some`, never changes.
#[derive(Debug)]
pub struct PoolRegistry {
    next_pool_id: u64,
    max_pools: u64,
    creation_fee: u128,
    governance_address: Option<Principal>,
    pools: BTreeMap<PoolId, Pool>,
    pool_updates: HashMap<PoolId, PoolUpdate>,
    pools_by_name: HashMap<String, PoolId>,
    user_shares: HashMap<(PoolId, Principal), UserShare>,
    // Highest `now` passed to a mutation.
    block_height: u64,
    authorities: Box<dyn AuthorityOracle>,
    ledger: Box<dyn Ledger>,
}

impl PoolRegistry {
    /// Creates an empty registry wired to the given collaborators.
    #[must_use]
    pub fn new(
        settings: RegistrySettings,
        authorities: Box<dyn AuthorityOracle>,
        ledger: Box<dyn Ledger>,
    ) -> Self {
        Self {
            next_pool_id: 0,
            max_pools: settings.max_pools,
            creation_fee: settings.creation_fee,
            governance_address: None,
            pools: BTreeMap::new(),
            pool_updates: HashMap::new(),
            pools_by_name: HashMap::new(),
            user_shares: HashMap::new(),
            block_height: 0,
            authorities,
            ledger,
        }
    }

    /// Creates an empty registry with a fixed authority set and an
    /// [`InMemoryLedger`].
    #[must_use]
    pub fn in_memory(
        settings: RegistrySettings,
        authorities: impl IntoIterator<Item = Principal>,
    ) -> Self {
        Self::new(
            settings,
            Box::new(AuthoritySet::new(authorities)),
            Box::new(InMemoryLedger::new()),
        )
    }

    // ── Governance ──────────────────────────────────────────────────────

    /// Sets the governance address. Succeeds at most once.
    ///
    /// # Errors
    ///
    /// [`PoolError::InvalidGovernanceAddress`] for the burn identity,
    /// [`PoolError::GovernanceAlreadySet`] if an address is already set.
    pub fn set_governance_address(&mut self, address: Principal) -> Result<(), PoolError> {
        if address.is_burn() {
            return Err(PoolError::InvalidGovernanceAddress);
        }
        if self.governance_address.is_some() {
            return Err(PoolError::GovernanceAlreadySet);
        }
        self.governance_address = Some(address);
        Ok(())
    }

    /// Overwrites the creation fee.
    ///
    /// # Errors
    ///
    /// [`PoolError::DefiNotConfigured`] until a governance address is set.
    pub fn set_creation_fee(&mut self, fee: u128) -> Result<(), PoolError> {
        if self.governance_address.is_none() {
            return Err(PoolError::DefiNotConfigured);
        }
        self.creation_fee = fee;
        Ok(())
    }

    // ── Pool lifecycle ──────────────────────────────────────────────────

    /// Registers a new pool and charges the creation fee to `caller`.
    ///
    /// Checks run in this order: capacity, field validation (see
    /// [`NewPool::validate`]), caller authority, name uniqueness,
    /// governance address. The fee transfer is then issued; the pool is
    /// committed only if the ledger accepts it.
    ///
    /// # Errors
    ///
    /// The [`PoolError`] of the first failed check, or
    /// [`PoolError::TransferFailed`] if the ledger refuses the fee.
    pub fn create_pool(
        &mut self,
        caller: &Principal,
        now: u64,
        args: &NewPool,
    ) -> Result<PoolId, PoolError> {
        self.observe(now);
        if self.next_pool_id >= self.max_pools {
            return Err(PoolError::MaxPoolsExceeded);
        }
        let terms = args.validate()?;
        if !self.authorities.is_authority(caller) {
            return Err(PoolError::NotAuthorized);
        }
        if self.pools_by_name.contains_key(terms.name()) {
            return Err(PoolError::PoolAlreadyExists);
        }
        let Some(governance) = self.governance_address.clone() else {
            return Err(PoolError::DefiNotConfigured);
        };
        let next = self
            .next_pool_id
            .checked_add(1)
            .ok_or(PoolError::ArithmeticOverflow)?;

        let fee = Transfer {
            amount: self.creation_fee,
            from: caller.clone(),
            to: governance,
        };
        self.ledger
            .transfer(&fee)
            .map_err(|_| PoolError::TransferFailed)?;

        let pool_id = PoolId::new(self.next_pool_id);
        let pool = Pool::from_terms(terms, caller.clone(), now);
        self.pools_by_name.insert(pool.name.clone(), pool_id);
        self.pools.insert(pool_id, pool);
        self.next_pool_id = next;
        Ok(pool_id)
    }

    /// Renames and resizes a pool. Only its creator may do so.
    ///
    /// The old name is released and the new one indexed in the same step,
    /// and the audit record for the pool is overwritten. A new capacity
    /// below the amount already deposited is refused.
    ///
    /// # Errors
    ///
    /// [`PoolError::PoolNotFound`], [`PoolError::NotAuthorized`],
    /// [`PoolError::InvalidName`], [`PoolError::InvalidMinDeposit`],
    /// [`PoolError::InvalidMaxDeposit`] or [`PoolError::PoolAlreadyExists`]
    /// when the name belongs to another pool.
    pub fn update_pool(
        &mut self,
        caller: &Principal,
        now: u64,
        pool_id: PoolId,
        new_name: &str,
        new_min_deposit: u128,
        new_max_deposit: u128,
    ) -> Result<(), PoolError> {
        self.observe(now);
        let pool = self.pools.get(&pool_id).ok_or(PoolError::PoolNotFound)?;
        if &pool.creator != caller {
            return Err(PoolError::NotAuthorized);
        }
        validate_name(new_name)?;
        if new_min_deposit == 0 {
            return Err(PoolError::InvalidMinDeposit);
        }
        if new_max_deposit == 0 {
            return Err(PoolError::InvalidMaxDeposit);
        }
        if let Some(owner) = self.pools_by_name.get(new_name)
            && *owner != pool_id
        {
            return Err(PoolError::PoolAlreadyExists);
        }
        if new_max_deposit < pool.total_deposited {
            return Err(PoolError::InvalidMaxDeposit);
        }

        let Some(pool) = self.pools.get_mut(&pool_id) else {
            return Err(PoolError::PoolNotFound);
        };
        let old_name = std::mem::replace(&mut pool.name, new_name.to_string());
        pool.min_deposit = new_min_deposit;
        pool.max_deposit = new_max_deposit;
        pool.timestamp = now;

        self.pools_by_name.remove(&old_name);
        self.pools_by_name.insert(new_name.to_string(), pool_id);
        self.pool_updates.insert(
            pool_id,
            PoolUpdate {
                update_name: new_name.to_string(),
                update_min_deposit: new_min_deposit,
                update_max_deposit: new_max_deposit,
                update_timestamp: now,
                updater: caller.clone(),
            },
        );
        Ok(())
    }

    /// Enables or disables a pool. Only its creator may do so.
    ///
    /// # Errors
    ///
    /// [`PoolError::PoolNotFound`] or [`PoolError::NotAuthorized`].
    pub fn set_pool_status(
        &mut self,
        caller: &Principal,
        pool_id: PoolId,
        active: bool,
    ) -> Result<(), PoolError> {
        let pool = self
            .pools
            .get_mut(&pool_id)
            .ok_or(PoolError::PoolNotFound)?;
        if &pool.creator != caller {
            return Err(PoolError::NotAuthorized);
        }
        pool.status = active;
        Ok(())
    }

    /// Deposits `amount` into a pool and opens the caller's position.
    ///
    /// A participant holds at most one position per pool; there are no
    /// top-ups.
    ///
    /// # Errors
    ///
    /// [`PoolError::PoolNotFound`], [`PoolError::InvalidAmount`] for zero or
    /// below-minimum amounts, [`PoolError::InvalidStatus`],
    /// [`PoolError::PoolFull`] or [`PoolError::AlreadyInPool`].
    pub fn add_to_pool(
        &mut self,
        caller: &Principal,
        now: u64,
        pool_id: PoolId,
        amount: u128,
    ) -> Result<(), PoolError> {
        self.observe(now);
        let pool = self.pools.get(&pool_id).ok_or(PoolError::PoolNotFound)?;
        if amount == 0 {
            return Err(PoolError::InvalidAmount);
        }
        if !pool.status {
            return Err(PoolError::InvalidStatus);
        }
        if amount < pool.min_deposit {
            return Err(PoolError::InvalidAmount);
        }
        let new_total = match pool.total_deposited.checked_add(amount) {
            Some(total) if total <= pool.max_deposit => total,
            _ => return Err(PoolError::PoolFull),
        };
        let key = (pool_id, caller.clone());
        if self.user_shares.get(&key).is_some_and(|s| s.shares > 0) {
            return Err(PoolError::AlreadyInPool);
        }

        let Some(pool) = self.pools.get_mut(&pool_id) else {
            return Err(PoolError::PoolNotFound);
        };
        pool.total_deposited = new_total;
        pool.total_shares = new_total;
        self.user_shares.insert(
            key,
            UserShare {
                shares: amount,
                deposit_time: now,
                last_claim: now,
            },
        );
        self.ledger.credit_reserve(amount);
        Ok(())
    }

    /// Closes the caller's whole position once its lock period is over.
    ///
    /// The penalty is `floor(shares * penalty / 100)` and stays with the
    /// contract; pool totals drop by the full share amount.
    ///
    /// # Errors
    ///
    /// [`PoolError::PoolNotFound`], [`PoolError::NotInPool`],
    /// [`PoolError::InvalidStatus`] or [`PoolError::FundsLocked`].
    pub fn remove_from_pool(
        &mut self,
        caller: &Principal,
        now: u64,
        pool_id: PoolId,
    ) -> Result<Withdrawal, PoolError> {
        self.observe(now);
        let pool = self.pools.get(&pool_id).ok_or(PoolError::PoolNotFound)?;
        let key = (pool_id, caller.clone());
        let share = self.user_shares.get(&key).ok_or(PoolError::NotInPool)?;
        if !pool.status {
            return Err(PoolError::InvalidStatus);
        }
        if now.saturating_sub(share.deposit_time) < pool.lock_period {
            return Err(PoolError::FundsLocked);
        }

        let shares = share.shares;
        let penalty = shares
            .checked_mul(u128::from(pool.penalty))
            .ok_or(PoolError::ArithmeticOverflow)?
            / 100;
        let payout = shares - penalty;
        let new_total = pool
            .total_deposited
            .checked_sub(shares)
            .ok_or(PoolError::ArithmeticOverflow)?;

        let Some(pool) = self.pools.get_mut(&pool_id) else {
            return Err(PoolError::PoolNotFound);
        };
        pool.total_deposited = new_total;
        pool.total_shares = new_total;
        self.user_shares.remove(&key);
        self.ledger.debit_reserve(payout);
        Ok(Withdrawal {
            shares,
            penalty,
            payout,
        })
    }

    /// Acknowledges deployment of a pool's funds to its DeFi protocol.
    ///
    /// `threshold` is compared as an absolute amount against
    /// `total_deposited`. No state changes.
    ///
    /// # Errors
    ///
    /// [`PoolError::PoolNotFound`], [`PoolError::NotAuthorized`] for anyone
    /// but the creator, [`PoolError::ThresholdNotMet`] while deposits are
    /// below the threshold.
    pub fn deploy_to_defi(&self, caller: &Principal, pool_id: PoolId) -> Result<(), PoolError> {
        let pool = self.pools.get(&pool_id).ok_or(PoolError::PoolNotFound)?;
        if &pool.creator != caller {
            return Err(PoolError::NotAuthorized);
        }
        if pool.total_deposited < u128::from(pool.threshold) {
            return Err(PoolError::ThresholdNotMet);
        }
        Ok(())
    }

    /// Pays linear yield accrued since the caller's last claim.
    ///
    /// `yield = floor(shares * yield_rate * elapsed / (100 * 144))`. The
    /// payout is not capped by the reserve.
    ///
    /// # Errors
    ///
    /// [`PoolError::PoolNotFound`], [`PoolError::NotInPool`],
    /// [`PoolError::InvalidStatus`] or [`PoolError::ArithmeticOverflow`].
    pub fn claim_yield(
        &mut self,
        caller: &Principal,
        now: u64,
        pool_id: PoolId,
    ) -> Result<u128, PoolError> {
        self.observe(now);
        let pool = self.pools.get(&pool_id).ok_or(PoolError::PoolNotFound)?;
        let key = (pool_id, caller.clone());
        let share = self.user_shares.get(&key).ok_or(PoolError::NotInPool)?;
        if !pool.status {
            return Err(PoolError::InvalidStatus);
        }

        let elapsed = u128::from(now.saturating_sub(share.last_claim));
        let amount = accrued_yield(share.shares, pool.yield_rate, elapsed)?;

        if let Some(share) = self.user_shares.get_mut(&key) {
            share.last_claim = share.last_claim.max(now);
        }
        self.ledger.debit_reserve(amount);
        Ok(amount)
    }

    // ── Reads ───────────────────────────────────────────────────────────

    /// Returns the pool with the given id.
    #[must_use]
    pub fn get_pool(&self, pool_id: PoolId) -> Option<&Pool> {
        self.pools.get(&pool_id)
    }

    /// Number of pools ever created.
    #[must_use]
    pub const fn pool_count(&self) -> u64 {
        self.next_pool_id
    }

    /// Returns `true` if a pool currently has this name.
    #[must_use]
    pub fn pool_exists(&self, name: &str) -> bool {
        self.pools_by_name.contains_key(name)
    }

    /// Resolves a pool name to its id.
    #[must_use]
    pub fn pool_id_by_name(&self, name: &str) -> Option<PoolId> {
        self.pools_by_name.get(name).copied()
    }

    /// Last rename/resize record of a pool.
    #[must_use]
    pub fn last_update(&self, pool_id: PoolId) -> Option<&PoolUpdate> {
        self.pool_updates.get(&pool_id)
    }

    /// Position of `participant` in a pool.
    #[must_use]
    pub fn user_share(&self, pool_id: PoolId, participant: &Principal) -> Option<&UserShare> {
        self.user_shares.get(&(pool_id, participant.clone()))
    }

    /// All pools in id order.
    pub fn pools(&self) -> impl Iterator<Item = (PoolId, &Pool)> {
        self.pools.iter().map(|(id, pool)| (*id, pool))
    }

    /// Governance address, if set.
    #[must_use]
    pub fn governance_address(&self) -> Option<&Principal> {
        self.governance_address.as_ref()
    }

    /// Current creation fee.
    #[must_use]
    pub const fn creation_fee(&self) -> u128 {
        self.creation_fee
    }

    /// Registry capacity.
    #[must_use]
    pub const fn max_pools(&self) -> u64 {
        self.max_pools
    }

    /// Simulated contract reserve.
    #[must_use]
    pub fn reserve(&self) -> i128 {
        self.ledger.reserve()
    }

    /// Transfers issued through the ledger.
    #[must_use]
    pub fn transfers(&self) -> &[Transfer] {
        self.ledger.transfers()
    }

    // ── Snapshots ───────────────────────────────────────────────────────

    /// Highest block height seen by a mutation or carried over from a
    /// restored snapshot. A clock resumed after a restart must not start
    /// below it.
    #[must_use]
    pub const fn block_height(&self) -> u64 {
        self.block_height
    }

    fn observe(&mut self, now: u64) {
        self.block_height = self.block_height.max(now);
    }

    /// Captures the registry tables and scalars.
    #[must_use]
    pub fn snapshot(&self) -> RegistrySnapshot {
        let mut user_shares: Vec<ShareRecord> = self
            .user_shares
            .iter()
            .map(|((pool_id, participant), share)| ShareRecord {
                pool_id: *pool_id,
                participant: participant.clone(),
                share: *share,
            })
            .collect();
        user_shares.sort_by(|a, b| (a.pool_id, &a.participant).cmp(&(b.pool_id, &b.participant)));

        RegistrySnapshot {
            next_pool_id: self.next_pool_id,
            max_pools: self.max_pools,
            creation_fee: self.creation_fee,
            governance_address: self.governance_address.clone(),
            pools: self.pools.clone(),
            pool_updates: self
                .pool_updates
                .iter()
                .map(|(id, update)| (*id, update.clone()))
                .collect(),
            pools_by_name: self
                .pools_by_name
                .iter()
                .map(|(name, id)| (name.clone(), *id))
                .collect(),
            user_shares,
            block_height: self.block_height,
        }
    }

    /// Rebuilds a registry from a snapshot after checking the name index,
    /// the id counter and share references.
    ///
    /// # Errors
    ///
    /// Returns a [`SnapshotError`] describing the first inconsistency.
    pub fn restore(
        snapshot: RegistrySnapshot,
        authorities: Box<dyn AuthorityOracle>,
        ledger: Box<dyn Ledger>,
    ) -> Result<Self, SnapshotError> {
        for (id, pool) in &snapshot.pools {
            if id.get() >= snapshot.next_pool_id {
                return Err(SnapshotError::IdAboveCounter(*id));
            }
            if snapshot.pools_by_name.get(&pool.name) != Some(id) {
                return Err(SnapshotError::UnindexedPool(*id));
            }
        }
        for (name, id) in &snapshot.pools_by_name {
            if snapshot.pools.get(id).is_none_or(|p| &p.name != name) {
                return Err(SnapshotError::NameMismatch(name.clone(), *id));
            }
        }
        for record in &snapshot.user_shares {
            if !snapshot.pools.contains_key(&record.pool_id) {
                return Err(SnapshotError::OrphanShare(
                    record.pool_id,
                    record.participant.clone(),
                ));
            }
        }

        let block_height = snapshot.block_height.max(recorded_height(&snapshot));
        Ok(Self {
            next_pool_id: snapshot.next_pool_id,
            max_pools: snapshot.max_pools,
            creation_fee: snapshot.creation_fee,
            governance_address: snapshot.governance_address,
            pools: snapshot.pools,
            pool_updates: snapshot.pool_updates.into_iter().collect(),
            pools_by_name: snapshot.pools_by_name.into_iter().collect(),
            user_shares: snapshot
                .user_shares
                .into_iter()
                .map(|r| ((r.pool_id, r.participant), r.share))
                .collect(),
            block_height,
            authorities,
            ledger,
        })
    }
}

/// Latest height stamped on any pool, update record or position.
fn recorded_height(snapshot: &RegistrySnapshot) -> u64 {
    let pools = snapshot.pools.values().map(|p| p.timestamp);
    let updates = snapshot.pool_updates.values().map(|u| u.update_timestamp);
    let shares = snapshot
        .user_shares
        .iter()
        .map(|r| r.share.deposit_time.max(r.share.last_claim));
    pools.chain(updates).chain(shares).max().unwrap_or(0)
}

/// `floor(shares * yield_rate * elapsed / (100 * BLOCKS_PER_DAY))`.
fn accrued_yield(shares: u128, yield_rate: u32, elapsed: u128) -> Result<u128, PoolError> {
    shares
        .checked_mul(u128::from(yield_rate))
        .and_then(|v| v.checked_mul(elapsed))
        .map(|v| v / (100 * BLOCKS_PER_DAY))
        .ok_or(PoolError::ArithmeticOverflow)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::ledger::LedgerError;

    fn creator() -> Principal {
        Principal::new("ST1TEST")
    }

    fn governance() -> Principal {
        Principal::new("ST2TEST")
    }

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

    fn named(name: &str) -> NewPool {
        NewPool {
            name: name.to_string(),
            ..alpha()
        }
    }

    fn registry() -> PoolRegistry {
        PoolRegistry::in_memory(RegistrySettings::default(), [creator()])
    }

    /// Registry with governance configured and `AlphaPool` created at 0.
    fn with_alpha() -> PoolRegistry {
        let mut reg = registry();
        let Ok(()) = reg.set_governance_address(governance()) else {
            panic!("governance setup failed");
        };
        let Ok(id) = reg.create_pool(&creator(), 0, &alpha()) else {
            panic!("pool creation failed");
        };
        assert_eq!(id, PoolId::new(0));
        reg
    }

    #[derive(Debug, Default)]
    struct RejectingLedger {
        transfers: Vec<Transfer>,
    }

    impl Ledger for RejectingLedger {
        fn transfer(&mut self, transfer: &Transfer) -> Result<(), LedgerError> {
            Err(LedgerError {
                amount: transfer.amount,
                from: transfer.from.clone(),
                reason: "insufficient funds".to_string(),
            })
        }
        fn credit_reserve(&mut self, _amount: u128) {}
        fn debit_reserve(&mut self, _amount: u128) {}
        fn reserve(&self) -> i128 {
            0
        }
        fn transfers(&self) -> &[Transfer] {
            &self.transfers
        }
    }

    // ── Governance ──────────────────────────────────────────────────────

    #[test]
    fn governance_address_is_set_once() {
        let mut reg = registry();
        assert_eq!(reg.set_governance_address(governance()), Ok(()));
        assert_eq!(reg.governance_address(), Some(&governance()));
        assert_eq!(
            reg.set_governance_address(Principal::new("ST3OTHER")),
            Err(PoolError::GovernanceAlreadySet)
        );
        assert_eq!(reg.governance_address(), Some(&governance()));
    }

    #[test]
    fn burn_address_is_rejected() {
        let mut reg = registry();
        assert_eq!(
            reg.set_governance_address(Principal::new(crate::domain::BURN_ADDRESS)),
            Err(PoolError::InvalidGovernanceAddress)
        );
        assert!(reg.governance_address().is_none());
    }

    #[test]
    fn fee_requires_governance() {
        let mut reg = registry();
        assert_eq!(reg.set_creation_fee(1000), Err(PoolError::DefiNotConfigured));
        assert_eq!(reg.creation_fee(), DEFAULT_CREATION_FEE);
    }

    #[test]
    fn new_fee_is_charged_on_next_creation() {
        let mut reg = registry();
        let _ = reg.set_governance_address(governance());
        assert_eq!(reg.set_creation_fee(1000), Ok(()));
        assert!(reg.create_pool(&creator(), 0, &alpha()).is_ok());
        assert_eq!(
            reg.transfers(),
            &[Transfer {
                amount: 1000,
                from: creator(),
                to: governance(),
            }]
        );
    }

    // ── Creation ────────────────────────────────────────────────────────

    #[test]
    fn creates_pool_and_charges_fee() {
        let reg = with_alpha();
        let Some(pool) = reg.get_pool(PoolId::new(0)) else {
            panic!("pool missing");
        };
        assert_eq!(pool.name, "AlphaPool");
        assert_eq!(pool.min_deposit, 100);
        assert_eq!(pool.max_deposit, 10_000);
        assert_eq!(pool.yield_rate, 5);
        assert_eq!(pool.lock_period, 7);
        assert_eq!(pool.creator, creator());
        assert!(pool.status);
        assert_eq!(reg.pool_count(), 1);
        assert!(reg.pool_exists("AlphaPool"));
        assert_eq!(
            reg.transfers(),
            &[Transfer {
                amount: 500,
                from: creator(),
                to: governance(),
            }]
        );
    }

    #[test]
    fn ids_are_sequential() {
        let mut reg = with_alpha();
        assert_eq!(reg.create_pool(&creator(), 3, &named("Beta")), Ok(PoolId::new(1)));
        assert_eq!(reg.create_pool(&creator(), 4, &named("Gamma")), Ok(PoolId::new(2)));
        assert_eq!(reg.pool_count(), 3);
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let mut reg = with_alpha();
        let other = NewPool {
            min_deposit: 200,
            pool_type: "staking".to_string(),
            currency: "BTC".to_string(),
            defi_protocol: "arkadiko".to_string(),
            ..alpha()
        };
        assert_eq!(
            reg.create_pool(&creator(), 1, &other),
            Err(PoolError::PoolAlreadyExists)
        );
        assert_eq!(reg.pool_count(), 1);
    }

    #[test]
    fn non_authority_is_rejected() {
        let mut reg = registry();
        let _ = reg.set_governance_address(governance());
        assert_eq!(
            reg.create_pool(&Principal::new("ST2FAKE"), 0, &alpha()),
            Err(PoolError::NotAuthorized)
        );
    }

    #[test]
    fn creation_requires_governance() {
        let mut reg = registry();
        assert_eq!(
            reg.create_pool(&creator(), 0, &alpha()),
            Err(PoolError::DefiNotConfigured)
        );
        assert!(reg.transfers().is_empty());
    }

    #[test]
    fn field_errors_come_before_authority() {
        let mut reg = registry();
        let mut args = alpha();
        args.pool_type = "savings".to_string();
        assert_eq!(
            reg.create_pool(&Principal::new("ST2FAKE"), 0, &args),
            Err(PoolError::InvalidPoolType)
        );
    }

    #[test]
    fn capacity_is_checked_first() {
        let settings = RegistrySettings {
            max_pools: 1,
            ..RegistrySettings::default()
        };
        let mut reg = PoolRegistry::in_memory(settings, [creator()]);
        let _ = reg.set_governance_address(governance());
        assert!(reg.create_pool(&creator(), 0, &alpha()).is_ok());
        let mut invalid = named("Beta");
        invalid.name.clear();
        assert_eq!(
            reg.create_pool(&creator(), 0, &invalid),
            Err(PoolError::MaxPoolsExceeded)
        );
    }

    #[test]
    fn rejected_fee_transfer_commits_nothing() {
        let mut reg = PoolRegistry::new(
            RegistrySettings::default(),
            Box::new(AuthoritySet::new([creator()])),
            Box::new(RejectingLedger::default()),
        );
        let _ = reg.set_governance_address(governance());
        assert_eq!(
            reg.create_pool(&creator(), 0, &alpha()),
            Err(PoolError::TransferFailed)
        );
        assert_eq!(reg.pool_count(), 0);
        assert!(!reg.pool_exists("AlphaPool"));
        assert!(reg.get_pool(PoolId::new(0)).is_none());
    }

    // ── Update ──────────────────────────────────────────────────────────

    #[test]
    fn rename_moves_name_index_and_records_audit() {
        let mut reg = with_alpha();
        assert_eq!(
            reg.update_pool(&creator(), 12, PoolId::new(0), "NewPool", 200, 20_000),
            Ok(())
        );
        let Some(pool) = reg.get_pool(PoolId::new(0)) else {
            panic!("pool missing");
        };
        assert_eq!(pool.name, "NewPool");
        assert_eq!(pool.min_deposit, 200);
        assert_eq!(pool.max_deposit, 20_000);
        assert_eq!(pool.timestamp, 12);
        assert!(!reg.pool_exists("AlphaPool"));
        assert_eq!(reg.pool_id_by_name("NewPool"), Some(PoolId::new(0)));

        let Some(update) = reg.last_update(PoolId::new(0)) else {
            panic!("audit record missing");
        };
        assert_eq!(update.update_name, "NewPool");
        assert_eq!(update.update_min_deposit, 200);
        assert_eq!(update.update_max_deposit, 20_000);
        assert_eq!(update.update_timestamp, 12);
        assert_eq!(update.updater, creator());
    }

    #[test]
    fn rename_to_own_name_is_allowed() {
        let mut reg = with_alpha();
        assert_eq!(
            reg.update_pool(&creator(), 1, PoolId::new(0), "AlphaPool", 150, 10_000),
            Ok(())
        );
        assert_eq!(reg.pool_id_by_name("AlphaPool"), Some(PoolId::new(0)));
    }

    #[test]
    fn rename_onto_other_pool_is_rejected() {
        let mut reg = with_alpha();
        let _ = reg.create_pool(&creator(), 0, &named("Beta"));
        assert_eq!(
            reg.update_pool(&creator(), 1, PoolId::new(1), "AlphaPool", 100, 10_000),
            Err(PoolError::PoolAlreadyExists)
        );
        assert_eq!(reg.pool_id_by_name("AlphaPool"), Some(PoolId::new(0)));
        assert_eq!(reg.pool_id_by_name("Beta"), Some(PoolId::new(1)));
    }

    #[test]
    fn update_failures() {
        let mut reg = with_alpha();
        let id = PoolId::new(0);
        assert_eq!(
            reg.update_pool(&creator(), 1, PoolId::new(99), "X", 1, 1),
            Err(PoolError::PoolNotFound)
        );
        assert_eq!(
            reg.update_pool(&Principal::new("ST3FAKE"), 1, id, "X", 1, 1),
            Err(PoolError::NotAuthorized)
        );
        assert_eq!(
            reg.update_pool(&creator(), 1, id, "", 1, 1),
            Err(PoolError::InvalidName)
        );
        assert_eq!(
            reg.update_pool(&creator(), 1, id, "X", 0, 1),
            Err(PoolError::InvalidMinDeposit)
        );
        assert_eq!(
            reg.update_pool(&creator(), 1, id, "X", 1, 0),
            Err(PoolError::InvalidMaxDeposit)
        );
        assert!(reg.last_update(id).is_none());
    }

    #[test]
    fn capacity_cannot_drop_below_deposits() {
        let mut reg = with_alpha();
        let _ = reg.add_to_pool(&creator(), 0, PoolId::new(0), 500);
        assert_eq!(
            reg.update_pool(&creator(), 1, PoolId::new(0), "AlphaPool", 100, 499),
            Err(PoolError::InvalidMaxDeposit)
        );
        assert_eq!(
            reg.update_pool(&creator(), 1, PoolId::new(0), "AlphaPool", 100, 500),
            Ok(())
        );
    }

    // ── Deposit ─────────────────────────────────────────────────────────

    #[test]
    fn deposit_credits_totals_and_share() {
        let mut reg = with_alpha();
        assert_eq!(reg.add_to_pool(&creator(), 0, PoolId::new(0), 500), Ok(()));
        let Some(pool) = reg.get_pool(PoolId::new(0)) else {
            panic!("pool missing");
        };
        assert_eq!(pool.total_deposited, 500);
        assert_eq!(pool.total_shares, 500);
        assert_eq!(
            reg.user_share(PoolId::new(0), &creator()),
            Some(&UserShare {
                shares: 500,
                deposit_time: 0,
                last_claim: 0,
            })
        );
        assert_eq!(reg.reserve(), 500);
    }

    #[test]
    fn second_deposit_is_rejected() {
        let mut reg = with_alpha();
        let _ = reg.add_to_pool(&creator(), 0, PoolId::new(0), 500);
        assert_eq!(
            reg.add_to_pool(&creator(), 1, PoolId::new(0), 500),
            Err(PoolError::AlreadyInPool)
        );
        assert_eq!(
            reg.get_pool(PoolId::new(0)).map(|p| p.total_deposited),
            Some(500)
        );
    }

    #[test]
    fn deposit_failures() {
        let mut reg = with_alpha();
        let id = PoolId::new(0);
        assert_eq!(
            reg.add_to_pool(&creator(), 0, PoolId::new(5), 500),
            Err(PoolError::PoolNotFound)
        );
        assert_eq!(reg.add_to_pool(&creator(), 0, id, 0), Err(PoolError::InvalidAmount));
        assert_eq!(reg.add_to_pool(&creator(), 0, id, 50), Err(PoolError::InvalidAmount));
        assert_eq!(
            reg.add_to_pool(&creator(), 0, id, 10_001),
            Err(PoolError::PoolFull)
        );
        let _ = reg.set_pool_status(&creator(), id, false);
        assert_eq!(reg.add_to_pool(&creator(), 0, id, 500), Err(PoolError::InvalidStatus));
        assert_eq!(reg.reserve(), 0);
    }

    #[test]
    fn deposits_never_exceed_capacity() {
        let mut reg = with_alpha();
        let id = PoolId::new(0);
        for i in 0..30 {
            let who = Principal::new(format!("ST{i}"));
            let _ = reg.add_to_pool(&who, 0, id, 700);
            let Some(pool) = reg.get_pool(id) else {
                panic!("pool missing");
            };
            assert!(pool.total_deposited <= pool.max_deposit);
            assert_eq!(pool.total_shares, pool.total_deposited);
        }
        assert_eq!(reg.get_pool(id).map(|p| p.total_deposited), Some(9_800));
        // the last 200 units still fit exactly
        assert_eq!(reg.add_to_pool(&Principal::new("late"), 0, id, 200), Ok(()));
        assert_eq!(reg.get_pool(id).map(|p| p.remaining_capacity()), Some(0));
    }

    // ── Withdraw ────────────────────────────────────────────────────────

    #[test]
    fn withdraw_after_lock_pays_minus_penalty() {
        let mut reg = with_alpha();
        let _ = reg.add_to_pool(&creator(), 0, PoolId::new(0), 500);
        let Ok(w) = reg.remove_from_pool(&creator(), 10, PoolId::new(0)) else {
            panic!("withdraw failed");
        };
        assert_eq!(
            w,
            Withdrawal {
                shares: 500,
                penalty: 10,
                payout: 490,
            }
        );
        let Some(pool) = reg.get_pool(PoolId::new(0)) else {
            panic!("pool missing");
        };
        assert_eq!(pool.total_deposited, 0);
        assert_eq!(pool.total_shares, 0);
        assert!(reg.user_share(PoolId::new(0), &creator()).is_none());
        assert_eq!(reg.reserve(), 10);
    }

    #[test]
    fn withdraw_during_lock_is_rejected() {
        let mut reg = with_alpha();
        let _ = reg.add_to_pool(&creator(), 0, PoolId::new(0), 500);
        assert_eq!(
            reg.remove_from_pool(&creator(), 5, PoolId::new(0)),
            Err(PoolError::FundsLocked)
        );
        assert!(reg.user_share(PoolId::new(0), &creator()).is_some());
    }

    #[test]
    fn lock_boundary_is_inclusive() {
        let mut reg = with_alpha();
        let _ = reg.add_to_pool(&creator(), 3, PoolId::new(0), 500);
        assert_eq!(
            reg.remove_from_pool(&creator(), 9, PoolId::new(0)),
            Err(PoolError::FundsLocked)
        );
        assert!(reg.remove_from_pool(&creator(), 10, PoolId::new(0)).is_ok());
    }

    #[test]
    fn penalty_rounds_down() {
        let mut reg = with_alpha();
        let _ = reg.add_to_pool(&creator(), 0, PoolId::new(0), 149);
        let Ok(w) = reg.remove_from_pool(&creator(), 7, PoolId::new(0)) else {
            panic!("withdraw failed");
        };
        // 149 * 2 / 100 = 2.98
        assert_eq!(w.penalty, 2);
        assert_eq!(w.payout, 147);
    }

    #[test]
    fn rejoin_after_full_exit() {
        let mut reg = with_alpha();
        let id = PoolId::new(0);
        let _ = reg.add_to_pool(&creator(), 0, id, 500);
        let _ = reg.remove_from_pool(&creator(), 10, id);
        assert_eq!(reg.add_to_pool(&creator(), 11, id, 300), Ok(()));
        assert_eq!(reg.user_share(id, &creator()).map(|s| s.deposit_time), Some(11));
    }

    #[test]
    fn withdraw_failures() {
        let mut reg = with_alpha();
        let id = PoolId::new(0);
        assert_eq!(
            reg.remove_from_pool(&creator(), 10, PoolId::new(3)),
            Err(PoolError::PoolNotFound)
        );
        assert_eq!(reg.remove_from_pool(&creator(), 10, id), Err(PoolError::NotInPool));
        let _ = reg.add_to_pool(&creator(), 0, id, 500);
        let _ = reg.set_pool_status(&creator(), id, false);
        assert_eq!(
            reg.remove_from_pool(&creator(), 10, id),
            Err(PoolError::InvalidStatus)
        );
    }

    // ── Deploy ──────────────────────────────────────────────────────────

    #[test]
    fn deploy_requires_threshold_and_creator() {
        let mut reg = with_alpha();
        let id = PoolId::new(0);
        assert_eq!(reg.deploy_to_defi(&creator(), id), Err(PoolError::ThresholdNotMet));
        let _ = reg.add_to_pool(&Principal::new("ST9USER"), 0, id, 100);
        assert_eq!(reg.deploy_to_defi(&creator(), id), Ok(()));
        assert_eq!(
            reg.deploy_to_defi(&Principal::new("ST9USER"), id),
            Err(PoolError::NotAuthorized)
        );
        assert_eq!(
            reg.deploy_to_defi(&creator(), PoolId::new(8)),
            Err(PoolError::PoolNotFound)
        );
    }

    // ── Yield ───────────────────────────────────────────────────────────

    #[test]
    fn claim_after_one_day() {
        let mut reg = with_alpha();
        let _ = reg.add_to_pool(&creator(), 0, PoolId::new(0), 500);
        assert_eq!(reg.claim_yield(&creator(), 144, PoolId::new(0)), Ok(25));
        assert_eq!(
            reg.user_share(PoolId::new(0), &creator()).map(|s| s.last_claim),
            Some(144)
        );
        // nothing accrues without elapsed time
        assert_eq!(reg.claim_yield(&creator(), 144, PoolId::new(0)), Ok(0));
        assert_eq!(reg.reserve(), 475);
    }

    #[test]
    fn yield_window_starts_at_last_claim() {
        let mut reg = with_alpha();
        let _ = reg.add_to_pool(&creator(), 0, PoolId::new(0), 1_000);
        assert_eq!(reg.claim_yield(&creator(), 72, PoolId::new(0)), Ok(25));
        assert_eq!(reg.claim_yield(&creator(), 216, PoolId::new(0)), Ok(50));
    }

    #[test]
    fn stale_claim_keeps_last_claim() {
        let mut reg = with_alpha();
        let id = PoolId::new(0);
        let _ = reg.add_to_pool(&creator(), 1_000, id, 500);
        assert_eq!(reg.claim_yield(&creator(), 0, id), Ok(0));
        assert_eq!(reg.user_share(id, &creator()).map(|s| s.last_claim), Some(1_000));
        assert_eq!(reg.claim_yield(&creator(), 1_144, id), Ok(25));
    }

    #[test]
    fn claim_failures() {
        let mut reg = with_alpha();
        let id = PoolId::new(0);
        assert_eq!(
            reg.claim_yield(&creator(), 1, PoolId::new(4)),
            Err(PoolError::PoolNotFound)
        );
        assert_eq!(reg.claim_yield(&creator(), 1, id), Err(PoolError::NotInPool));
        let _ = reg.add_to_pool(&creator(), 0, id, 500);
        let _ = reg.set_pool_status(&creator(), id, false);
        assert_eq!(reg.claim_yield(&creator(), 1, id), Err(PoolError::InvalidStatus));
    }

    #[test]
    fn yield_overflow_is_reported() {
        assert_eq!(
            accrued_yield(u128::MAX, 100, 2),
            Err(PoolError::ArithmeticOverflow)
        );
    }

    // ── Status ──────────────────────────────────────────────────────────

    #[test]
    fn only_creator_toggles_status() {
        let mut reg = with_alpha();
        assert_eq!(
            reg.set_pool_status(&Principal::new("ST3FAKE"), PoolId::new(0), false),
            Err(PoolError::NotAuthorized)
        );
        assert_eq!(reg.set_pool_status(&creator(), PoolId::new(0), false), Ok(()));
        assert_eq!(reg.get_pool(PoolId::new(0)).map(|p| p.status), Some(false));
    }

    // ── Reads & snapshots ───────────────────────────────────────────────

    #[test]
    fn reads_are_idempotent() {
        let reg = with_alpha();
        let first = reg.get_pool(PoolId::new(0)).cloned();
        let second = reg.get_pool(PoolId::new(0)).cloned();
        assert_eq!(first, second);
        assert_eq!(reg.pool_exists("AlphaPool"), reg.pool_exists("AlphaPool"));
        assert!(!reg.pool_exists("GammaPool"));
        assert_eq!(reg.snapshot(), reg.snapshot());
    }

    #[test]
    fn snapshot_restores_equal_state() {
        let mut reg = with_alpha();
        let _ = reg.add_to_pool(&creator(), 0, PoolId::new(0), 500);
        let _ = reg.update_pool(&creator(), 2, PoolId::new(0), "Renamed", 100, 10_000);
        let snapshot = reg.snapshot();

        let json = serde_json::to_string(&snapshot).unwrap_or_default();
        let Ok(decoded) = serde_json::from_str::<RegistrySnapshot>(&json) else {
            panic!("snapshot did not decode");
        };
        let Ok(restored) = PoolRegistry::restore(
            decoded,
            Box::new(AuthoritySet::new([creator()])),
            Box::new(InMemoryLedger::new()),
        ) else {
            panic!("restore failed");
        };
        assert_eq!(restored.snapshot(), snapshot);
        assert_eq!(restored.pool_id_by_name("Renamed"), Some(PoolId::new(0)));
        assert!(restored.user_share(PoolId::new(0), &creator()).is_some());
    }

    #[test]
    fn snapshot_keeps_highest_block_height() {
        let mut reg = with_alpha();
        assert_eq!(reg.block_height(), 0);
        let _ = reg.add_to_pool(&creator(), 1_000, PoolId::new(0), 500);
        let _ = reg.claim_yield(&creator(), 400, PoolId::new(0));
        assert_eq!(reg.block_height(), 1_000);
        assert_eq!(reg.snapshot().block_height, 1_000);

        // images written before the height was recorded fall back to the tables
        let mut legacy = reg.snapshot();
        legacy.block_height = 0;
        let Ok(restored) = PoolRegistry::restore(
            legacy,
            Box::new(AuthoritySet::default()),
            Box::new(InMemoryLedger::new()),
        ) else {
            panic!("restore failed");
        };
        assert_eq!(restored.block_height(), 1_000);
    }

    #[test]
    fn restore_rejects_broken_name_index() {
        let reg = with_alpha();
        let mut snapshot = reg.snapshot();
        snapshot.pools_by_name.insert("Ghost".to_string(), PoolId::new(0));
        let result = PoolRegistry::restore(
            snapshot,
            Box::new(AuthoritySet::default()),
            Box::new(InMemoryLedger::new()),
        );
        assert!(matches!(result, Err(SnapshotError::NameMismatch(_, _))));
    }

    #[test]
    fn restore_rejects_ids_above_counter() {
        let reg = with_alpha();
        let mut snapshot = reg.snapshot();
        snapshot.next_pool_id = 0;
        let result = PoolRegistry::restore(
            snapshot,
            Box::new(AuthoritySet::default()),
            Box::new(InMemoryLedger::new()),
        );
        assert!(matches!(result, Err(SnapshotError::IdAboveCounter(_))));
    }
}
