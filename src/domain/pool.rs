//! Pool records, creation arguments, audit records and share positions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::Principal;
use crate::error::PoolError;

/// Longest accepted pool name, in characters.
pub const MAX_NAME_LEN: usize = 100;
/// Upper bound for `yield_rate` (percent).
pub const MAX_YIELD_RATE: u32 = 100;
/// Upper bound for `penalty` (percent).
pub const MAX_PENALTY: u32 = 50;
/// Upper bound for `threshold` (percent-declared).
pub const MAX_THRESHOLD: u32 = 100;
/// Upper bound for `interest_rate`.
pub const MAX_INTEREST_RATE: u32 = 20;
/// Upper bound for `lock_period`, in blocks.
pub const MAX_LOCK_PERIOD: u64 = 365;

/// Kind of investment strategy a pool advertises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PoolType {
    /// Lending pool.
    Lending,
    /// Staking pool.
    Staking,
    /// Yield-farming pool.
    YieldFarming,
}

impl PoolType {
    /// All supported pool types.
    pub const ALL: [Self; 3] = [Self::Lending, Self::Staking, Self::YieldFarming];

    /// Wire name of the pool type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Lending => "lending",
            Self::Staking => "staking",
            Self::YieldFarming => "yield-farming",
        }
    }
}

impl FromStr for PoolType {
    type Err = PoolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or(PoolError::InvalidPoolType)
    }
}

impl fmt::Display for PoolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Currency tag of a pool. Only a tag; no multi-asset bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Stacks token.
    Stx,
    /// Bitcoin.
    Btc,
}

impl Currency {
    /// All supported currencies.
    pub const ALL: [Self; 2] = [Self::Stx, Self::Btc];

    /// Wire name of the currency.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Stx => "STX",
            Self::Btc => "BTC",
        }
    }
}

impl FromStr for Currency {
    type Err = PoolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or(PoolError::InvalidCurrency)
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// External DeFi protocol a pool's funds are deployed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefiProtocol {
    /// ALEX.
    Alex,
    /// Arkadiko.
    Arkadiko,
    /// Velar.
    Velar,
}

impl DefiProtocol {
    /// All supported protocols.
    pub const ALL: [Self; 3] = [Self::Alex, Self::Arkadiko, Self::Velar];

    /// Wire name of the protocol.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Alex => "alex",
            Self::Arkadiko => "arkadiko",
            Self::Velar => "velar",
        }
    }
}

impl FromStr for DefiProtocol {
    type Err = PoolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or(PoolError::InvalidDefiProtocol)
    }
}

impl fmt::Display for DefiProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Checks a pool name: non-empty and at most [`MAX_NAME_LEN`] characters.
///
/// # Errors
///
/// Returns [`PoolError::InvalidName`] otherwise.
pub fn validate_name(name: &str) -> Result<(), PoolError> {
    if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
        return Err(PoolError::InvalidName);
    }
    Ok(())
}

/// Arguments of a pool creation request, as received.
///
/// The enumerated fields stay raw strings so that they are rejected at
/// their own position in the validation sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPool {
    /// Unique pool name.
    pub name: String,
    /// Smallest accepted single deposit.
    pub min_deposit: u128,
    /// Pool capacity.
    pub max_deposit: u128,
    /// Yield rate in percent.
    pub yield_rate: u32,
    /// Nominal lifetime, informational.
    pub duration: u64,
    /// Withdrawal penalty in percent.
    pub penalty: u32,
    /// Deployment threshold.
    pub threshold: u32,
    /// Pool type wire name.
    pub pool_type: String,
    /// Interest rate.
    pub interest_rate: u32,
    /// Lock period in blocks.
    pub lock_period: u64,
    /// Currency wire name.
    pub currency: String,
    /// DeFi protocol wire name.
    pub defi_protocol: String,
}

/// Creation arguments that passed field validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolTerms {
    name: String,
    min_deposit: u128,
    max_deposit: u128,
    yield_rate: u32,
    duration: u64,
    penalty: u32,
    threshold: u32,
    pool_type: PoolType,
    interest_rate: u32,
    lock_period: u64,
    currency: Currency,
    defi_protocol: DefiProtocol,
}

impl PoolTerms {
    /// Validated pool name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl NewPool {
    /// Validates every field in a fixed order; the first failure wins.
    ///
    /// # Errors
    ///
    /// Returns the [`PoolError`] of the first invalid field.
    pub fn validate(&self) -> Result<PoolTerms, PoolError> {
        validate_name(&self.name)?;
        if self.min_deposit == 0 {
            return Err(PoolError::InvalidMinDeposit);
        }
        if self.max_deposit == 0 {
            return Err(PoolError::InvalidMaxDeposit);
        }
        if self.yield_rate > MAX_YIELD_RATE {
            return Err(PoolError::InvalidYieldRate);
        }
        if self.duration == 0 {
            return Err(PoolError::InvalidDuration);
        }
        if self.penalty > MAX_PENALTY {
            return Err(PoolError::InvalidPenalty);
        }
        if self.threshold == 0 || self.threshold > MAX_THRESHOLD {
            return Err(PoolError::InvalidThreshold);
        }
        let pool_type: PoolType = self.pool_type.parse()?;
        if self.interest_rate > MAX_INTEREST_RATE {
            return Err(PoolError::InvalidInterestRate);
        }
        if self.lock_period > MAX_LOCK_PERIOD {
            return Err(PoolError::InvalidLockPeriod);
        }
        let currency: Currency = self.currency.parse()?;
        let defi_protocol: DefiProtocol = self.defi_protocol.parse()?;

        Ok(PoolTerms {
            name: self.name.clone(),
            min_deposit: self.min_deposit,
            max_deposit: self.max_deposit,
            yield_rate: self.yield_rate,
            duration: self.duration,
            penalty: self.penalty,
            threshold: self.threshold,
            pool_type,
            interest_rate: self.interest_rate,
            lock_period: self.lock_period,
            currency,
            defi_protocol,
        })
    }
}

/// A registered investment pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    /// Unique name.
    pub name: String,
    /// Smallest accepted single deposit.
    pub min_deposit: u128,
    /// Capacity: `total_deposited` never exceeds it.
    pub max_deposit: u128,
    /// Yield rate in percent (0–100).
    pub yield_rate: u32,
    /// Nominal lifetime, informational.
    pub duration: u64,
    /// Withdrawal penalty in percent (0–50).
    pub penalty: u32,
    /// Minimum deposited amount before deployment to a strategy.
    pub threshold: u32,
    /// Block height of creation or last rename.
    pub timestamp: u64,
    /// Account that created the pool.
    pub creator: Principal,
    /// Strategy kind.
    pub pool_type: PoolType,
    /// Interest rate (0–20).
    pub interest_rate: u32,
    /// Blocks a deposit stays locked (0–365).
    pub lock_period: u64,
    /// Currency tag.
    pub currency: Currency,
    /// Target DeFi protocol.
    pub defi_protocol: DefiProtocol,
    /// `false` disables deposit, withdraw and claim.
    pub status: bool,
    /// Sum of all live deposits.
    pub total_deposited: u128,
    /// Sum of all live shares. Equal to `total_deposited`.
    pub total_shares: u128,
}

impl Pool {
    /// Builds an active, empty pool from validated terms.
    #[must_use]
    pub fn from_terms(terms: PoolTerms, creator: Principal, now: u64) -> Self {
        Self {
            name: terms.name,
            min_deposit: terms.min_deposit,
            max_deposit: terms.max_deposit,
            yield_rate: terms.yield_rate,
            duration: terms.duration,
            penalty: terms.penalty,
            threshold: terms.threshold,
            timestamp: now,
            creator,
            pool_type: terms.pool_type,
            interest_rate: terms.interest_rate,
            lock_period: terms.lock_period,
            currency: terms.currency,
            defi_protocol: terms.defi_protocol,
            status: true,
            total_deposited: 0,
            total_shares: 0,
        }
    }

    /// Room left before the pool reaches capacity.
    #[must_use]
    pub fn remaining_capacity(&self) -> u128 {
        self.max_deposit.saturating_sub(self.total_deposited)
    }
}

/// Audit record of the last rename/resize of a pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolUpdate {
    /// Name after the update.
    pub update_name: String,
    /// Minimum deposit after the update.
    pub update_min_deposit: u128,
    /// Capacity after the update.
    pub update_max_deposit: u128,
    /// Block height of the update.
    pub update_timestamp: u64,
    /// Account that performed it.
    pub updater: Principal,
}

/// A participant's position in one pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserShare {
    /// Deposited amount, 1:1 with currency units.
    pub shares: u128,
    /// Block height of the deposit; starts the lock period.
    pub deposit_time: u64,
    /// Block height of the last claim (or the deposit).
    pub last_claim: u64,
}
