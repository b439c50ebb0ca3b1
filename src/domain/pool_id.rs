//! Type-safe pool identifier.
//!
//! [`PoolId`] is a newtype wrapper around a sequential `u64` so that pool
//! identifiers cannot be confused with amounts or block heights.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Unique identifier for a registered pool.
///
/// Allocated from the registry's `next_pool_id` counter at creation time and
/// never reused. Used as the key of the pool table, the audit table, the
/// share table, and as the WebSocket subscription target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoolId(u64);

impl PoolId {
    /// Creates a `PoolId` from its raw sequence number.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw sequence number.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for PoolId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl From<PoolId> for u64 {
    fn from(id: PoolId) -> Self {
        id.0
    }
}

impl FromStr for PoolId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>().map(Self)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn display_is_plain_number() {
        assert_eq!(PoolId::new(42).to_string(), "42");
    }

    #[test]
    fn serializes_transparently() {
        let json = serde_json::to_string(&PoolId::new(7)).unwrap_or_default();
        assert_eq!(json, "7");
    }

    #[test]
    fn parses_from_str() {
        let Ok(id) = "12".parse::<PoolId>() else {
            panic!("expected a valid id");
        };
        assert_eq!(id.get(), 12);
        assert!("abc".parse::<PoolId>().is_err());
    }

    #[test]
    fn get_maps_over_options() {
        assert_eq!(Some(PoolId::new(3)).map(PoolId::get), Some(3));
        assert_eq!(None::<PoolId>.map(PoolId::get), None);
    }

    #[test]
    fn orders_by_sequence() {
        assert!(PoolId::new(1) < PoolId::new(2));
    }
}
