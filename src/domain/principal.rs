//! Caller identities.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Reserved null/burn identity. It can never become the governance address.
pub const BURN_ADDRESS: &str = "SP000000000000000000002Q6VF78";

/// An already-authenticated account identity.
///
/// The gateway does not verify signatures: whoever sits in front of it is
/// trusted to hand over the identity of the caller.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Principal(String);

impl Principal {
    /// Wraps a raw identity string.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the identity as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` for the reserved burn identity.
    #[must_use]
    pub fn is_burn(&self) -> bool {
        self.0 == BURN_ADDRESS
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Principal {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burn_identity_is_detected() {
        assert!(Principal::new(BURN_ADDRESS).is_burn());
        assert!(!Principal::new("ST2TEST").is_burn());
    }
}
