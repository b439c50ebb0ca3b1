//! Externally driven block-height clock.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::domain::PoolRegistry;
use crate::error::GatewayError;

/// Monotonically non-decreasing block height shared by all handlers.
///
/// The registry never reads a clock itself; the service samples this one
/// while holding the registry lock and passes the value in.
#[derive(Debug, Clone, Default)]
pub struct ChainClock {
    height: Arc<AtomicU64>,
}

impl ChainClock {
    /// Creates a clock starting at `height`.
    #[must_use]
    pub fn new(height: u64) -> Self {
        Self {
            height: Arc::new(AtomicU64::new(height)),
        }
    }

    /// Creates a clock for `registry`, starting at `initial_height` or at
    /// the highest height the registry has already seen, whichever is later.
    #[must_use]
    pub fn resume(initial_height: u64, registry: &PoolRegistry) -> Self {
        Self::new(initial_height.max(registry.block_height()))
    }

    /// Current block height.
    #[must_use]
    pub fn height(&self) -> u64 {
        self.height.load(Ordering::Acquire)
    }

    /// Moves the clock to `height`. Setting the current height again is a
    /// no-op.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] if `height` is below the
    /// current height.
    pub fn set_height(&self, height: u64) -> Result<u64, GatewayError> {
        self.height
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                (height >= current).then_some(height)
            })
            .map(|_| height)
            .map_err(|current| {
                GatewayError::InvalidRequest(format!(
                    "block height cannot go backwards ({height} < {current})"
                ))
            })
    }

    /// Advances the clock by `blocks` and returns the new height.
    pub fn advance(&self, blocks: u64) -> u64 {
        let previous = self
            .height
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                Some(current.saturating_add(blocks))
            })
            .unwrap_or_else(|current| current);
        previous.saturating_add(blocks)
    }
}
