//! Per-connection subscription manager.
//!
//! Tracks which pool IDs a WebSocket client is subscribed to and
//! provides server-side event filtering.

use std::collections::HashSet;

use super::messages::SelectorSet;
use crate::domain::PoolId;

/// Manages the set of pool subscriptions for a single WebSocket connection.
#[derive(Debug, Default)]
pub struct SubscriptionManager {
    /// Subscribed pool IDs. If `subscribe_all` is true, this set is ignored.
    pool_ids: HashSet<PoolId>,
    /// Whether the client subscribes to everything (wildcard `"*"`).
    subscribe_all: bool,
}

impl SubscriptionManager {
    /// Creates a new empty subscription manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the selected pools; `"*"` enables the wildcard.
    pub fn subscribe(&mut self, selection: &SelectorSet) {
        if selection.wildcard {
            self.subscribe_all = true;
        }
        self.pool_ids.extend(selection.ids.iter().copied());
    }

    /// Removes the selected pools; `"*"` disables the wildcard.
    pub fn unsubscribe(&mut self, selection: &SelectorSet) {
        if selection.wildcard {
            self.subscribe_all = false;
        }
        for id in &selection.ids {
            self.pool_ids.remove(id);
        }
    }

    /// Returns `true` if an event about `pool_id` passes the filter.
    /// Registry-wide events (`None`) only reach wildcard subscribers.
    #[must_use]
    pub fn matches(&self, pool_id: Option<PoolId>) -> bool {
        self.subscribe_all || pool_id.is_some_and(|id| self.pool_ids.contains(&id))
    }

    /// Returns the number of explicitly subscribed pool IDs.
    #[must_use]
    pub fn count(&self) -> usize {
        self.pool_ids.len()
    }

    /// Returns `true` if the wildcard subscription is active.
    #[must_use]
    pub fn is_subscribed_all(&self) -> bool {
        self.subscribe_all
    }
}
