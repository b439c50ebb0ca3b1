//! WebSocket message types: envelope, commands, and events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{PoolEvent, PoolId};

/// Top-level WebSocket message envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsMessage {
    /// Client-provided ID for requests; server-generated for events.
    pub id: String,
    /// Message type discriminator.
    #[serde(rename = "type")]
    pub msg_type: WsMessageType,
    /// ISO-8601 timestamp.
    pub timestamp: DateTime<Utc>,
    /// Variant-specific payload.
    pub payload: serde_json::Value,
}

impl WsMessage {
    /// Response to the command with id `id`.
    #[must_use]
    pub fn response(id: String, payload: serde_json::Value) -> Self {
        Self {
            id,
            msg_type: WsMessageType::Response,
            timestamp: Utc::now(),
            payload,
        }
    }

    /// Error reply with a numeric `code`.
    #[must_use]
    pub fn error(id: String, code: u32, message: &str) -> Self {
        Self {
            id,
            msg_type: WsMessageType::Error,
            timestamp: Utc::now(),
            payload: serde_json::json!({ "code": code, "message": message }),
        }
    }

    /// Server-pushed event.
    #[must_use]
    pub fn event(event: &PoolEvent) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            msg_type: WsMessageType::Event,
            timestamp: Utc::now(),
            payload: serde_json::to_value(event).unwrap_or_default(),
        }
    }

    /// Serializes the envelope; empty on failure.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Discriminator for WebSocket message types.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WsMessageType {
    /// Client → Server command.
    Command,
    /// Server → Client response to a command.
    Response,
    /// Server → Client broadcast event.
    Event,
    /// Server → Client error.
    Error,
}

/// A pool selector in a subscription command: a numeric id (as a JSON
/// number or string) or `"*"`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PoolSelector {
    /// Numeric pool id.
    Id(u64),
    /// `"*"` or a string-encoded id.
    Text(String),
}

/// Subscription target after parsing selectors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectorSet {
    /// Explicit pool ids.
    pub ids: Vec<PoolId>,
    /// Whether `"*"` was present.
    pub wildcard: bool,
}

impl SelectorSet {
    /// Parses a list of selectors.
    ///
    /// # Errors
    ///
    /// Returns the offending text if a string selector is neither `"*"` nor
    /// a decimal id.
    pub fn parse(selectors: &[PoolSelector]) -> Result<Self, String> {
        let mut set = Self::default();
        for selector in selectors {
            match selector {
                PoolSelector::Id(id) => set.ids.push(PoolId::new(*id)),
                PoolSelector::Text(text) if text == "*" => set.wildcard = true,
                PoolSelector::Text(text) => {
                    let id = text.parse::<PoolId>().map_err(|_| text.clone())?;
                    set.ids.push(id);
                }
            }
        }
        Ok(set)
    }
}

/// Commands that a client can send over WebSocket, carried in the payload
/// of a `command` envelope.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum WsCommand {
    /// Subscribe to events for specific pools.
    Subscribe {
        /// Pool IDs to subscribe to. Use `["*"]` for all events, including
        /// governance events.
        pool_ids: Vec<PoolSelector>,
    },
    /// Unsubscribe from events for specific pools.
    Unsubscribe {
        /// Pool IDs to unsubscribe from. `"*"` drops the wildcard.
        pool_ids: Vec<PoolSelector>,
    },
    /// Get full pool state.
    GetPool {
        /// Target pool ID.
        pool_id: u64,
    },
}
