//! WebSocket layer: connection handling, message routing, subscriptions.
//!
//! The WebSocket endpoint at `/ws` streams registry events to clients that
//! subscribe by pool id (or `"*"` for everything, including governance
//! events) and answers `get_pool` queries.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod subscription;
