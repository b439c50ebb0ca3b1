//! # yield-pool-gateway
//!
//! REST API and WebSocket gateway over a pooled-deposit registry.
//!
//! Authorized creators open pools after paying a creation fee to the
//! governance address. Participants deposit once per pool, receive shares
//! 1:1, wait out the pool's lock period, and leave with a penalty haircut.
//! Yield accrues linearly in block height and is claimed separately.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── WS Handler (ws/)
//!     │
//!     ├── PoolService + ChainClock (service/)
//!     ├── EventBus (domain/)
//!     │
//!     ├── PoolRegistry (domain/)
//!     ├── AuthorityOracle / Ledger collaborators
//!     │
//!     └── PostgreSQL Persistence (event log, snapshots)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
pub mod ws;
