//! Domain layer: pool records, the registry state machine, collaborators
//! and the event system.
//!
//! Everything in here is synchronous and clock-free. Time and caller
//! identity are always passed in by the service layer.

pub mod event_bus;
pub mod ledger;
pub mod pool;
pub mod pool_event;
pub mod pool_id;
pub mod pool_registry;
pub mod principal;

pub use event_bus::EventBus;
pub use ledger::{AuthorityOracle, AuthoritySet, InMemoryLedger, Ledger, Transfer};
pub use pool::{Currency, DefiProtocol, NewPool, Pool, PoolType, PoolUpdate, UserShare};
pub use pool_event::PoolEvent;
pub use pool_id::PoolId;
pub use pool_registry::{PoolRegistry, RegistrySettings, RegistrySnapshot, Withdrawal};
pub use principal::{BURN_ADDRESS, Principal};
