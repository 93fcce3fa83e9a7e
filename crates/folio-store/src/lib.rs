//! Counter store implementations.
//!
//! - [`RedisCounterStore`]: the production store, every call bounded by a
//!   timeout and the token bucket step run as a server-side script.
//! - [`InMemoryCounterStore`]: a single-process store with the same atomic
//!   semantics, for local development and tests.
//! - [`OfflineCounterStore`]: stands in when no store is configured or the
//!   connection could not be established; every call reports unavailability.
//! - [`SwappableCounterStore`]: forwards to whichever of the above is current,
//!   so a background task can swap Redis in once it becomes reachable.

pub mod memory;
pub mod offline;
pub mod redis;
pub mod swappable;

pub use memory::InMemoryCounterStore;
pub use offline::OfflineCounterStore;
pub use redis::{RedisCounterStore, DEFAULT_TIMEOUT};
pub use swappable::SwappableCounterStore;
