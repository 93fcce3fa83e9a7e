//! Per-client, per-route token bucket rate limiting.
//!
//! Buckets live in the shared counter store and are refilled and consumed
//! by a single atomic store operation, so every process sees the same
//! budget. When the store cannot be reached the limiter keeps deciding on a
//! bounded in-process table instead of rejecting traffic.

pub mod decision;
pub mod limiter;
pub mod limits;
pub mod local;

pub use decision::RateLimitDecision;
pub use limiter::RateLimiter;
pub use limits::RouteLimits;
pub use local::{LocalBuckets, DEFAULT_LOCAL_CAPACITY};
