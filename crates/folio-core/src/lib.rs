//! Core types and traits for the Folio content subsystem.
//!
//! This crate provides the shared vocabulary used by the catalog, the
//! usage counters, the rate limiter and the HTTP gateway: validated
//! content identifiers and records, the [`CounterStore`] contract for the
//! remote counter store, the token bucket arithmetic and the [`Clock`]
//! abstraction.

pub mod bucket;
pub mod clock;
pub mod content;
pub mod error;
pub mod store;

pub use bucket::{BucketOutcome, BucketSpec, TokenBucket};
pub use clock::{Clock, ManualClock, SystemClock};
pub use content::{validate_records, ContentId, ContentRecord, RawContentRecord};
pub use error::{CoreError, RecordError, RecordErrors, StoreError};
pub use store::{keys, CounterStore};
