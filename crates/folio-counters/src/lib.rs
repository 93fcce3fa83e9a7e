//! View and share counters backed by a [`folio_core::CounterStore`].
//!
//! Counts are best effort: every read and write answers `None` when the
//! store is unavailable, and callers render without the number instead of
//! failing the request.

pub mod counters;
pub mod metric;

pub use counters::{UsageCounters, DEFAULT_RETENTION, DEFAULT_WINDOW};
pub use metric::Metric;
