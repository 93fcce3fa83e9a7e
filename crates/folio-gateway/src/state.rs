use folio_catalog::{Catalog, ResolveError, DEFAULT_RELATED_LIMIT};
use folio_core::{ContentRecord, CounterStore};
use folio_counters::UsageCounters;
use folio_ratelimit::RateLimiter;
use std::sync::Arc;
use typed_builder::TypedBuilder;

/// Upper bound on `?limit=` for related content.
pub const MAX_RELATED_LIMIT: usize = 20;

/// What to show when a record has no related content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RelatedFallback {
    /// Show nothing.
    #[default]
    None,
    /// Show the most recently published records instead.
    Recent,
}

/// Everything a handler needs, built once in `main`.
#[derive(Clone, TypedBuilder)]
pub struct AppState {
    catalog: Arc<Catalog>,
    counters: UsageCounters,
    limiter: RateLimiter,
    store: Arc<dyn CounterStore>,
    #[builder(default = DEFAULT_RELATED_LIMIT)]
    related_limit: usize,
    #[builder(default)]
    related_fallback: RelatedFallback,
}

impl AppState {
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn counters(&self) -> &UsageCounters {
        &self.counters
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn store(&self) -> &dyn CounterStore {
        self.store.as_ref()
    }

    /// Clamps a requested limit, `None` meaning the configured default.
    pub fn related_limit(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.related_limit)
            .min(MAX_RELATED_LIMIT)
    }

    /// Related records for `requested`, applying the configured fallback
    /// when the ranker finds nothing.
    pub fn related(&self, requested: &str, limit: usize) -> Result<Vec<&ContentRecord>, ResolveError> {
        let related = self.catalog.related(requested, limit)?;
        if !related.is_empty() || self.related_fallback == RelatedFallback::None {
            return Ok(related);
        }

        let canonical = self.catalog.resolve(requested)?.canonical;
        Ok(self.catalog.recent(limit, Some(&canonical)))
    }
}
